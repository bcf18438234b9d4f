use crate::session::SessionPhase;

#[derive(Debug, thiserror::Error)]
pub enum DebuggerError {
    #[error("Unknown app: {0}")]
    UnknownApp(String),

    #[error("Invalid analysis depth: {0} (expected quick, standard or deep)")]
    InvalidDepth(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Session is {actual:?}, expected {expected}")]
    SessionState {
        expected: &'static str,
        actual: SessionPhase,
    },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Session body panicked: {0}")]
    Panicked(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl DebuggerError {
    /// True for errors raised before any session or analysis work starts.
    pub fn is_configuration_fault(&self) -> bool {
        matches!(
            self,
            DebuggerError::UnknownApp(_)
                | DebuggerError::InvalidDepth(_)
                | DebuggerError::InvalidConfig(_)
        )
    }
}

pub type DebuggerResult<T> = Result<T, DebuggerError>;
