//! Browser automation capability consumed by [`crate::session::DebugSession`].
//!
//! Drivers (Playwright bridge, CDP client, test fakes) implement these
//! traits; the session never talks to a browser any other way.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::{ScreenshotFormat, Viewport};
use crate::error::{DebuggerError, DebuggerResult};
use crate::model::Headers;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub headless: bool,
    pub slow_mo_ms: u64,
    pub args: Vec<String>,
}

/// Settings for the isolated context a session's page lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextOptions {
    pub viewport: Viewport,
    pub user_agent: String,
    pub ignore_https_errors: bool,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenshotOptions {
    pub full_page: bool,
    pub format: ScreenshotFormat,
}

/// When `goto` considers navigation finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitPolicy {
    Load,
    DomContentLoaded,
    /// No in-flight requests for a quiet period.
    #[default]
    NetworkIdle,
    Commit,
}

impl WaitPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitPolicy::Load => "load",
            WaitPolicy::DomContentLoaded => "domcontentloaded",
            WaitPolicy::NetworkIdle => "networkidle",
            WaitPolicy::Commit => "commit",
        }
    }
}

impl FromStr for WaitPolicy {
    type Err = DebuggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "load" => Ok(WaitPolicy::Load),
            "domcontentloaded" => Ok(WaitPolicy::DomContentLoaded),
            "networkidle" => Ok(WaitPolicy::NetworkIdle),
            "commit" => Ok(WaitPolicy::Commit),
            other => Err(DebuggerError::InvalidConfig(format!(
                "unknown wait policy: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationResponse {
    pub status: u16,
    pub url: String,
}

impl NavigationResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One observation delivered by the page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    Console {
        kind: String,
        text: String,
        location: Option<String>,
        stack_trace: Option<String>,
    },
    Request {
        request_id: Option<String>,
        method: String,
        url: String,
        headers: Option<Headers>,
        resource_type: Option<String>,
    },
    Response {
        request_id: Option<String>,
        url: String,
        status: u16,
        status_text: Option<String>,
        headers: Option<Headers>,
        timing: Option<BTreeMap<String, f64>>,
    },
    RequestFailed {
        request_id: Option<String>,
        url: String,
        failure: String,
    },
    PageError {
        message: String,
        stack: Option<String>,
        source: Option<String>,
        line: Option<u32>,
        column: Option<u32>,
    },
}

impl PageEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            PageEvent::Console { .. } => "console",
            PageEvent::Request { .. } => "request",
            PageEvent::Response { .. } => "response",
            PageEvent::RequestFailed { .. } => "requestfailed",
            PageEvent::PageError { .. } => "pageerror",
        }
    }
}

/// Where a driver pushes page events. Cheap to clone; never blocks.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<PageEvent>,
}

impl EventSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PageEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue an event. Events emitted after the session closed are dropped.
    pub fn emit(&self, event: PageEvent) {
        let _ = self.tx.send(event);
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, options: &LaunchOptions) -> DebuggerResult<Box<dyn Browser>>;
}

#[async_trait]
pub trait Browser: Send + Sync {
    /// Open a page in a fresh isolated context; its events go to `events`.
    async fn new_page(
        &self,
        options: &ContextOptions,
        events: EventSink,
    ) -> DebuggerResult<Box<dyn Page>>;

    async fn close(&self) -> DebuggerResult<()>;
}

#[async_trait]
pub trait Page: Send + Sync {
    /// `Ok(None)` when the navigation produced no response (e.g. same-document).
    async fn goto(
        &self,
        url: &str,
        wait: WaitPolicy,
        timeout: Duration,
    ) -> DebuggerResult<Option<NavigationResponse>>;

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> DebuggerResult<()>;

    async fn click(&self, selector: &str) -> DebuggerResult<()>;

    async fn fill(&self, selector: &str, value: &str) -> DebuggerResult<()>;

    async fn content(&self) -> DebuggerResult<String>;

    async fn title(&self) -> DebuggerResult<String>;

    async fn screenshot(&self, path: &Path, options: &ScreenshotOptions) -> DebuggerResult<()>;

    /// Evaluate a script in page context and return its JSON result.
    async fn evaluate(&self, script: &str) -> DebuggerResult<serde_json::Value>;

    /// Close the page together with its context.
    async fn close(&self) -> DebuggerResult<()>;
}
