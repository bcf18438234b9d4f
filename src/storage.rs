use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

use crate::analyzer::AnalysisResult;
use crate::config::DebuggerConfig;
use crate::error::{DebuggerError, DebuggerResult};
use crate::model::DebugSessionData;

const SESSION_FILE_PREFIX: &str = "session_";
const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// A session document found on disk.
#[derive(Debug, Clone, Serialize)]
pub struct StoredSession {
    pub session_id: String,
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
    pub size_bytes: u64,
    pub app_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupStats {
    pub sessions_removed: usize,
    pub screenshots_removed: usize,
}

/// File-backed store for session documents, analysis reports and screenshots.
#[derive(Debug, Clone)]
pub struct SessionStore {
    data_dir: PathBuf,
    reports_dir: PathBuf,
    screenshots_dir: PathBuf,
}

impl SessionStore {
    pub fn new(config: &DebuggerConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            reports_dir: config.reports_dir.clone(),
            screenshots_dir: config.screenshots_dir.clone(),
        }
    }

    pub fn session_path(&self, session_id: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}{}.json", SESSION_FILE_PREFIX, session_id))
    }

    pub fn save(&self, data: &DebugSessionData) -> DebuggerResult<PathBuf> {
        std::fs::create_dir_all(&self.data_dir)?;
        let path = self.session_path(&data.session_id);
        std::fs::write(&path, data.to_json()?)?;
        info!("Session data saved: {:?}", path);
        Ok(path)
    }

    pub fn load(&self, session_id: &str) -> DebuggerResult<DebugSessionData> {
        let path = self.session_path(session_id);
        if !path.exists() {
            return Err(DebuggerError::SessionNotFound(session_id.to_string()));
        }
        Self::load_file(&path)
    }

    pub fn load_file(path: &Path) -> DebuggerResult<DebugSessionData> {
        let content = std::fs::read_to_string(path)?;
        Ok(DebugSessionData::from_json(&content)?)
    }

    /// Stored sessions, most recently modified first.
    pub fn list(&self) -> DebuggerResult<Vec<StoredSession>> {
        let mut sessions = Vec::new();
        for path in glob_files(&self.data_dir, &format!("{}*.json", SESSION_FILE_PREFIX))? {
            let meta = match std::fs::metadata(&path) {
                Ok(m) => m,
                Err(e) => {
                    warn!("Skipping {:?}: {}", path, e);
                    continue;
                }
            };
            let session_id = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_prefix(SESSION_FILE_PREFIX))
                .unwrap_or_default()
                .to_string();
            let app_name = Self::load_file(&path).ok().map(|d| d.app_name);
            let modified = meta.modified().map(DateTime::<Utc>::from).unwrap_or_else(|_| Utc::now());

            sessions.push(StoredSession {
                session_id,
                path,
                modified,
                size_bytes: meta.len(),
                app_name,
            });
        }
        sessions.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(sessions)
    }

    pub fn latest(&self) -> DebuggerResult<PathBuf> {
        self.list()?
            .into_iter()
            .next()
            .map(|s| s.path)
            .ok_or_else(|| DebuggerError::SessionNotFound("latest".to_string()))
    }

    pub fn analysis_path(&self, session_id: &str, extension: &str) -> PathBuf {
        self.reports_dir
            .join(format!("analysis_{}.{}", session_id, extension))
    }

    /// Write `analysis_<id>.json` unless an explicit output path is given.
    pub fn save_analysis(
        &self,
        result: &AnalysisResult,
        output: Option<&Path>,
    ) -> DebuggerResult<PathBuf> {
        let path = match output {
            Some(p) => p.to_path_buf(),
            None => self.analysis_path(&result.session_id, "json"),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(result)?)?;
        info!("Analysis saved: {:?}", path);
        Ok(path)
    }

    pub fn save_report(
        &self,
        session_id: &str,
        extension: &str,
        contents: &str,
    ) -> DebuggerResult<PathBuf> {
        std::fs::create_dir_all(&self.reports_dir)?;
        let path = self.analysis_path(session_id, extension);
        std::fs::write(&path, contents)?;
        info!("Report saved: {:?}", path);
        Ok(path)
    }

    /// Delete session documents and screenshots not modified in `days` days.
    pub fn cleanup(&self, days: u64) -> DebuggerResult<CleanupStats> {
        let cutoff = retention_cutoff(days);

        let sessions = glob_files(&self.data_dir, &format!("{}*.json", SESSION_FILE_PREFIX))?;
        let screenshots = glob_files(&self.screenshots_dir, "*.*")?;

        let stats = CleanupStats {
            sessions_removed: remove_older_than(sessions, cutoff),
            screenshots_removed: remove_older_than(screenshots, cutoff),
        };
        info!(
            "Cleanup removed {} sessions and {} screenshots",
            stats.sessions_removed, stats.screenshots_removed
        );
        Ok(stats)
    }
}

/// Oldest modification time that survives a `days`-day retention window.
///
/// Windows reaching back past the epoch keep everything.
pub(crate) fn retention_cutoff(days: u64) -> SystemTime {
    let window = Duration::from_secs(days.saturating_mul(SECONDS_PER_DAY));
    SystemTime::now()
        .checked_sub(window)
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

pub(crate) fn glob_files(dir: &Path, pattern: &str) -> DebuggerResult<Vec<PathBuf>> {
    let full = format!(
        "{}/{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        pattern
    );
    let paths = glob::glob(&full)
        .map_err(|e| DebuggerError::InvalidConfig(format!("bad glob pattern {}: {}", full, e)))?;
    Ok(paths.filter_map(Result::ok).filter(|p| p.is_file()).collect())
}

pub(crate) fn remove_older_than(paths: Vec<PathBuf>, cutoff: SystemTime) -> usize {
    let mut removed = 0;
    for path in paths {
        let modified = match std::fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(_) => continue,
        };
        if modified < cutoff {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    debug!("Removed {:?}", path);
                    removed += 1;
                }
                Err(e) => warn!("Failed to remove {:?}: {}", path, e),
            }
        }
    }
    removed
}
