//! One interactive debugging pass over a single app.
//!
//! Navigates, screenshots the page on arrival and after a capture window,
//! records the performance snapshot, then analyzes what was captured and
//! writes the analysis next to the session document.

use futures::FutureExt;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::analyzer::{AnalysisOptions, AnalysisResult, Analyzer};
use crate::browser::{BrowserLauncher, WaitPolicy};
use crate::config::{DebuggerConfig, DEBUG_CAPTURE_WINDOW_SECS};
use crate::error::DebuggerResult;
use crate::screenshot::{ScreenshotManager, ScreenshotMetadata};
use crate::session::{DebugSession, SessionSummary};
use crate::storage::SessionStore;

#[derive(Debug, Clone, PartialEq)]
pub struct DebugRunOptions {
    pub screenshots: bool,
    pub analyze: bool,
    /// How long the page is left capturing between the two screenshots.
    pub capture_window: Duration,
    pub headless: Option<bool>,
    pub slow_mo_ms: Option<u64>,
}

impl DebugRunOptions {
    pub fn from_config(config: &DebuggerConfig) -> Self {
        Self {
            screenshots: true,
            analyze: config.auto_analyze,
            capture_window: Duration::from_secs(DEBUG_CAPTURE_WINDOW_SECS),
            headless: None,
            slow_mo_ms: None,
        }
    }
}

/// Everything a debug run produced.
#[derive(Debug, Clone, Serialize)]
pub struct DebugReport {
    pub session_id: String,
    pub app_name: String,
    pub url: String,
    pub navigated: bool,
    pub summary: SessionSummary,
    pub screenshots: Vec<ScreenshotMetadata>,
    pub session_file: Option<PathBuf>,
    pub analysis: Option<AnalysisResult>,
    pub analysis_file: Option<PathBuf>,
    /// Set when the session failed to start or its body panicked.
    pub error: Option<String>,
}

pub struct DebugRun {
    config: Arc<DebuggerConfig>,
    options: DebugRunOptions,
}

impl DebugRun {
    pub fn new(config: Arc<DebuggerConfig>) -> Self {
        Self {
            options: DebugRunOptions::from_config(&config),
            config,
        }
    }

    pub fn with_options(mut self, options: DebugRunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &DebugRunOptions {
        &self.options
    }

    /// Debug a registered app; unknown names are rejected before launching.
    pub async fn run_app(
        &self,
        launcher: Arc<dyn BrowserLauncher>,
        app_name: &str,
    ) -> DebuggerResult<DebugReport> {
        let url = self.config.app_url(app_name)?.to_string();
        Ok(self.run(launcher, &url, app_name).await)
    }

    /// Debug `url` under `app_name`. Session failures end up in
    /// [`DebugReport::error`]; whatever was captured is still saved.
    pub async fn run(
        &self,
        launcher: Arc<dyn BrowserLauncher>,
        url: &str,
        app_name: &str,
    ) -> DebugReport {
        info!("Debugging: {} @ {}", app_name, url);

        let mut session = DebugSession::new(launcher, url, app_name, self.config.clone());
        if let Some(headless) = self.options.headless {
            session = session.with_headless(headless);
        }
        if let Some(slow_mo_ms) = self.options.slow_mo_ms {
            session = session.with_slow_mo(slow_mo_ms);
        }

        let session_id = session.session_id().to_string();
        let mut screenshots = ScreenshotManager::new(&session_id, app_name, &self.config);
        let prefix = format!(
            "{}_{}",
            app_name,
            session_id.chars().take(8).collect::<String>()
        );
        let take_screenshots = self.options.screenshots;
        let window = self.options.capture_window;

        let outcome = session
            .run_isolated(|s| {
                async move {
                    let navigated = s.navigate(WaitPolicy::default()).await;
                    if !navigated {
                        warn!("Navigation failed, continuing capture");
                    }
                    if take_screenshots {
                        s.screenshot(Some(&format!("{}_initial", prefix))).await;
                    }

                    info!("Capturing data for {}s", window.as_secs());
                    sleep(window).await;
                    s.capture_performance_metrics().await;

                    if take_screenshots {
                        s.screenshot(Some(&format!("{}_final", prefix))).await;
                    }
                    Ok(navigated)
                }
                .boxed()
            })
            .await;

        for path in &outcome.data.screenshots {
            if screenshots.record(path).is_some() {
                screenshots.open(path, true).await;
            }
        }

        let summary = SessionSummary::from_data(&outcome.data);
        summary.log();
        if take_screenshots {
            screenshots.log_summary();
        }

        let (navigated, error) = match outcome.result {
            Ok(navigated) => (navigated, None),
            Err(e) => {
                error!("Debug session for {} failed: {}", app_name, e);
                (false, Some(e.to_string()))
            }
        };

        let mut analysis_file = None;
        let analysis = if self.options.analyze {
            info!("Analyzing session {}", session_id);
            let result = Analyzer::new(outcome.data)
                .with_options(AnalysisOptions::from_config(&self.config))
                .analyze(self.config.analysis_depth);
            info!(
                "{} issues found (severity: {})",
                result.issues_found, result.severity
            );
            match SessionStore::new(&self.config).save_analysis(&result, None) {
                Ok(path) => analysis_file = Some(path),
                Err(e) => error!("Failed to save analysis for {}: {}", session_id, e),
            }
            Some(result)
        } else {
            None
        };

        DebugReport {
            session_id,
            app_name: app_name.to_string(),
            url: url.to_string(),
            navigated,
            summary,
            screenshots: screenshots.all().to_vec(),
            session_file: outcome.session_file,
            analysis,
            analysis_file,
            error,
        }
    }
}
