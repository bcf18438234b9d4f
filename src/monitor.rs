//! Persistent multi-app monitor.
//!
//! Every round opens one independent headless session per app, all of them
//! concurrently, and runs a quick analysis over what each one captured.

use futures::future::join_all;
use futures::FutureExt;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::analyzer::{AnalysisDepth, AnalysisOptions, Analyzer, Severity};
use crate::browser::{BrowserLauncher, WaitPolicy};
use crate::config::{DebuggerConfig, MONITOR_CAPTURE_WINDOW_SECS};
use crate::error::DebuggerResult;
use crate::session::DebugSession;

/// Outcome of monitoring one app for one round.
#[derive(Debug, Clone, Serialize)]
pub struct AppCheck {
    pub app_name: String,
    pub url: String,
    pub session_id: String,
    pub issues_found: usize,
    pub severity: Severity,
    pub session_file: Option<PathBuf>,
    /// Set when the session could not be started or its body panicked.
    pub error: Option<String>,
}

impl AppCheck {
    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.issues_found == 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitorRound {
    pub run: u32,
    pub checks: Vec<AppCheck>,
}

pub struct Monitor {
    config: Arc<DebuggerConfig>,
    interval: Duration,
    capture_window: Duration,
}

impl Monitor {
    pub fn new(config: Arc<DebuggerConfig>) -> Self {
        Self {
            interval: Duration::from_secs(config.monitor_interval_secs),
            capture_window: Duration::from_secs(MONITOR_CAPTURE_WINDOW_SECS),
            config,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// How long each session keeps capturing after navigation.
    pub fn with_capture_window(mut self, window: Duration) -> Self {
        self.capture_window = window;
        self
    }

    /// Monitor `apps` until `max_runs` rounds have completed or Ctrl-C.
    ///
    /// Unknown app names are rejected before the first round.
    pub async fn run(
        &self,
        launcher: Arc<dyn BrowserLauncher>,
        apps: &[String],
        max_runs: Option<u32>,
    ) -> DebuggerResult<Vec<MonitorRound>> {
        let targets = apps
            .iter()
            .map(|name| Ok((name.clone(), self.config.app_url(name)?.to_string())))
            .collect::<DebuggerResult<Vec<(String, String)>>>()?;

        info!(
            "Monitoring {} every {}s",
            apps.join(", "),
            self.interval.as_secs()
        );

        let mut rounds = Vec::new();
        let mut run = 0u32;
        loop {
            run += 1;
            rounds.push(self.run_round(launcher.clone(), &targets, run).await);

            if max_runs.is_some_and(|max| run >= max) {
                info!("Reached {} runs, stopping monitor", run);
                break;
            }

            info!("Waiting {}s until the next run", self.interval.as_secs());
            tokio::select! {
                _ = sleep(self.interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Monitor interrupted");
                    break;
                }
            }
        }
        Ok(rounds)
    }

    /// One round: a session per `(app, url)`, joined before returning.
    pub async fn run_round(
        &self,
        launcher: Arc<dyn BrowserLauncher>,
        targets: &[(String, String)],
        run: u32,
    ) -> MonitorRound {
        info!("Run #{}", run);
        let checks = join_all(
            targets
                .iter()
                .map(|(name, url)| self.check_app(launcher.clone(), name, url)),
        )
        .await;
        MonitorRound { run, checks }
    }

    async fn check_app(&self, launcher: Arc<dyn BrowserLauncher>, app_name: &str, url: &str) -> AppCheck {
        info!("Monitoring: {}", app_name);
        let window = self.capture_window;
        let session = DebugSession::new(launcher, url, app_name, self.config.clone())
            .with_headless(true);

        let outcome = session
            .run_isolated(|s| {
                async move {
                    s.navigate(WaitPolicy::default()).await;
                    sleep(window).await;
                    s.capture_performance_metrics().await;
                    Ok(())
                }
                .boxed()
            })
            .await;

        let analysis = Analyzer::new(outcome.data)
            .with_options(AnalysisOptions::from_config(&self.config))
            .analyze(AnalysisDepth::Quick);

        let error = outcome.result.err().map(|e| {
            error!("Error monitoring {}: {}", app_name, e);
            e.to_string()
        });
        if error.is_none() {
            if analysis.issues_found > 0 {
                warn!(
                    "{}: {} issues (severity: {})",
                    app_name, analysis.issues_found, analysis.severity
                );
            } else {
                info!("{}: OK", app_name);
            }
        }

        AppCheck {
            app_name: app_name.to_string(),
            url: url.to_string(),
            session_id: analysis.session_id,
            issues_found: analysis.issues_found,
            severity: analysis.severity,
            session_file: outcome.session_file,
            error,
        }
    }
}
