use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

use crate::analyzer::AnalysisDepth;
use crate::error::{DebuggerError, DebuggerResult};

/// Page Debugger: analyzes captured browser debug sessions.
#[derive(Parser, Debug, Clone)]
#[command(name = "page-debugger", version)]
pub struct CliArgs {
    /// Root directory holding data/, reports/, screenshots/ and logs/
    #[arg(short = 'r', long = "root-dir")]
    pub root_dir: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(short = 'l', long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Override the default analysis depth (quick, standard, deep)
    #[arg(long = "depth")]
    pub depth: Option<String>,

    /// Skip auto-fix suggestions during deep analysis
    #[arg(long = "no-auto-fix")]
    pub no_auto_fix: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Analyze a stored session
    Analyze {
        /// Session id (the part after `session_` in the file name)
        session_id: Option<String>,
        /// Analyze the most recently written session
        #[arg(long)]
        latest: bool,
    },
    /// Analyze a stored session and write a report
    Report {
        #[arg(long = "session-id")]
        session_id: Option<String>,
        #[arg(long)]
        latest: bool,
        #[arg(long, value_enum, default_value_t = ReportFormat::Json)]
        format: ReportFormat,
    },
    /// List stored sessions, newest first
    Sessions,
    /// Delete sessions and screenshots older than N days
    Cleanup {
        #[arg(long, default_value_t = DEFAULT_SESSION_RETENTION_DAYS)]
        days: u64,
    },
    /// List the configured app registry
    Apps,
    /// Print the effective configuration as JSON
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Json,
    Md,
    Text,
}

// Browser defaults
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1920;
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 1080;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_SLOW_MO_MS: u64 = 100;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) Playwright Debugger";
pub const BROWSER_LAUNCH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-dev-shm-usage",
];

// Retention / monitor
pub const DEFAULT_SESSION_RETENTION_DAYS: u64 = 7;
pub const DEFAULT_MONITOR_INTERVAL_SECS: u64 = 30;
pub const MONITOR_CAPTURE_WINDOW_SECS: u64 = 5;
pub const DEBUG_CAPTURE_WINDOW_SECS: u64 = 10;

// Severity thresholds
pub const HIGH_ISSUES_THRESHOLD: usize = 20;
pub const HIGH_PERF_ISSUES_THRESHOLD: usize = 5;
pub const MEDIUM_ISSUES_THRESHOLD: usize = 5;
pub const MEDIUM_PERF_ISSUES_THRESHOLD: usize = 2;

// Performance thresholds
pub const MANY_REQUESTS_THRESHOLD: usize = 100;
pub const HIGH_ERROR_RATE_THRESHOLD: f64 = 0.1;
pub const SLOW_LOAD_MS: f64 = 5000.0;
pub const SLOW_TTFB_MS: f64 = 1000.0;

// Analysis truncation limits
pub const MAX_CONSOLE_ERROR_MESSAGES: usize = 10;
pub const MAX_FAILED_URLS: usize = 10;
pub const MAX_DOMAINS: usize = 10;
pub const MAX_COMMON_ERRORS: usize = 5;
pub const FAILED_REQUESTS_RECOMMENDATION_THRESHOLD: usize = 5;

// Known apps: (name, env override, default url)
pub const APPS: &[(&str, &str, &str)] = &[
    ("web-app", "WEB_APP_URL", "http://localhost:3000"),
    ("doctors", "DOCTORS_URL", "http://localhost:3001"),
    ("patients", "PATIENTS_URL", "http://localhost:3002"),
    ("companies", "COMPANIES_URL", "http://localhost:3003"),
    ("admin", "ADMIN_URL", "http://localhost:3004"),
    ("auth", "AUTH_URL", "http://localhost:3005"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIEWPORT_WIDTH,
            height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

/// Which event streams a session records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureToggles {
    pub console: bool,
    pub network: bool,
    pub errors: bool,
    pub performance: bool,
}

impl Default for CaptureToggles {
    fn default() -> Self {
        Self {
            console: true,
            network: true,
            errors: true,
            performance: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotFormat {
    Png,
    Jpeg,
}

impl ScreenshotFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ScreenshotFormat::Png => "png",
            ScreenshotFormat::Jpeg => "jpeg",
        }
    }
}

impl FromStr for ScreenshotFormat {
    type Err = DebuggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ScreenshotFormat::Png),
            "jpeg" | "jpg" => Ok(ScreenshotFormat::Jpeg),
            other => Err(DebuggerError::InvalidConfig(format!(
                "unsupported screenshot format: {}",
                other
            ))),
        }
    }
}

/// Configuration handed to every session, analyzer and monitor.
#[derive(Debug, Clone, Serialize)]
pub struct DebuggerConfig {
    pub root_dir: PathBuf,
    pub screenshots_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub data_dir: PathBuf,
    pub apps: BTreeMap<String, String>,
    pub viewport: Viewport,
    pub timeout_ms: u64,
    pub headless: bool,
    pub slow_mo_ms: u64,
    pub user_agent: String,
    pub capture: CaptureToggles,
    pub analysis_depth: AnalysisDepth,
    pub auto_analyze: bool,
    pub pattern_detection: bool,
    pub auto_fix_suggestions: bool,
    pub screenshot_format: ScreenshotFormat,
    pub screenshot_viewer: String,
    pub auto_open_screenshots: bool,
    pub session_retention_days: u64,
    pub monitor_interval_secs: u64,
}

impl DebuggerConfig {
    /// Defaults rooted at `root_dir`, without consulting the environment.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        let root_dir = root_dir.into();
        let apps = APPS
            .iter()
            .map(|(name, _, url)| (name.to_string(), url.to_string()))
            .collect();

        DebuggerConfig {
            screenshots_dir: root_dir.join("screenshots"),
            reports_dir: root_dir.join("reports"),
            logs_dir: root_dir.join("logs"),
            data_dir: root_dir.join("data"),
            root_dir,
            apps,
            viewport: Viewport::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            headless: false,
            slow_mo_ms: DEFAULT_SLOW_MO_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            capture: CaptureToggles::default(),
            analysis_depth: AnalysisDepth::Deep,
            auto_analyze: true,
            pattern_detection: true,
            auto_fix_suggestions: true,
            screenshot_format: ScreenshotFormat::Png,
            screenshot_viewer: "eog".to_string(),
            auto_open_screenshots: true,
            session_retention_days: DEFAULT_SESSION_RETENTION_DAYS,
            monitor_interval_secs: DEFAULT_MONITOR_INTERVAL_SECS,
        }
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env(root_dir: impl Into<PathBuf>) -> DebuggerResult<Self> {
        Self::from_lookup(root_dir, |key| std::env::var(key).ok())
    }

    /// Same as [`DebuggerConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(root_dir: impl Into<PathBuf>, lookup: F) -> DebuggerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(root_dir);

        for (name, env_key, _) in APPS {
            if let Some(url) = lookup(env_key).filter(|u| !u.trim().is_empty()) {
                config.apps.insert(name.to_string(), url);
            }
        }

        config.headless = env_bool(&lookup, "HEADLESS", config.headless);
        config.slow_mo_ms = env_parse(&lookup, "SLOW_MO", config.slow_mo_ms);
        config.timeout_ms = env_parse(&lookup, "TIMEOUT", config.timeout_ms);
        config.viewport.width = env_parse(&lookup, "VIEWPORT_WIDTH", config.viewport.width);
        config.viewport.height = env_parse(&lookup, "VIEWPORT_HEIGHT", config.viewport.height);

        config.capture.console = env_bool(&lookup, "CAPTURE_CONSOLE", true);
        config.capture.network = env_bool(&lookup, "CAPTURE_NETWORK", true);
        config.capture.errors = env_bool(&lookup, "CAPTURE_ERRORS", true);
        config.capture.performance = env_bool(&lookup, "CAPTURE_PERFORMANCE", true);

        if let Some(depth) = lookup("ANALYSIS_DEPTH") {
            config.analysis_depth = depth.parse()?;
        }
        config.auto_analyze = env_bool(&lookup, "AUTO_ANALYZE", true);
        config.pattern_detection = env_bool(&lookup, "PATTERN_DETECTION", true);
        config.auto_fix_suggestions = env_bool(&lookup, "AUTO_FIX_SUGGESTIONS", true);

        if let Some(format) = lookup("SCREENSHOT_FORMAT") {
            config.screenshot_format = format.parse()?;
        }
        if let Some(viewer) = lookup("SCREENSHOT_VIEWER").filter(|v| !v.trim().is_empty()) {
            config.screenshot_viewer = viewer;
        }
        config.auto_open_screenshots = env_bool(&lookup, "AUTO_OPEN_SCREENSHOTS", true);
        config.session_retention_days = env_parse(
            &lookup,
            "SESSION_RETENTION_DAYS",
            config.session_retention_days,
        );
        config.monitor_interval_secs =
            env_parse(&lookup, "MONITOR_INTERVAL", config.monitor_interval_secs);

        Ok(config)
    }

    /// Environment configuration with CLI flags layered on top.
    pub fn from_args(args: &CliArgs) -> DebuggerResult<Self> {
        let root_dir = args.root_dir.clone().unwrap_or_else(default_root_dir);
        let mut config = Self::from_env(root_dir)?;

        if let Some(ref depth) = args.depth {
            config.analysis_depth = depth.parse()?;
        }
        if args.no_auto_fix {
            config.auto_fix_suggestions = false;
        }

        Ok(config)
    }

    /// Resolve an app name from the registry.
    pub fn app_url(&self, app_name: &str) -> DebuggerResult<&str> {
        self.apps
            .get(app_name)
            .map(String::as_str)
            .ok_or_else(|| DebuggerError::UnknownApp(app_name.to_string()))
    }

    pub fn ensure_directories(&self) -> DebuggerResult<()> {
        for dir in [
            &self.screenshots_dir,
            &self.reports_dir,
            &self.logs_dir,
            &self.data_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}

/// `$XDG_DATA_HOME/page-debugger`, or the working directory when unavailable.
pub fn default_root_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("page-debugger"))
        .unwrap_or_else(|| Path::new(".").to_path_buf())
}

fn env_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(v) => match v.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            other => {
                warn!("Ignoring {}={:?}, expected true/false", key, other);
                default
            }
        },
        None => default,
    }
}

fn env_parse<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(v) => v.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring {}={:?}, not a number", key, v);
            default
        }),
        None => default,
    }
}
