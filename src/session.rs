//! One bounded attachment to a browser page.
//!
//! Page events flow through an [`EventSink`] into a collector task that
//! exclusively owns the session's [`DebugSessionData`]. Explicit captures
//! (screenshots, metrics, metadata) reach the same task as commands, so the
//! data bag is never shared behind a lock.

use chrono::Utc;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::browser::{
    Browser, BrowserLauncher, ContextOptions, EventSink, LaunchOptions, Page, PageEvent,
    ScreenshotOptions, WaitPolicy,
};
use crate::config::{CaptureToggles, DebuggerConfig, BROWSER_LAUNCH_ARGS};
use crate::error::{DebuggerError, DebuggerResult};
use crate::model::{
    ConsoleLog, ConsoleType, DebugSessionData, JavaScriptError, NetworkRequest,
    PerformanceMetrics, ResponseUpdate,
};
use crate::storage::SessionStore;

/// Reads navigation timing plus the web-vitals entries the page exposes.
const PERFORMANCE_SCRIPT: &str = r#"() => {
    const t = performance.timing;
    if (!t || !t.navigationStart) { return null; }
    const lcpEntries = performance.getEntriesByType('largest-contentful-paint');
    const shifts = performance.getEntriesByType('layout-shift');
    const firstInput = performance.getEntriesByType('first-input')[0];
    return {
        domContentLoaded: t.domContentLoadedEventEnd - t.navigationStart,
        load: t.loadEventEnd - t.navigationStart,
        ttfb: t.responseStart - t.navigationStart,
        lcp: lcpEntries.length ? lcpEntries[lcpEntries.length - 1].startTime : null,
        cls: shifts.length
            ? shifts.filter(e => !e.hadRecentInput).reduce((sum, e) => sum + e.value, 0)
            : null,
        fid: firstInput ? firstInput.processingStart - firstInput.startTime : null,
    };
}"#;

const RELEASE_TIMEOUT_SECS: u64 = 10;
const SUMMARY_FAILED_REQUESTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Created,
    Started,
    Navigated,
    Active,
    Closed,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTimings {
    dom_content_loaded: Option<f64>,
    load: Option<f64>,
    ttfb: Option<f64>,
    lcp: Option<f64>,
    cls: Option<f64>,
    fid: Option<f64>,
}

enum Command {
    Screenshot(PathBuf),
    Metrics(PerformanceMetrics),
    Metadata(String, serde_json::Value),
    Snapshot(oneshot::Sender<DebugSessionData>),
    Finish(oneshot::Sender<DebugSessionData>),
}

/// Outcome of [`DebugSession::run`].
#[derive(Debug)]
pub struct SessionRun<T> {
    pub result: DebuggerResult<T>,
    pub data: DebugSessionData,
    pub session_file: Option<PathBuf>,
}

pub struct DebugSession {
    session_id: String,
    app_name: String,
    url: String,
    config: Arc<DebuggerConfig>,
    launcher: Arc<dyn BrowserLauncher>,
    store: SessionStore,
    headless: bool,
    slow_mo_ms: u64,
    phase: SessionPhase,
    browser: Option<Box<dyn Browser>>,
    page: Option<Box<dyn Page>>,
    commands: Option<mpsc::UnboundedSender<Command>>,
    collector: Option<JoinHandle<()>>,
    /// Held here before start and after close; owned by the collector in between.
    data: Option<DebugSessionData>,
    blank: Option<DebugSessionData>,
    session_file: Option<PathBuf>,
}

impl DebugSession {
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        url: impl Into<String>,
        app_name: impl Into<String>,
        config: Arc<DebuggerConfig>,
    ) -> Self {
        let url = url.into();
        let app_name = app_name.into();
        let data = DebugSessionData::new(app_name.clone(), url.clone());
        Self {
            session_id: data.session_id.clone(),
            app_name,
            url,
            store: SessionStore::new(&config),
            headless: config.headless,
            slow_mo_ms: config.slow_mo_ms,
            config,
            launcher,
            phase: SessionPhase::Created,
            browser: None,
            page: None,
            commands: None,
            collector: None,
            data: Some(data),
            blank: None,
            session_file: None,
        }
    }

    /// Session for a registered app; unknown names are rejected up front.
    pub fn for_app(
        launcher: Arc<dyn BrowserLauncher>,
        app_name: &str,
        config: Arc<DebuggerConfig>,
    ) -> DebuggerResult<Self> {
        let url = config.app_url(app_name)?.to_string();
        Ok(Self::new(launcher, url, app_name, config))
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_slow_mo(mut self, slow_mo_ms: u64) -> Self {
        self.slow_mo_ms = slow_mo_ms;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// The data bag, available before `start()` and after `close()`.
    pub fn data(&self) -> Option<&DebugSessionData> {
        self.data.as_ref()
    }

    pub fn session_file(&self) -> Option<&Path> {
        self.session_file.as_deref()
    }

    /// Launch the browser, open a page in a fresh context and begin capturing.
    ///
    /// Must be called exactly once. Resources acquired before a failure are
    /// kept so that `close()` can release them.
    pub async fn start(&mut self) -> DebuggerResult<()> {
        if self.phase != SessionPhase::Created {
            return Err(DebuggerError::SessionState {
                expected: "created",
                actual: self.phase,
            });
        }
        self.phase = SessionPhase::Started;

        info!(
            "Starting debug session {} for {} ({})",
            self.session_id, self.app_name, self.url
        );

        let launch = LaunchOptions {
            headless: self.headless,
            slow_mo_ms: self.slow_mo_ms,
            args: BROWSER_LAUNCH_ARGS.iter().map(|a| a.to_string()).collect(),
        };
        let browser = self.launcher.launch(&launch).await?;
        let browser = self.browser.insert(browser);

        let context = ContextOptions {
            viewport: self.config.viewport,
            user_agent: self.config.user_agent.clone(),
            ignore_https_errors: true,
            timeout_ms: self.config.timeout_ms,
        };
        let (sink, events) = EventSink::channel();
        let page = browser.new_page(&context, sink).await?;
        self.page = Some(page);

        let data = self.data.take().unwrap_or_else(|| {
            DebugSessionData::new(self.app_name.clone(), self.url.clone())
        });
        self.blank = Some(data.clone());

        let (tx, rx) = mpsc::unbounded_channel();
        self.commands = Some(tx);
        self.collector = Some(tokio::spawn(run_collector(
            data,
            self.config.capture,
            events,
            rx,
        )));

        info!("Browser started for session {}", self.session_id);
        Ok(())
    }

    /// Load the configured URL. Failures are logged and reported as `false`.
    pub async fn navigate(&mut self, wait: WaitPolicy) -> bool {
        let timeout = self.config.timeout();
        let Some(page) = self.live_page("navigate") else {
            return false;
        };

        info!("Navigating to {} (wait: {})", self.url, wait.as_str());
        let outcome = with_timeout(timeout, page.goto(&self.url, wait, timeout)).await;
        let success = match outcome {
            Ok(Some(response)) if response.ok() => {
                info!("Navigation succeeded: {}", response.status);
                true
            }
            Ok(Some(response)) => {
                warn!("Navigation finished with status {}", response.status);
                false
            }
            Ok(None) => {
                warn!("Navigation finished without a response");
                false
            }
            Err(e) => {
                error!("Navigation to {} failed: {}", self.url, e);
                false
            }
        };

        if success && self.phase == SessionPhase::Started {
            self.phase = SessionPhase::Navigated;
        }
        success
    }

    pub async fn wait_for(&mut self, selector: &str, timeout: Option<Duration>) -> bool {
        let timeout = timeout.unwrap_or_else(|| self.config.timeout());
        let Some(page) = self.live_page("wait_for") else {
            return false;
        };
        match with_timeout(timeout, page.wait_for_selector(selector, timeout)).await {
            Ok(()) => {
                debug!("Element found: {}", selector);
                self.mark_active();
                true
            }
            Err(e) => {
                warn!("Timed out waiting for {}: {}", selector, e);
                false
            }
        }
    }

    pub async fn click(&mut self, selector: &str) -> bool {
        let timeout = self.config.timeout();
        let Some(page) = self.live_page("click") else {
            return false;
        };
        match with_timeout(timeout, page.click(selector)).await {
            Ok(()) => {
                info!("Clicked {}", selector);
                self.mark_active();
                true
            }
            Err(e) => {
                error!("Click on {} failed: {}", selector, e);
                false
            }
        }
    }

    pub async fn fill(&mut self, selector: &str, value: &str) -> bool {
        let timeout = self.config.timeout();
        let Some(page) = self.live_page("fill") else {
            return false;
        };
        match with_timeout(timeout, page.fill(selector, value)).await {
            Ok(()) => {
                info!("Filled {}", selector);
                self.mark_active();
                true
            }
            Err(e) => {
                error!("Filling {} failed: {}", selector, e);
                false
            }
        }
    }

    pub async fn html(&mut self) -> Option<String> {
        let timeout = self.config.timeout();
        let page = self.live_page("html")?;
        match with_timeout(timeout, page.content()).await {
            Ok(html) => Some(html),
            Err(e) => {
                warn!("Could not read page content: {}", e);
                None
            }
        }
    }

    pub async fn title(&mut self) -> Option<String> {
        let timeout = self.config.timeout();
        let page = self.live_page("title")?;
        match with_timeout(timeout, page.title()).await {
            Ok(title) => Some(title),
            Err(e) => {
                warn!("Could not read page title: {}", e);
                None
            }
        }
    }

    /// Capture the rendered page into the screenshots directory.
    pub async fn screenshot(&mut self, name: Option<&str>) -> Option<PathBuf> {
        let path = self.screenshot_path(name);
        let options = ScreenshotOptions {
            full_page: true,
            format: self.config.screenshot_format,
        };
        let timeout = self.config.timeout();
        let page = self.live_page("screenshot")?;

        if let Err(e) = tokio::fs::create_dir_all(&self.config.screenshots_dir).await {
            error!("Cannot create screenshots dir: {}", e);
            return None;
        }

        match with_timeout(timeout, page.screenshot(&path, &options)).await {
            Ok(()) => {
                info!("Screenshot saved: {:?}", path);
                self.send(Command::Screenshot(path.clone()));
                self.mark_active();
                Some(path)
            }
            Err(e) => {
                error!("Screenshot failed: {}", e);
                None
            }
        }
    }

    /// Evaluate in-page timing data and replace the session's snapshot.
    pub async fn capture_performance_metrics(&mut self) -> Option<PerformanceMetrics> {
        if !self.config.capture.performance {
            return None;
        }
        let timeout = self.config.timeout();
        let page = self.live_page("capture_performance_metrics")?;

        let value = match with_timeout(timeout, page.evaluate(PERFORMANCE_SCRIPT)).await {
            Ok(v) => v,
            Err(e) => {
                debug!("Performance metrics unavailable: {}", e);
                return None;
            }
        };
        if value.is_null() {
            debug!("Page exposes no timing data");
            return None;
        }
        let raw: RawTimings = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => {
                debug!("Unexpected timing payload: {}", e);
                return None;
            }
        };

        let metrics = PerformanceMetrics {
            timestamp: Utc::now(),
            lcp: raw.lcp,
            fid: raw.fid,
            cls: raw.cls,
            ttfb: raw.ttfb,
            dom_content_loaded: raw.dom_content_loaded,
            load: raw.load,
        };
        info!("Performance metrics captured");
        self.send(Command::Metrics(metrics.clone()));
        self.mark_active();
        Some(metrics)
    }

    /// Attach a free-form metadata entry to the data bag.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: serde_json::Value) {
        let key = key.into();
        if self.commands.is_some() {
            self.send(Command::Metadata(key, value));
        } else if let Some(data) = self.data.as_mut().filter(|d| !d.is_finished()) {
            data.metadata.insert(key, value);
        }
    }

    /// A copy of everything captured so far.
    pub async fn snapshot(&self) -> Option<DebugSessionData> {
        if let Some(ref tx) = self.commands {
            let (reply, rx) = oneshot::channel();
            if tx.send(Command::Snapshot(reply)).is_ok() {
                return rx.await.ok();
            }
            return None;
        }
        self.data.clone()
    }

    pub async fn summary(&self) -> Option<SessionSummary> {
        self.snapshot().await.map(|d| SessionSummary::from_data(&d))
    }

    /// Finalize, persist and release. Safe to call after a partial `start()`
    /// and more than once; only the first call does work.
    pub async fn close(&mut self) -> Option<PathBuf> {
        if self.phase == SessionPhase::Closed {
            debug!("Session {} already closed", self.session_id);
            return self.session_file.clone();
        }
        self.phase = SessionPhase::Closed;
        info!("Closing debug session {}", self.session_id);

        let mut data = self.finish_collector().await;
        data.finish();

        self.session_file = match self.store.save(&data) {
            Ok(path) => Some(path),
            Err(e) => {
                error!("Failed to save session {}: {}", self.session_id, e);
                None
            }
        };
        self.data = Some(data);

        let release = Duration::from_secs(RELEASE_TIMEOUT_SECS);
        if let Some(page) = self.page.take() {
            if let Err(e) = with_timeout(release, page.close()).await {
                warn!("Failed to close page: {}", e);
            }
        }
        if let Some(browser) = self.browser.take() {
            if let Err(e) = with_timeout(release, browser.close()).await {
                warn!("Failed to close browser: {}", e);
            }
        }

        info!("Session {} closed", self.session_id);
        self.session_file.clone()
    }

    /// Start, run `body`, and close on every exit path, including panics.
    ///
    /// A panic in `body` is resumed once the session has been saved.
    pub async fn run<T, F>(self, body: F) -> SessionRun<T>
    where
        F: for<'a> FnOnce(&'a mut DebugSession) -> BoxFuture<'a, DebuggerResult<T>>,
    {
        let (outcome, panic) = self.run_guarded(body).await;
        if let Some(payload) = panic {
            std::panic::resume_unwind(payload);
        }
        outcome
    }

    /// Like [`DebugSession::run`], but a panic in `body` is reported as
    /// [`DebuggerError::Panicked`] instead of unwinding into the caller.
    pub async fn run_isolated<T, F>(self, body: F) -> SessionRun<T>
    where
        F: for<'a> FnOnce(&'a mut DebugSession) -> BoxFuture<'a, DebuggerResult<T>>,
    {
        let (mut outcome, panic) = self.run_guarded(body).await;
        if let Some(payload) = panic {
            let message = panic_message(payload.as_ref());
            error!(
                "Session {} body panicked: {}",
                outcome.data.session_id, message
            );
            outcome.result = Err(DebuggerError::Panicked(message));
        }
        outcome
    }

    async fn run_guarded<T, F>(mut self, body: F) -> (SessionRun<T>, Option<PanicPayload>)
    where
        F: for<'a> FnOnce(&'a mut DebugSession) -> BoxFuture<'a, DebuggerResult<T>>,
    {
        let mut panic = None;
        let result = match self.start().await {
            Ok(()) => match AssertUnwindSafe(body(&mut self)).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    panic = Some(payload);
                    Err(DebuggerError::Panicked(message))
                }
            },
            Err(e) => {
                error!("Session {} failed to start: {}", self.session_id, e);
                Err(e)
            }
        };

        let session_file = self.close().await;
        let data = self
            .data
            .take()
            .unwrap_or_else(|| DebugSessionData::new(self.app_name.clone(), self.url.clone()));
        let outcome = SessionRun {
            result,
            data,
            session_file,
        };
        (outcome, panic)
    }

    async fn finish_collector(&mut self) -> DebugSessionData {
        let Some(tx) = self.commands.take() else {
            return self.data.take().unwrap_or_else(|| {
                DebugSessionData::new(self.app_name.clone(), self.url.clone())
            });
        };

        let (reply, rx) = oneshot::channel();
        let data = if tx.send(Command::Finish(reply)).is_ok() {
            rx.await.ok()
        } else {
            None
        };
        drop(tx);
        if let Some(handle) = self.collector.take() {
            if let Err(e) = handle.await {
                warn!("Collector task ended abnormally: {}", e);
            }
        }

        data.unwrap_or_else(|| {
            error!(
                "Captured events for session {} were lost; persisting header only",
                self.session_id
            );
            self.blank.take().unwrap_or_else(|| {
                DebugSessionData::new(self.app_name.clone(), self.url.clone())
            })
        })
    }

    fn live_page(&self, operation: &str) -> Option<&dyn Page> {
        if self.phase == SessionPhase::Closed {
            warn!("{} called on closed session {}", operation, self.session_id);
            return None;
        }
        match self.page.as_deref() {
            Some(page) => Some(page),
            None => {
                warn!("{} called before the session started", operation);
                None
            }
        }
    }

    fn mark_active(&mut self) {
        if matches!(self.phase, SessionPhase::Started | SessionPhase::Navigated) {
            self.phase = SessionPhase::Active;
        }
    }

    fn send(&self, command: Command) {
        if let Some(ref tx) = self.commands {
            if tx.send(command).is_err() {
                warn!("Collector for session {} is gone", self.session_id);
            }
        }
    }

    fn screenshot_path(&self, name: Option<&str>) -> PathBuf {
        let ext = self.config.screenshot_format.extension();
        let file = match name {
            Some(n) if Path::new(n).extension().is_some() => n.to_string(),
            Some(n) => format!("{}.{}", n, ext),
            None => format!(
                "{}_{}.{}",
                self.app_name,
                Utc::now().format("%Y%m%d_%H%M%S"),
                ext
            ),
        };
        self.config.screenshots_dir.join(file)
    }
}

impl Drop for DebugSession {
    fn drop(&mut self) {
        if self.phase != SessionPhase::Closed && self.phase != SessionPhase::Created {
            warn!(
                "Session {} dropped without close(); captured data was not persisted",
                self.session_id
            );
        }
        if let Some(handle) = self.collector.take() {
            handle.abort();
        }
    }
}

type PanicPayload = Box<dyn Any + Send>;

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Await `fut`, turning an elapsed deadline into a [`DebuggerError::Timeout`].
async fn with_timeout<T, F>(timeout: Duration, fut: F) -> DebuggerResult<T>
where
    F: Future<Output = DebuggerResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(DebuggerError::Timeout(format!(
            "operation exceeded {}ms",
            timeout.as_millis()
        ))),
    }
}

async fn run_collector(
    mut data: DebugSessionData,
    capture: CaptureToggles,
    mut events: mpsc::UnboundedReceiver<PageEvent>,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    loop {
        tokio::select! {
            biased;
            Some(event) = events.recv() => record_isolated(&mut data, capture, event),
            command = commands.recv() => match command {
                Some(Command::Screenshot(path)) => data.screenshots.push(path),
                Some(Command::Metrics(metrics)) => data.performance_metrics = Some(metrics),
                Some(Command::Metadata(key, value)) => {
                    data.metadata.insert(key, value);
                }
                Some(Command::Snapshot(reply)) => {
                    let _ = reply.send(data.clone());
                }
                Some(Command::Finish(reply)) => {
                    while let Ok(event) = events.try_recv() {
                        record_isolated(&mut data, capture, event);
                    }
                    let _ = reply.send(data);
                    return;
                }
                None => return,
            },
        }
    }
}

/// Record one event; a panic while handling it is logged and swallowed.
fn record_isolated(data: &mut DebugSessionData, capture: CaptureToggles, event: PageEvent) {
    let kind = event.kind();
    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| record_event(data, capture, event)));
    if outcome.is_err() {
        error!("Handler for {} event panicked; event dropped", kind);
    }
}

pub(crate) fn record_event(data: &mut DebugSessionData, capture: CaptureToggles, event: PageEvent) {
    match event {
        PageEvent::Console {
            kind,
            text,
            location,
            stack_trace,
        } if capture.console => {
            let kind = ConsoleType::from_browser(&kind);
            match kind {
                ConsoleType::Error => warn!("[CONSOLE ERROR] {}", text),
                ConsoleType::Warning => info!("[CONSOLE WARNING] {}", text),
                _ => debug!("[CONSOLE {}] {}", kind.as_str().to_uppercase(), text),
            }
            data.console_logs.push(ConsoleLog {
                timestamp: Utc::now(),
                kind,
                text,
                location,
                stack_trace,
            });
        }
        PageEvent::Request {
            request_id,
            method,
            url,
            headers,
            resource_type,
        } if capture.network => {
            debug!("Request: {} {}", method, url);
            data.network_requests.push(NetworkRequest {
                timestamp: Utc::now(),
                method,
                url,
                status: None,
                status_text: None,
                timing: None,
                headers,
                response_headers: None,
                failure: None,
                resource_type,
                request_id,
            });
        }
        PageEvent::Response {
            request_id,
            url,
            status,
            status_text,
            headers,
            timing,
        } if capture.network => {
            if status >= 400 {
                warn!("Response error: {} {}", status, url);
            }
            let update = ResponseUpdate {
                status,
                status_text,
                headers,
                timing,
            };
            if !data.apply_response(&url, request_id.as_deref(), update) {
                debug!("No pending request for response {}", url);
            }
        }
        PageEvent::RequestFailed {
            request_id,
            url,
            failure,
        } if capture.network => {
            error!("Request failed: {} - {}", url, failure);
            if !data.apply_failure(&url, request_id.as_deref(), failure) {
                debug!("No pending request for failure {}", url);
            }
        }
        PageEvent::PageError {
            message,
            stack,
            source,
            line,
            column,
        } if capture.errors => {
            error!("JavaScript error: {}", message);
            data.javascript_errors.push(JavaScriptError {
                timestamp: Utc::now(),
                message,
                stack,
                source,
                line,
                column,
            });
        }
        other => debug!("Capture disabled for {} events", other.kind()),
    }
}

/// Counts shown at the end of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub app_name: String,
    pub url: String,
    pub console_logs: usize,
    pub network_requests: usize,
    pub javascript_errors: usize,
    pub screenshots: usize,
    pub failed_requests: usize,
    pub error_messages: Vec<String>,
    /// First few failures as `METHOD url (status or reason)`.
    pub failed_request_lines: Vec<String>,
}

impl SessionSummary {
    pub fn from_data(data: &DebugSessionData) -> Self {
        let failed = data.failed_requests();
        let failed_request_lines = failed
            .iter()
            .take(SUMMARY_FAILED_REQUESTS)
            .map(|r| {
                let reason = match (r.status, r.failure.as_deref()) {
                    (Some(s), _) => s.to_string(),
                    (None, Some(f)) => f.to_string(),
                    (None, None) => "pending".to_string(),
                };
                format!("{} {} ({})", r.method, r.url, reason)
            })
            .collect();

        Self {
            session_id: data.session_id.clone(),
            app_name: data.app_name.clone(),
            url: data.url.clone(),
            console_logs: data.console_logs.len(),
            network_requests: data.network_requests.len(),
            javascript_errors: data.javascript_errors.len(),
            screenshots: data.screenshots.len(),
            failed_requests: failed.len(),
            error_messages: data
                .javascript_errors
                .iter()
                .map(|e| e.message.clone())
                .collect(),
            failed_request_lines,
        }
    }

    pub fn log(&self) {
        let short_id: String = self.session_id.chars().take(8).collect();
        info!(
            "Session {} [{} @ {}]: {} console logs, {} requests ({} failed), {} JS errors, {} screenshots",
            short_id,
            self.app_name,
            self.url,
            self.console_logs,
            self.network_requests,
            self.failed_requests,
            self.javascript_errors,
            self.screenshots
        );
        for message in &self.error_messages {
            warn!("  JS error: {}", message);
        }
        for line in &self.failed_request_lines {
            warn!("  Failed request: {}", line);
        }
    }
}
