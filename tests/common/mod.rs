// Scripted in-process browser used by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use page_debugger::browser::{
    Browser, BrowserLauncher, ContextOptions, EventSink, LaunchOptions, NavigationResponse, Page,
    PageEvent, ScreenshotOptions, WaitPolicy,
};
use page_debugger::config::DebuggerConfig;
use page_debugger::error::{DebuggerError, DebuggerResult};

/// What the fake browser does when called.
#[derive(Debug, Clone)]
pub struct Script {
    pub fail_launch: bool,
    pub fail_new_page: bool,
    /// Emitted on the page's sink while `goto` runs.
    pub navigation_events: Vec<PageEvent>,
    pub goto_status: Option<u16>,
    pub goto_error: Option<String>,
    pub goto_delay: Option<Duration>,
    /// `goto` panics for URLs containing this text.
    pub goto_panic_on: Option<String>,
    pub present_selectors: Vec<String>,
    pub fail_screenshot: bool,
    pub metrics: serde_json::Value,
    pub title: String,
    pub html: String,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            fail_launch: false,
            fail_new_page: false,
            navigation_events: Vec::new(),
            goto_status: Some(200),
            goto_error: None,
            goto_delay: None,
            goto_panic_on: None,
            present_selectors: Vec::new(),
            fail_screenshot: false,
            metrics: serde_json::Value::Null,
            title: "Test Page".to_string(),
            html: "<html><body>ok</body></html>".to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Calls {
    pub launches: Vec<LaunchOptions>,
    pub contexts: Vec<ContextOptions>,
    pub gotos: Vec<(String, WaitPolicy)>,
    pub clicks: Vec<String>,
    pub fills: Vec<(String, String)>,
    pub screenshots: Vec<PathBuf>,
    pub evaluations: usize,
    pub pages_closed: usize,
    pub browsers_closed: usize,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub script: Script,
    pub calls: Calls,
    pub sinks: Vec<EventSink>,
}

#[derive(Clone, Default)]
pub struct FakeLauncher {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeLauncher {
    pub fn new(script: Script) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                script,
                ..Default::default()
            })),
        }
    }

    pub fn shared(&self) -> Arc<dyn BrowserLauncher> {
        Arc::new(self.clone())
    }

    pub fn script(&self, f: impl FnOnce(&mut Script)) {
        f(&mut self.state.lock().unwrap().script);
    }

    pub fn with_calls<T>(&self, f: impl FnOnce(&Calls) -> T) -> T {
        f(&self.state.lock().unwrap().calls)
    }

    /// Deliver an event to the most recently opened page.
    pub fn emit(&self, event: PageEvent) {
        let state = self.state.lock().unwrap();
        if let Some(sink) = state.sinks.last() {
            sink.emit(event);
        }
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self, options: &LaunchOptions) -> DebuggerResult<Box<dyn Browser>> {
        let mut state = self.state.lock().unwrap();
        state.calls.launches.push(options.clone());
        if state.script.fail_launch {
            return Err(DebuggerError::Browser("executable not found".into()));
        }
        Ok(Box::new(FakeBrowser {
            state: self.state.clone(),
        }))
    }
}

struct FakeBrowser {
    state: Arc<Mutex<FakeState>>,
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn new_page(
        &self,
        options: &ContextOptions,
        events: EventSink,
    ) -> DebuggerResult<Box<dyn Page>> {
        let mut state = self.state.lock().unwrap();
        state.calls.contexts.push(options.clone());
        if state.script.fail_new_page {
            return Err(DebuggerError::Browser("context creation failed".into()));
        }
        state.sinks.push(events.clone());
        Ok(Box::new(FakePage {
            state: self.state.clone(),
            events,
        }))
    }

    async fn close(&self) -> DebuggerResult<()> {
        self.state.lock().unwrap().calls.browsers_closed += 1;
        Ok(())
    }
}

struct FakePage {
    state: Arc<Mutex<FakeState>>,
    events: EventSink,
}

#[async_trait]
impl Page for FakePage {
    async fn goto(
        &self,
        url: &str,
        wait: WaitPolicy,
        _timeout: Duration,
    ) -> DebuggerResult<Option<NavigationResponse>> {
        let script = {
            let mut state = self.state.lock().unwrap();
            state.calls.gotos.push((url.to_string(), wait));
            state.script.clone()
        };
        for event in script.navigation_events {
            self.events.emit(event);
        }
        if script.goto_panic_on.is_some_and(|needle| url.contains(&needle)) {
            panic!("driver bug while loading {}", url);
        }
        if let Some(delay) = script.goto_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = script.goto_error {
            return Err(DebuggerError::Browser(err));
        }
        Ok(script.goto_status.map(|status| NavigationResponse {
            status,
            url: url.to_string(),
        }))
    }

    async fn wait_for_selector(&self, selector: &str, _timeout: Duration) -> DebuggerResult<()> {
        let state = self.state.lock().unwrap();
        if state.script.present_selectors.iter().any(|s| s == selector) {
            Ok(())
        } else {
            Err(DebuggerError::Timeout(format!("waiting for {}", selector)))
        }
    }

    async fn click(&self, selector: &str) -> DebuggerResult<()> {
        let mut state = self.state.lock().unwrap();
        if !state.script.present_selectors.iter().any(|s| s == selector) {
            return Err(DebuggerError::Browser(format!("no element {}", selector)));
        }
        state.calls.clicks.push(selector.to_string());
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> DebuggerResult<()> {
        let mut state = self.state.lock().unwrap();
        if !state.script.present_selectors.iter().any(|s| s == selector) {
            return Err(DebuggerError::Browser(format!("no element {}", selector)));
        }
        state
            .calls
            .fills
            .push((selector.to_string(), value.to_string()));
        Ok(())
    }

    async fn content(&self) -> DebuggerResult<String> {
        Ok(self.state.lock().unwrap().script.html.clone())
    }

    async fn title(&self) -> DebuggerResult<String> {
        Ok(self.state.lock().unwrap().script.title.clone())
    }

    async fn screenshot(&self, path: &Path, _options: &ScreenshotOptions) -> DebuggerResult<()> {
        let fail = {
            let mut state = self.state.lock().unwrap();
            state.calls.screenshots.push(path.to_path_buf());
            state.script.fail_screenshot
        };
        if fail {
            return Err(DebuggerError::Browser("render failed".into()));
        }
        write_png(path, 16, 9);
        Ok(())
    }

    async fn evaluate(&self, _script: &str) -> DebuggerResult<serde_json::Value> {
        let mut state = self.state.lock().unwrap();
        state.calls.evaluations += 1;
        Ok(state.script.metrics.clone())
    }

    async fn close(&self) -> DebuggerResult<()> {
        self.state.lock().unwrap().calls.pages_closed += 1;
        Ok(())
    }
}

pub fn test_config(root: &Path) -> Arc<DebuggerConfig> {
    let mut config = DebuggerConfig::new(root);
    config.auto_open_screenshots = false;
    Arc::new(config)
}

pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    image::RgbImage::from_pixel(width, height, image::Rgb([200, 200, 200]))
        .save(path)
        .unwrap();
}

pub fn console(kind: &str, text: &str) -> PageEvent {
    PageEvent::Console {
        kind: kind.to_string(),
        text: text.to_string(),
        location: None,
        stack_trace: None,
    }
}

pub fn request(url: &str) -> PageEvent {
    PageEvent::Request {
        request_id: None,
        method: "GET".to_string(),
        url: url.to_string(),
        headers: None,
        resource_type: Some("fetch".to_string()),
    }
}

pub fn response(url: &str, status: u16) -> PageEvent {
    PageEvent::Response {
        request_id: None,
        url: url.to_string(),
        status,
        status_text: None,
        headers: None,
        timing: None,
    }
}

pub fn failure(url: &str, reason: &str) -> PageEvent {
    PageEvent::RequestFailed {
        request_id: None,
        url: url.to_string(),
        failure: reason.to_string(),
    }
}

pub fn page_error(message: &str) -> PageEvent {
    PageEvent::PageError {
        message: message.to_string(),
        stack: None,
        source: None,
        line: None,
        column: None,
    }
}
