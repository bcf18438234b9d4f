//! Captured telemetry records and the per-session aggregate.
//!
//! Every collection on [`DebugSessionData`] only grows; the one in-place
//! mutation is resolving a pending [`NetworkRequest`] with its response or
//! failure. Once `ended_at` is set the aggregate is frozen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub type Headers = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleType {
    Log,
    Error,
    Warning,
    Info,
    Debug,
    #[serde(other)]
    Other,
}

impl ConsoleType {
    /// Map a browser-reported console type onto the recorded set.
    ///
    /// `assert` and `trace` are not folded into `error`/`debug`; they land in
    /// `Other` so error counts only reflect `console.error`.
    pub fn from_browser(kind: &str) -> Self {
        match kind.to_ascii_lowercase().as_str() {
            "log" => ConsoleType::Log,
            "error" => ConsoleType::Error,
            "warning" | "warn" => ConsoleType::Warning,
            "info" => ConsoleType::Info,
            "debug" => ConsoleType::Debug,
            _ => ConsoleType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsoleType::Log => "log",
            ConsoleType::Error => "error",
            ConsoleType::Warning => "warning",
            ConsoleType::Info => "info",
            ConsoleType::Debug => "debug",
            ConsoleType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleLog {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ConsoleType,
    pub text: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub stack_trace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkRequest {
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub status_text: Option<String>,
    #[serde(default)]
    pub timing: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub headers: Option<Headers>,
    #[serde(default)]
    pub response_headers: Option<Headers>,
    #[serde(default)]
    pub failure: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    /// Browser-assigned correlation id, when the driver exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl NetworkRequest {
    /// Neither a response nor a failure has arrived yet.
    pub fn is_pending(&self) -> bool {
        self.status.is_none() && self.failure.is_none()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some() || self.status.is_some_and(|s| s >= 400)
    }

    pub fn is_success(&self) -> bool {
        self.status.is_some_and(|s| (200..300).contains(&s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JavaScriptError {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    #[serde(default)]
    pub stack: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub column: Option<u32>,
}

/// Most recent in-page timing snapshot; all values in milliseconds except `cls`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub lcp: Option<f64>,
    #[serde(default)]
    pub fid: Option<f64>,
    #[serde(default)]
    pub cls: Option<f64>,
    #[serde(default)]
    pub ttfb: Option<f64>,
    #[serde(default)]
    pub dom_content_loaded: Option<f64>,
    #[serde(default)]
    pub load: Option<f64>,
}

/// Response fields applied to a pending request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseUpdate {
    pub status: u16,
    pub status_text: Option<String>,
    pub headers: Option<Headers>,
    pub timing: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugSessionData {
    pub session_id: String,
    pub app_name: String,
    pub url: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub console_logs: Vec<ConsoleLog>,
    #[serde(default)]
    pub network_requests: Vec<NetworkRequest>,
    #[serde(default)]
    pub javascript_errors: Vec<JavaScriptError>,
    #[serde(default)]
    pub performance_metrics: Option<PerformanceMetrics>,
    #[serde(default)]
    pub screenshots: Vec<PathBuf>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl DebugSessionData {
    pub fn new(app_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            app_name: app_name.into(),
            url: url.into(),
            started_at: Utc::now(),
            ended_at: None,
            console_logs: Vec::new(),
            network_requests: Vec::new(),
            javascript_errors: Vec::new(),
            performance_metrics: None,
            screenshots: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.ended_at.is_some()
    }

    /// Set `ended_at`. Only the first call has an effect.
    pub fn finish(&mut self) {
        if self.ended_at.is_none() {
            self.ended_at = Some(Utc::now());
        }
    }

    /// Index of the request a response or failure for `url` resolves.
    ///
    /// A known `request_id` is a direct key. Otherwise the most recently
    /// issued request for `url` that is still pending wins.
    pub fn find_pending(&self, url: &str, request_id: Option<&str>) -> Option<usize> {
        if let Some(id) = request_id {
            let mut known = false;
            for (idx, req) in self.network_requests.iter().enumerate().rev() {
                if req.request_id.as_deref() == Some(id) {
                    if req.is_pending() {
                        return Some(idx);
                    }
                    known = true;
                }
            }
            if known {
                return None;
            }
        }

        self.network_requests
            .iter()
            .rposition(|req| req.url == url && req.is_pending())
    }

    /// Resolve the matching pending request with a response. Returns false
    /// when nothing was pending for `url`.
    pub fn apply_response(
        &mut self,
        url: &str,
        request_id: Option<&str>,
        update: ResponseUpdate,
    ) -> bool {
        let Some(idx) = self.find_pending(url, request_id) else {
            return false;
        };
        let req = &mut self.network_requests[idx];
        req.status = Some(update.status);
        req.status_text = update.status_text;
        req.response_headers = update.headers;
        if update.timing.is_some() {
            req.timing = update.timing;
        }
        true
    }

    /// Resolve the matching pending request with a failure reason.
    pub fn apply_failure(&mut self, url: &str, request_id: Option<&str>, failure: String) -> bool {
        let Some(idx) = self.find_pending(url, request_id) else {
            return false;
        };
        self.network_requests[idx].failure = Some(failure);
        true
    }

    pub fn failed_requests(&self) -> Vec<&NetworkRequest> {
        self.network_requests.iter().filter(|r| r.is_failed()).collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str) -> NetworkRequest {
        NetworkRequest {
            timestamp: Utc::now(),
            method: "GET".to_string(),
            url: url.to_string(),
            status: None,
            status_text: None,
            timing: None,
            headers: None,
            response_headers: None,
            failure: None,
            resource_type: None,
            request_id: None,
        }
    }

    fn ok(status: u16) -> ResponseUpdate {
        ResponseUpdate {
            status,
            ..Default::default()
        }
    }

    #[test]
    fn test_response_resolves_most_recent_pending() {
        let mut data = DebugSessionData::new("app", "http://localhost");
        data.network_requests.push(request("http://a/x"));
        data.network_requests.push(request("http://b/y"));
        data.network_requests.push(request("http://a/x"));

        assert!(data.apply_response("http://a/x", None, ok(200)));
        assert_eq!(data.network_requests[2].status, Some(200));
        assert!(data.network_requests[0].status.is_none());
        assert!(data.network_requests[1].status.is_none());

        assert!(data.apply_response("http://a/x", None, ok(404)));
        assert_eq!(data.network_requests[0].status, Some(404));

        // Nothing left pending for this url
        assert!(!data.apply_response("http://a/x", None, ok(500)));
        assert_eq!(data.network_requests[2].status, Some(200));
    }

    #[test]
    fn test_failure_never_overwrites_status() {
        let mut data = DebugSessionData::new("app", "http://localhost");
        data.network_requests.push(request("http://a/x"));
        assert!(data.apply_response("http://a/x", None, ok(200)));
        assert!(!data.apply_failure("http://a/x", None, "net::ERR_ABORTED".into()));
        assert!(data.network_requests[0].failure.is_none());
    }

    #[test]
    fn test_status_never_overwrites_failure() {
        let mut data = DebugSessionData::new("app", "http://localhost");
        data.network_requests.push(request("http://a/x"));
        data.network_requests.push(request("http://a/x"));
        assert!(data.apply_failure("http://a/x", None, "net::ERR_FAILED".into()));
        assert_eq!(data.network_requests[1].failure.as_deref(), Some("net::ERR_FAILED"));

        // The failed record is skipped; the older pending one is resolved
        assert!(data.apply_response("http://a/x", None, ok(200)));
        assert_eq!(data.network_requests[0].status, Some(200));
        assert!(data.network_requests[1].status.is_none());
    }

    #[test]
    fn test_request_id_is_a_direct_key() {
        let mut data = DebugSessionData::new("app", "http://localhost");
        let mut first = request("http://a/x");
        first.request_id = Some("1".into());
        let mut second = request("http://a/x");
        second.request_id = Some("2".into());
        data.network_requests.push(first);
        data.network_requests.push(second);

        assert!(data.apply_response("http://a/x", Some("1"), ok(201)));
        assert_eq!(data.network_requests[0].status, Some(201));
        assert!(data.network_requests[1].is_pending());

        // Already resolved id is not re-applied elsewhere
        assert!(!data.apply_response("http://a/x", Some("1"), ok(500)));
        assert!(data.network_requests[1].is_pending());
    }

    #[test]
    fn test_unknown_request_id_falls_back_to_url_scan() {
        let mut data = DebugSessionData::new("app", "http://localhost");
        data.network_requests.push(request("http://a/x"));
        assert!(data.apply_response("http://a/x", Some("zzz"), ok(204)));
        assert_eq!(data.network_requests[0].status, Some(204));
    }

    #[test]
    fn test_failed_requests_filter() {
        let mut data = DebugSessionData::new("app", "http://localhost");
        for url in ["http://a/1", "http://a/2", "http://a/3", "http://a/4"] {
            data.network_requests.push(request(url));
        }
        data.apply_response("http://a/1", None, ok(200));
        data.apply_response("http://a/2", None, ok(503));
        data.apply_failure("http://a/3", None, "net::ERR_TIMED_OUT".into());

        let failed: Vec<&str> = data.failed_requests().iter().map(|r| r.url.as_str()).collect();
        assert_eq!(failed, vec!["http://a/2", "http://a/3"]);
    }

    #[test]
    fn test_finish_is_set_once() {
        let mut data = DebugSessionData::new("app", "http://localhost");
        assert!(!data.is_finished());
        data.finish();
        let first = data.ended_at;
        data.finish();
        assert_eq!(data.ended_at, first);
    }

    #[test]
    fn test_console_type_from_browser() {
        assert_eq!(ConsoleType::from_browser("warning"), ConsoleType::Warning);
        assert_eq!(ConsoleType::from_browser("warn"), ConsoleType::Warning);
        assert_eq!(ConsoleType::from_browser("ERROR"), ConsoleType::Error);
        assert_eq!(ConsoleType::from_browser("table"), ConsoleType::Other);
    }

    #[test]
    fn test_assert_and_trace_are_not_errors() {
        assert_eq!(ConsoleType::from_browser("assert"), ConsoleType::Other);
        assert_eq!(ConsoleType::from_browser("trace"), ConsoleType::Other);
    }

    #[test]
    fn test_missing_collections_default_to_empty() {
        let json = r#"{
            "session_id": "abc",
            "app_name": "web-app",
            "url": "http://localhost:3000",
            "started_at": "2025-01-01T00:00:00Z"
        }"#;
        let data = DebugSessionData::from_json(json).unwrap();
        assert!(data.console_logs.is_empty());
        assert!(data.network_requests.is_empty());
        assert!(data.performance_metrics.is_none());
        assert!(data.ended_at.is_none());
    }
}
