use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Arc, LazyLock};
use tracing::{info, warn};

use super::patterns::{PatternTable, ERROR_PATTERNS, SECURITY_PATTERNS};
use super::{
    AnalysisDepth, AnalysisResult, AutoFixSuggestion, ConsoleAnalysis, ErrorAnalysis,
    NetworkAnalysis, Severity,
};
use crate::config::{
    DebuggerConfig, FAILED_REQUESTS_RECOMMENDATION_THRESHOLD, HIGH_ERROR_RATE_THRESHOLD,
    HIGH_ISSUES_THRESHOLD, HIGH_PERF_ISSUES_THRESHOLD, MANY_REQUESTS_THRESHOLD, MAX_COMMON_ERRORS,
    MAX_CONSOLE_ERROR_MESSAGES, MAX_DOMAINS, MAX_FAILED_URLS, MEDIUM_ISSUES_THRESHOLD,
    MEDIUM_PERF_ISSUES_THRESHOLD, SLOW_LOAD_MS, SLOW_TTFB_MS,
};
use crate::error::DebuggerResult;
use crate::model::{ConsoleType, DebugSessionData};
use crate::storage::SessionStore;

static DIGIT_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Remediation text for detected pattern names, in output order.
const PATTERN_RECOMMENDATIONS: &[(&str, &str)] = &[
    ("cors", "Configure CORS headers correctly on the server"),
    ("auth", "Verify authentication configuration"),
    ("supabase", "Review Supabase configuration and queries"),
];

// (pattern, issue, fix, code)
const AUTO_FIXES: &[(&str, &str, &str, &str)] = &[
    (
        "cors",
        "CORS Error",
        "Add CORS headers on the server",
        "// Next.js middleware or headers config
headers: [
  {
    key: 'Access-Control-Allow-Origin',
    value: process.env.NEXT_PUBLIC_APP_URL,
  },
]",
    ),
    (
        "auth",
        "Authentication Error",
        "Verify Supabase client initialization",
        "// Make sure NEXT_PUBLIC_SUPABASE_* is configured
const supabase = createClient(
  process.env.NEXT_PUBLIC_SUPABASE_URL!,
  process.env.NEXT_PUBLIC_SUPABASE_ANON_KEY!
)",
    ),
];

/// Which optional passes are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub pattern_detection: bool,
    pub auto_fix_suggestions: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            pattern_detection: true,
            auto_fix_suggestions: true,
        }
    }
}

impl AnalysisOptions {
    pub fn from_config(config: &DebuggerConfig) -> Self {
        Self {
            pattern_detection: config.pattern_detection,
            auto_fix_suggestions: config.auto_fix_suggestions,
        }
    }
}

/// Runs the pass pipeline over one finalized session.
///
/// `analyze` is a pure function of the session data, the options and the
/// depth; the analyzer can be run any number of times.
pub struct Analyzer {
    data: DebugSessionData,
    options: AnalysisOptions,
    error_patterns: Arc<PatternTable>,
    security_patterns: Arc<PatternTable>,
}

impl Analyzer {
    pub fn new(data: DebugSessionData) -> Self {
        Self {
            data,
            options: AnalysisOptions::default(),
            error_patterns: ERROR_PATTERNS.clone(),
            security_patterns: SECURITY_PATTERNS.clone(),
        }
    }

    /// Rebuild the session from its persisted document.
    pub fn from_file(path: &Path) -> DebuggerResult<Self> {
        Ok(Self::new(SessionStore::load_file(path)?))
    }

    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_patterns(mut self, errors: Arc<PatternTable>, security: Arc<PatternTable>) -> Self {
        self.error_patterns = errors;
        self.security_patterns = security;
        self
    }

    pub fn data(&self) -> &DebugSessionData {
        &self.data
    }

    pub fn analyze(&self, depth: AnalysisDepth) -> AnalysisResult {
        let short_id: String = self.data.session_id.chars().take(8).collect();
        info!("Analyzing session {} (depth: {})", short_id, depth);

        let console_analysis = analyze_console(&self.data);
        let network_analysis = analyze_network(&self.data);
        let error_analysis = analyze_errors(&self.data);
        let issues_found = console_analysis.errors_count
            + network_analysis.failed_count
            + error_analysis.total_errors;

        info!(
            "Console: {} logs ({} errors, {} warnings)",
            console_analysis.total_logs,
            console_analysis.errors_count,
            console_analysis.warnings_count
        );
        info!(
            "Network: {} requests ({} failed)",
            network_analysis.total_requests, network_analysis.failed_count
        );
        info!(
            "JS errors: {} total ({} unique)",
            error_analysis.total_errors, error_analysis.unique_errors
        );

        let mut result = AnalysisResult {
            session_id: self.data.session_id.clone(),
            app_name: self.data.app_name.clone(),
            depth,
            severity: Severity::Low,
            issues_found,
            console_analysis,
            network_analysis,
            error_analysis,
            patterns_detected: None,
            performance_issues: None,
            security_concerns: None,
            recommendations: None,
            auto_fix_suggestions: None,
        };

        if depth >= AnalysisDepth::Standard {
            if self.options.pattern_detection {
                let patterns = detect_patterns(&self.data, &self.error_patterns);
                if !patterns.is_empty() {
                    info!("Patterns detected: {}", patterns.join(", "));
                }
                result.patterns_detected = Some(patterns);
            }

            let perf = analyze_performance(&self.data);
            if !perf.is_empty() {
                warn!("Performance issues: {}", perf.len());
            }
            result.performance_issues = Some(perf);
        }

        if depth >= AnalysisDepth::Deep {
            let concerns = detect_security_concerns(&self.data, &self.security_patterns);
            if !concerns.is_empty() {
                warn!("Security concerns: {}", concerns.len());
            }
            result.security_concerns = Some(concerns);
            result.recommendations = Some(generate_recommendations(&result));
            if self.options.auto_fix_suggestions {
                result.auto_fix_suggestions = Some(generate_auto_fixes(&result));
            }
        }

        result.severity = compute_severity(
            result.issues_found,
            result.security_concern_count(),
            result.performance_issue_count(),
        );

        info!(
            "Analysis complete: {} issues found, severity {}",
            result.issues_found, result.severity
        );
        result
    }
}

/// Security dominates; then issue and performance-finding counts.
pub fn compute_severity(issues_found: usize, security_concerns: usize, perf_issues: usize) -> Severity {
    if security_concerns > 0 {
        Severity::Critical
    } else if issues_found > HIGH_ISSUES_THRESHOLD || perf_issues > HIGH_PERF_ISSUES_THRESHOLD {
        Severity::High
    } else if issues_found > MEDIUM_ISSUES_THRESHOLD || perf_issues > MEDIUM_PERF_ISSUES_THRESHOLD {
        Severity::Medium
    } else {
        Severity::Low
    }
}

fn analyze_console(data: &DebugSessionData) -> ConsoleAnalysis {
    let logs = &data.console_logs;
    let mut by_type = BTreeMap::new();
    for log in logs {
        *by_type.entry(log.kind.as_str().to_string()).or_insert(0) += 1;
    }

    let errors: Vec<&str> = logs
        .iter()
        .filter(|l| l.kind == ConsoleType::Error)
        .map(|l| l.text.as_str())
        .collect();
    let warnings_count = logs.iter().filter(|l| l.kind == ConsoleType::Warning).count();

    ConsoleAnalysis {
        total_logs: logs.len(),
        by_type,
        warnings_count,
        errors_count: errors.len(),
        error_messages: errors
            .iter()
            .take(MAX_CONSOLE_ERROR_MESSAGES)
            .map(|t| t.to_string())
            .collect(),
    }
}

fn analyze_network(data: &DebugSessionData) -> NetworkAnalysis {
    let requests = &data.network_requests;
    let total = requests.len();
    let failed: Vec<&str> = requests
        .iter()
        .filter(|r| r.is_failed())
        .map(|r| r.url.as_str())
        .collect();
    let success_count = requests.iter().filter(|r| r.is_success()).count();

    let mut domains: HashMap<String, usize> = HashMap::new();
    for req in requests {
        *domains.entry(extract_domain(&req.url)).or_insert(0) += 1;
    }
    let mut ranked: Vec<(String, usize)> = domains.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(MAX_DOMAINS);

    NetworkAnalysis {
        total_requests: total,
        success_count,
        failed_count: failed.len(),
        success_rate: if total > 0 {
            success_count as f64 / total as f64
        } else {
            0.0
        },
        by_domain: ranked.into_iter().collect(),
        failed_urls: failed
            .iter()
            .take(MAX_FAILED_URLS)
            .map(|u| u.to_string())
            .collect(),
    }
}

fn analyze_errors(data: &DebugSessionData) -> ErrorAnalysis {
    let errors = &data.javascript_errors;

    // (normalized message, count), in order of first appearance
    let mut groups: Vec<(String, usize)> = Vec::new();
    for error in errors {
        let normalized = normalize_message(&error.message);
        match groups.iter_mut().find(|(msg, _)| *msg == normalized) {
            Some((_, count)) => *count += 1,
            None => groups.push((normalized, 1)),
        }
    }

    let mut ranked = groups.clone();
    // Stable sort keeps first-appearance order among equal counts
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    ErrorAnalysis {
        total_errors: errors.len(),
        unique_errors: groups.len(),
        most_common: ranked
            .into_iter()
            .take(MAX_COMMON_ERRORS)
            .map(|(msg, _)| msg)
            .collect(),
        error_groups: groups.into_iter().collect(),
    }
}

fn detect_patterns(data: &DebugSessionData, table: &PatternTable) -> Vec<String> {
    let mut corpus = String::new();
    let texts = data
        .console_logs
        .iter()
        .map(|l| l.text.as_str())
        .chain(data.javascript_errors.iter().map(|e| e.message.as_str()))
        .chain(data.network_requests.iter().map(|r| r.url.as_str()));
    for text in texts {
        corpus.push(' ');
        corpus.push_str(text);
    }
    table.matching_names(&corpus)
}

fn analyze_performance(data: &DebugSessionData) -> Vec<String> {
    let mut issues = Vec::new();
    let requests = &data.network_requests;

    if requests.len() > MANY_REQUESTS_THRESHOLD {
        issues.push(format!("Too many network requests: {}", requests.len()));
    }

    let failed = requests.iter().filter(|r| r.is_failed()).count();
    if !requests.is_empty() && failed as f64 / requests.len() as f64 > HIGH_ERROR_RATE_THRESHOLD {
        issues.push(format!(
            "High request error rate: {}/{}",
            failed,
            requests.len()
        ));
    }

    if let Some(ref metrics) = data.performance_metrics {
        if let Some(load) = metrics.load.filter(|l| *l > SLOW_LOAD_MS) {
            issues.push(format!("High load time: {}ms", load));
        }
        if let Some(ttfb) = metrics.ttfb.filter(|t| *t > SLOW_TTFB_MS) {
            issues.push(format!("High TTFB: {}ms", ttfb));
        }
    }

    issues
}

fn detect_security_concerns(data: &DebugSessionData, table: &PatternTable) -> BTreeSet<String> {
    let mut concerns = BTreeSet::new();
    for pattern in table.iter() {
        if data
            .network_requests
            .iter()
            .any(|r| pattern.regex.is_match(&r.url))
        {
            concerns.insert(format!("{} detected in URL", pattern.name));
        }
        if data
            .console_logs
            .iter()
            .any(|l| pattern.regex.is_match(&l.text))
        {
            concerns.insert(format!("{} detected in console logs", pattern.name));
        }
    }
    concerns
}

fn generate_recommendations(result: &AnalysisResult) -> Vec<String> {
    let mut recs = Vec::new();

    if result.console_analysis.errors_count > 0 {
        recs.push("Resolve console errors before deployment".to_string());
    }
    if result.network_analysis.failed_count > FAILED_REQUESTS_RECOMMENDATION_THRESHOLD {
        recs.push("Investigate failed requests - possible API problem".to_string());
    }
    for (pattern, text) in PATTERN_RECOMMENDATIONS {
        if result.has_pattern(pattern) {
            recs.push(text.to_string());
        }
    }
    if result.performance_issue_count() > 0 {
        recs.push("Optimize performance: reduce requests, improve caching".to_string());
    }
    if result.security_concern_count() > 0 {
        recs.push("URGENT: Review detected security concerns".to_string());
    }

    recs
}

fn generate_auto_fixes(result: &AnalysisResult) -> Vec<AutoFixSuggestion> {
    AUTO_FIXES
        .iter()
        .filter(|(pattern, ..)| result.has_pattern(pattern))
        .map(|(_, issue, fix, code)| AutoFixSuggestion {
            issue: issue.to_string(),
            fix: fix.to_string(),
            code: code.to_string(),
        })
        .collect()
}

fn normalize_message(message: &str) -> String {
    DIGIT_RUNS.replace_all(message, "N").into_owned()
}

/// Host (and explicit port) of a URL; empty for host-less URLs.
fn extract_domain(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(u) => match (u.host_str(), u.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        },
        Err(_) => "unknown".to_string(),
    }
}
