pub mod engine;
pub mod patterns;
pub mod report;

pub use engine::{compute_severity, AnalysisOptions, Analyzer};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::DebuggerError;

// ============================================================================
// Depth and severity
// ============================================================================

/// Which passes run. Each level runs every pass of the level below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisDepth {
    Quick,
    Standard,
    Deep,
}

impl AnalysisDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisDepth::Quick => "quick",
            AnalysisDepth::Standard => "standard",
            AnalysisDepth::Deep => "deep",
        }
    }
}

impl fmt::Display for AnalysisDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisDepth {
    type Err = DebuggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quick" => Ok(AnalysisDepth::Quick),
            "standard" => Ok(AnalysisDepth::Standard),
            "deep" => Ok(AnalysisDepth::Deep),
            other => Err(DebuggerError::InvalidDepth(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Pass outputs
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsoleAnalysis {
    pub total_logs: usize,
    pub by_type: BTreeMap<String, usize>,
    pub warnings_count: usize,
    pub errors_count: usize,
    /// Earliest error texts, verbatim.
    pub error_messages: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkAnalysis {
    pub total_requests: usize,
    pub success_count: usize,
    pub failed_count: usize,
    /// successes / total, 0 when there were no requests.
    pub success_rate: f64,
    pub by_domain: BTreeMap<String, usize>,
    pub failed_urls: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorAnalysis {
    pub total_errors: usize,
    pub unique_errors: usize,
    /// Normalized message (digit runs replaced by `N`) -> occurrences.
    pub error_groups: BTreeMap<String, usize>,
    pub most_common: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoFixSuggestion {
    pub issue: String,
    pub fix: String,
    pub code: String,
}

/// Output of one analyzer run. Fields of passes that did not run stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub session_id: String,
    pub app_name: String,
    pub depth: AnalysisDepth,
    pub severity: Severity,
    pub issues_found: usize,
    pub console_analysis: ConsoleAnalysis,
    pub network_analysis: NetworkAnalysis,
    pub error_analysis: ErrorAnalysis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns_detected: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_issues: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_concerns: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_fix_suggestions: Option<Vec<AutoFixSuggestion>>,
}

impl AnalysisResult {
    pub fn has_pattern(&self, name: &str) -> bool {
        self.patterns_detected
            .as_ref()
            .is_some_and(|p| p.iter().any(|n| n == name))
    }

    pub fn performance_issue_count(&self) -> usize {
        self.performance_issues.as_ref().map_or(0, Vec::len)
    }

    pub fn security_concern_count(&self) -> usize {
        self.security_concerns.as_ref().map_or(0, BTreeSet::len)
    }

    /// Names of the result fields the run populated.
    pub fn populated_fields(&self) -> Vec<&'static str> {
        let mut fields = vec![
            "session_id",
            "app_name",
            "severity",
            "issues_found",
            "console_analysis",
            "network_analysis",
            "error_analysis",
        ];
        if self.patterns_detected.is_some() {
            fields.push("patterns_detected");
        }
        if self.performance_issues.is_some() {
            fields.push("performance_issues");
        }
        if self.security_concerns.is_some() {
            fields.push("security_concerns");
        }
        if self.recommendations.is_some() {
            fields.push("recommendations");
        }
        if self.auto_fix_suggestions.is_some() {
            fields.push("auto_fix_suggestions");
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_parse_and_order() {
        assert_eq!("quick".parse::<AnalysisDepth>().unwrap(), AnalysisDepth::Quick);
        assert_eq!(" Deep ".parse::<AnalysisDepth>().unwrap(), AnalysisDepth::Deep);
        assert!(AnalysisDepth::Quick < AnalysisDepth::Standard);
        assert!(AnalysisDepth::Standard < AnalysisDepth::Deep);

        let err = "thorough".parse::<AnalysisDepth>().unwrap_err();
        assert!(matches!(err, DebuggerError::InvalidDepth(ref d) if d == "thorough"));
        assert!(err.is_configuration_fault());
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "\"critical\"");
        assert!(Severity::Critical > Severity::High);
    }
}
