//! Human-readable renderings of an [`AnalysisResult`].

use super::AnalysisResult;

pub fn render_markdown(result: &AnalysisResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Debug Analysis: {}\n\n", result.app_name));
    out.push_str(&format!("- **Session:** `{}`\n", result.session_id));
    out.push_str(&format!("- **Depth:** {}\n", result.depth));
    out.push_str(&format!(
        "- **Severity:** {}\n",
        result.severity.as_str().to_uppercase()
    ));
    out.push_str(&format!("- **Issues found:** {}\n\n", result.issues_found));

    let console = &result.console_analysis;
    out.push_str("## Console\n\n");
    out.push_str("| Type | Count |\n");
    out.push_str("|------|-------|\n");
    for (kind, count) in &console.by_type {
        out.push_str(&format!("| {} | {} |\n", kind, count));
    }
    out.push_str(&format!(
        "\nTotal: {} ({} errors, {} warnings)\n\n",
        console.total_logs, console.errors_count, console.warnings_count
    ));
    if !console.error_messages.is_empty() {
        out.push_str("**Error messages:**\n\n");
        for msg in &console.error_messages {
            out.push_str(&format!("- `{}`\n", msg.replace('`', "'")));
        }
        out.push('\n');
    }

    let network = &result.network_analysis;
    out.push_str("## Network\n\n");
    out.push_str(&format!(
        "{} requests, {} succeeded, {} failed (success rate {:.1}%)\n\n",
        network.total_requests,
        network.success_count,
        network.failed_count,
        network.success_rate * 100.0
    ));
    if !network.by_domain.is_empty() {
        out.push_str("| Domain | Requests |\n");
        out.push_str("|--------|----------|\n");
        for (domain, count) in &network.by_domain {
            let domain = if domain.is_empty() { "(none)" } else { domain };
            out.push_str(&format!("| {} | {} |\n", domain, count));
        }
        out.push('\n');
    }
    if !network.failed_urls.is_empty() {
        out.push_str("**Failed URLs:**\n\n");
        for url in &network.failed_urls {
            out.push_str(&format!("- {}\n", url));
        }
        out.push('\n');
    }

    let errors = &result.error_analysis;
    out.push_str("## JavaScript Errors\n\n");
    out.push_str(&format!(
        "{} total, {} unique\n\n",
        errors.total_errors, errors.unique_errors
    ));
    for msg in &errors.most_common {
        let count = errors.error_groups.get(msg).copied().unwrap_or(0);
        out.push_str(&format!("- ({}x) `{}`\n", count, msg.replace('`', "'")));
    }
    if !errors.most_common.is_empty() {
        out.push('\n');
    }

    if let Some(ref patterns) = result.patterns_detected {
        out.push_str("## Patterns\n\n");
        out.push_str(&bullet_list(patterns.iter(), "No known patterns detected"));
    }
    if let Some(ref perf) = result.performance_issues {
        out.push_str("## Performance\n\n");
        out.push_str(&bullet_list(perf.iter(), "No performance issues"));
    }
    if let Some(ref security) = result.security_concerns {
        out.push_str("## Security\n\n");
        out.push_str(&bullet_list(security.iter(), "No security concerns"));
    }
    if let Some(ref recs) = result.recommendations {
        out.push_str("## Recommendations\n\n");
        out.push_str(&bullet_list(recs.iter(), "Nothing to recommend"));
    }
    if let Some(ref fixes) = result.auto_fix_suggestions {
        if !fixes.is_empty() {
            out.push_str("## Suggested Fixes\n\n");
            for fix in fixes {
                out.push_str(&format!("### {}\n\n{}\n\n", fix.issue, fix.fix));
                out.push_str(&format!("```javascript\n{}\n```\n\n", fix.code));
            }
        }
    }

    out
}

/// Plain-text summary for terminals.
pub fn render_text(result: &AnalysisResult) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Analysis of {} (session {}, depth {})\n",
        result.app_name, result.session_id, result.depth
    ));
    out.push_str(&format!(
        "Severity: {}  Issues: {}\n",
        result.severity.as_str().to_uppercase(),
        result.issues_found
    ));
    out.push_str(&format!(
        "Console: {} logs, {} errors, {} warnings\n",
        result.console_analysis.total_logs,
        result.console_analysis.errors_count,
        result.console_analysis.warnings_count
    ));
    out.push_str(&format!(
        "Network: {} requests, {} failed, {:.1}% success\n",
        result.network_analysis.total_requests,
        result.network_analysis.failed_count,
        result.network_analysis.success_rate * 100.0
    ));
    out.push_str(&format!(
        "JS errors: {} ({} unique)\n",
        result.error_analysis.total_errors, result.error_analysis.unique_errors
    ));

    let sections: [(&str, Option<Vec<&str>>); 4] = [
        (
            "Patterns",
            result
                .patterns_detected
                .as_ref()
                .map(|v| v.iter().map(String::as_str).collect()),
        ),
        (
            "Performance",
            result
                .performance_issues
                .as_ref()
                .map(|v| v.iter().map(String::as_str).collect()),
        ),
        (
            "Security",
            result
                .security_concerns
                .as_ref()
                .map(|v| v.iter().map(String::as_str).collect()),
        ),
        (
            "Recommendations",
            result
                .recommendations
                .as_ref()
                .map(|v| v.iter().map(String::as_str).collect()),
        ),
    ];
    for (title, items) in sections {
        match items {
            Some(items) if !items.is_empty() => {
                out.push_str(&format!("{}:\n", title));
                for item in items {
                    out.push_str(&format!("  - {}\n", item));
                }
            }
            Some(_) => out.push_str(&format!("{}: none\n", title)),
            None => {}
        }
    }
    out
}

fn bullet_list<'a>(items: impl Iterator<Item = &'a String>, empty: &str) -> String {
    let mut out = String::new();
    for item in items {
        out.push_str(&format!("- {}\n", item));
    }
    if out.is_empty() {
        out.push_str(&format!("_{}_\n", empty));
    }
    out.push('\n');
    out
}
