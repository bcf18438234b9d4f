mod common;

use common::*;
use std::time::Duration;
use tempfile::TempDir;

use page_debugger::analyzer::AnalysisDepth;
use page_debugger::error::DebuggerError;
use page_debugger::runner::{DebugRun, DebugRunOptions};

fn quick_options(run: &DebugRun) -> DebugRunOptions {
    DebugRunOptions {
        capture_window: Duration::ZERO,
        ..run.options().clone()
    }
}

#[tokio::test]
async fn test_debug_run_captures_screenshots_and_saves_analysis() {
    let dir = TempDir::new().unwrap();
    let fake = FakeLauncher::new(Script {
        navigation_events: vec![
            console("error", "Failed to fetch"),
            request("http://localhost:3001/api/appointments"),
            response("http://localhost:3001/api/appointments", 500),
        ],
        metrics: serde_json::json!({"load": 800.0, "ttfb": 40.0}),
        ..Default::default()
    });
    let run = DebugRun::new(test_config(dir.path()));
    let opts = quick_options(&run);
    let run = run.with_options(opts);

    let report = run.run_app(fake.shared(), "doctors").await.unwrap();

    assert!(report.navigated);
    assert!(report.error.is_none());
    assert_eq!(report.url, "http://localhost:3001");

    let prefix = format!("doctors_{}", &report.session_id[..8]);
    let names: Vec<String> = report
        .screenshots
        .iter()
        .map(|m| m.filepath.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            format!("{}_initial.png", prefix),
            format!("{}_final.png", prefix)
        ]
    );
    assert!(report
        .screenshots
        .iter()
        .all(|m| m.session_id == report.session_id && (m.width, m.height) == (16, 9)));
    assert_eq!(report.summary.screenshots, 2);
    assert_eq!(report.summary.failed_requests, 1);

    let analysis = report.analysis.as_ref().unwrap();
    assert_eq!(analysis.depth, AnalysisDepth::Deep);
    assert_eq!(analysis.issues_found, 2);
    let analysis_file = report.analysis_file.as_ref().unwrap();
    assert!(analysis_file.ends_with(format!("analysis_{}.json", report.session_id)));
    assert!(analysis_file.exists());
    assert!(report.session_file.as_ref().unwrap().exists());

    fake.with_calls(|c| {
        assert_eq!(c.screenshots.len(), 2);
        assert_eq!(c.evaluations, 1);
        assert_eq!(c.browsers_closed, 1);
    });
}

#[tokio::test]
async fn test_debug_run_without_screenshots_or_analysis() {
    let dir = TempDir::new().unwrap();
    let fake = FakeLauncher::new(Script::default());
    let run = DebugRun::new(test_config(dir.path()));
    let options = DebugRunOptions {
        screenshots: false,
        analyze: false,
        headless: Some(true),
        slow_mo_ms: Some(0),
        ..quick_options(&run)
    };
    let run = run.with_options(options);

    let report = run
        .run(fake.shared(), "http://localhost:8080", "custom")
        .await;

    assert!(report.navigated);
    assert!(report.screenshots.is_empty());
    assert!(report.analysis.is_none());
    assert!(report.analysis_file.is_none());
    assert!(report.session_file.as_ref().unwrap().exists());
    fake.with_calls(|c| {
        assert!(c.screenshots.is_empty());
        assert!(c.launches[0].headless);
        assert_eq!(c.launches[0].slow_mo_ms, 0);
    });
}

#[tokio::test]
async fn test_debug_run_rejects_unknown_app() {
    let dir = TempDir::new().unwrap();
    let fake = FakeLauncher::new(Script::default());
    let run = DebugRun::new(test_config(dir.path()));

    let err = run.run_app(fake.shared(), "billing").await.unwrap_err();
    assert!(matches!(err, DebuggerError::UnknownApp(ref n) if n == "billing"));
    assert_eq!(fake.with_calls(|c| c.launches.len()), 0);
}

#[tokio::test]
async fn test_debug_run_survives_failed_navigation() {
    let dir = TempDir::new().unwrap();
    let fake = FakeLauncher::new(Script {
        goto_error: Some("net::ERR_CONNECTION_REFUSED".to_string()),
        ..Default::default()
    });
    let run = DebugRun::new(test_config(dir.path()));
    let opts = quick_options(&run);
    let run = run.with_options(opts);

    let report = run.run_app(fake.shared(), "web-app").await.unwrap();

    assert!(!report.navigated);
    assert!(report.error.is_none());
    assert_eq!(report.screenshots.len(), 2);
    assert!(report.analysis.is_some());
}

#[tokio::test]
async fn test_debug_run_reports_panicking_driver() {
    let dir = TempDir::new().unwrap();
    let fake = FakeLauncher::new(Script {
        navigation_events: vec![page_error("TypeError: x is undefined")],
        goto_panic_on: Some("localhost".to_string()),
        ..Default::default()
    });
    let run = DebugRun::new(test_config(dir.path()));
    let opts = quick_options(&run);
    let run = run.with_options(opts);

    let report = run.run_app(fake.shared(), "admin").await.unwrap();

    assert!(!report.navigated);
    assert!(report.error.as_deref().unwrap().contains("driver bug"));
    assert!(report.screenshots.is_empty());
    assert_eq!(report.analysis.as_ref().unwrap().issues_found, 1);
    assert!(report.session_file.as_ref().unwrap().exists());
    fake.with_calls(|c| assert_eq!(c.browsers_closed, 1));
}
