mod common;

use common::*;
use std::time::Duration;
use tempfile::TempDir;

use page_debugger::analyzer::Severity;
use page_debugger::error::DebuggerError;
use page_debugger::monitor::Monitor;

#[tokio::test]
async fn test_unknown_app_is_rejected_before_any_round() {
    let dir = TempDir::new().unwrap();
    let fake = FakeLauncher::new(Script::default());
    let monitor = Monitor::new(test_config(dir.path()));

    let err = monitor
        .run(
            fake.shared(),
            &["web-app".to_string(), "billing".to_string()],
            Some(1),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DebuggerError::UnknownApp(ref n) if n == "billing"));
    assert_eq!(fake.with_calls(|c| c.launches.len()), 0);
}

#[tokio::test]
async fn test_rounds_fan_out_one_session_per_app() {
    let dir = TempDir::new().unwrap();
    let fake = FakeLauncher::new(Script {
        navigation_events: vec![
            console("error", "boom"),
            request("http://localhost/api"),
            failure("http://localhost/api", "net::ERR_CONNECTION_REFUSED"),
        ],
        ..Default::default()
    });
    let monitor = Monitor::new(test_config(dir.path()))
        .with_interval(Duration::from_millis(10))
        .with_capture_window(Duration::from_millis(10));

    let apps = vec!["web-app".to_string(), "doctors".to_string()];
    let rounds = monitor.run(fake.shared(), &apps, Some(2)).await.unwrap();

    assert_eq!(rounds.len(), 2);
    for (i, round) in rounds.iter().enumerate() {
        assert_eq!(round.run, i as u32 + 1);
        let names: Vec<&str> = round.checks.iter().map(|c| c.app_name.as_str()).collect();
        assert_eq!(names, vec!["web-app", "doctors"]);
        for check in &round.checks {
            assert!(check.error.is_none());
            assert_eq!(check.issues_found, 2);
            assert_eq!(check.severity, Severity::Low);
            assert!(check.session_file.as_ref().unwrap().exists());
            assert!(!check.is_ok());
        }
    }

    fake.with_calls(|c| {
        assert_eq!(c.launches.len(), 4);
        assert!(c.launches.iter().all(|l| l.headless));
        assert_eq!(c.browsers_closed, 4);
        assert!(c.gotos.iter().any(|(url, _)| url == "http://localhost:3001"));
    });
}

#[tokio::test]
async fn test_failing_app_does_not_stop_the_round() {
    let dir = TempDir::new().unwrap();
    let fake = FakeLauncher::new(Script {
        fail_launch: true,
        ..Default::default()
    });
    let monitor = Monitor::new(test_config(dir.path())).with_capture_window(Duration::ZERO);

    let apps = vec!["patients".to_string(), "admin".to_string()];
    let rounds = monitor.run(fake.shared(), &apps, Some(1)).await.unwrap();

    assert_eq!(rounds[0].checks.len(), 2);
    for check in &rounds[0].checks {
        assert!(check.error.as_deref().unwrap().contains("executable not found"));
        assert!(check.session_file.is_some());
    }
}

#[tokio::test]
async fn test_panicking_app_is_reported_and_round_completes() {
    let dir = TempDir::new().unwrap();
    let fake = FakeLauncher::new(Script {
        navigation_events: vec![console("error", "boom")],
        goto_panic_on: Some(":3004".to_string()),
        ..Default::default()
    });
    let monitor = Monitor::new(test_config(dir.path())).with_capture_window(Duration::ZERO);

    let apps = vec!["patients".to_string(), "admin".to_string()];
    let rounds = monitor.run(fake.shared(), &apps, Some(1)).await.unwrap();

    let checks = &rounds[0].checks;
    assert_eq!(checks.len(), 2);

    let patients = &checks[0];
    assert_eq!(patients.app_name, "patients");
    assert!(patients.error.is_none());
    assert_eq!(patients.issues_found, 1);

    let admin = &checks[1];
    assert_eq!(admin.app_name, "admin");
    assert!(admin.error.as_deref().unwrap().contains("driver bug"));
    // Events emitted before the panic were still saved and analyzed
    assert_eq!(admin.issues_found, 1);
    assert!(admin.session_file.as_ref().unwrap().exists());

    fake.with_calls(|c| {
        assert_eq!(c.pages_closed, 2);
        assert_eq!(c.browsers_closed, 2);
    });
}
