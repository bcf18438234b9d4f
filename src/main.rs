use anyhow::bail;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use page_debugger::analyzer::report::{render_markdown, render_text};
use page_debugger::analyzer::{AnalysisOptions, AnalysisResult, Analyzer};
use page_debugger::config::{CliArgs, Command, DebuggerConfig, ReportFormat};
use page_debugger::error::DebuggerError;
use page_debugger::storage::SessionStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let _log_guard = init_tracing(args.log_file.as_deref());

    info!("Starting page-debugger v{}", env!("CARGO_PKG_VERSION"));

    let config = DebuggerConfig::from_args(&args)?;
    config.ensure_directories()?;
    info!("Root dir: {:?}", config.root_dir);

    let store = SessionStore::new(&config);

    match args.command {
        Command::Analyze { session_id, latest } => {
            let path = resolve_session(&store, session_id.as_deref(), latest)?;
            let result = analyze(&config, &path)?;
            print!("{}", render_text(&result));
            let saved = store.save_analysis(&result, None)?;
            println!("\nAnalysis saved: {}", saved.display());
        }
        Command::Report {
            session_id,
            latest,
            format,
        } => {
            let path = resolve_session(&store, session_id.as_deref(), latest)?;
            let result = analyze(&config, &path)?;
            let saved = match format {
                ReportFormat::Json => store.save_analysis(&result, None)?,
                ReportFormat::Md => {
                    store.save_report(&result.session_id, "md", &render_markdown(&result))?
                }
                ReportFormat::Text => {
                    let text = render_text(&result);
                    print!("{}", text);
                    store.save_report(&result.session_id, "txt", &text)?
                }
            };
            println!("Report saved: {}", saved.display());
        }
        Command::Sessions => {
            let sessions = store.list()?;
            if sessions.is_empty() {
                println!("No sessions found in {}", config.data_dir.display());
                return Ok(());
            }
            println!("{:<38} {:<12} {:<20} {:>8}", "SESSION", "APP", "MODIFIED", "SIZE");
            for s in sessions {
                println!(
                    "{:<38} {:<12} {:<20} {:>5} KB",
                    s.session_id,
                    s.app_name.as_deref().unwrap_or("?"),
                    s.modified.format("%Y-%m-%d %H:%M:%S"),
                    s.size_bytes / 1024
                );
            }
        }
        Command::Cleanup { days } => {
            let stats = store.cleanup(days)?;
            println!(
                "Removed {} sessions and {} screenshots older than {} days",
                stats.sessions_removed, stats.screenshots_removed, days
            );
        }
        Command::Apps => {
            for (name, url) in &config.apps {
                println!("{:<12} {}", name, url);
            }
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// Console logging, plus a non-blocking file writer when `log_file` is set.
fn init_tracing(log_file: Option<&Path>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "page_debugger=info".into());

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| "page-debugger.log".into());
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}

fn resolve_session(
    store: &SessionStore,
    session_id: Option<&str>,
    latest: bool,
) -> anyhow::Result<PathBuf> {
    if latest {
        return Ok(store.latest()?);
    }
    let Some(id) = session_id else {
        bail!("Provide a session id or --latest");
    };
    let path = store.session_path(id);
    if !path.exists() {
        return Err(DebuggerError::SessionNotFound(id.to_string()).into());
    }
    Ok(path)
}

fn analyze(config: &DebuggerConfig, path: &Path) -> anyhow::Result<AnalysisResult> {
    let analyzer = Analyzer::from_file(path)?.with_options(AnalysisOptions::from_config(config));
    Ok(analyzer.analyze(config.analysis_depth))
}
