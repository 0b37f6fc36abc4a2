//! `publish` command implementation.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use contracts::{Collect, Reduxer};
use indexing::MeiliClient;
use publish::{DispatchReport, MetricsSnapshot, Orchestrator, Outcome, Pacing, PublishContext};

use super::load_options;
use crate::cli::PublishArgs;
use crate::error::CliError;

/// Execute the `publish` command
pub async fn run_publish(args: &PublishArgs) -> Result<()> {
    let options = load_options(args.config.as_deref())?;
    let cols: Vec<Collect> = read_json("records", &args.records)?;
    if cols.is_empty() {
        anyhow::bail!("No archive results in {}", args.records.display());
    }

    print_collects(&cols);

    let mut ctx = PublishContext::new();
    if let Some(ref path) = args.bundle {
        let reduxer: Reduxer = read_json("bundle", path)?;
        info!(entries = reduxer.len(), "Bundle loaded");
        ctx = ctx.with_reduxer(Arc::new(reduxer));
    }
    if args.timeout > 0 {
        ctx = ctx.with_timeout(Duration::from_secs(args.timeout));
    }

    let mut orchestrator = Orchestrator::new(options.clone());
    if args.no_pacing {
        orchestrator = orchestrator.with_pacing(Pacing::disabled());
    }
    if let Some(ref meili) = options.meili {
        if options.enabled_meilisearch() {
            let client = MeiliClient::from_options(meili).map_err(CliError::from)?;
            orchestrator = orchestrator.with_indexer(client);
        }
    }

    // Cancel outstanding deliveries on Ctrl+C
    let signal_ctx = ctx.clone();
    let signal = tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Received shutdown signal, cancelling publish...");
        signal_ctx.cancel();
    });

    let report = orchestrator
        .to(&ctx, &cols, std::slice::from_ref(&args.from))
        .await;
    signal.abort();

    print!("{}", format_report(&report, &orchestrator.metrics()));
    info!(
        delivered = report.delivered().count(),
        failed = report.failed().count(),
        "Publish finished"
    );
    Ok(())
}

fn read_json<T: DeserializeOwned>(what: &'static str, path: &Path) -> Result<T> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| CliError::input(what, path.display().to_string(), e.to_string()))?
    };

    let value = serde_json::from_str(&content)
        .map_err(|e| CliError::input(what, path.display().to_string(), e.to_string()))?;
    Ok(value)
}

/// `[slot]` header, then `source => destination`
fn format_collects(cols: &[Collect]) -> String {
    let mut out = String::new();
    for col in cols {
        let dest = if col.is_archived() {
            col.destination.as_str()
        } else {
            "-"
        };
        out.push_str(&format!("[{}]\n{} => {}\n\n", col.slot.display_name(), col.source, dest));
    }
    out
}

fn print_collects(cols: &[Collect]) {
    print!("{}", format_collects(cols));
}

/// Outcome per destination, then its counters
fn format_report(report: &DispatchReport, metrics: &[(String, MetricsSnapshot)]) -> String {
    let mut out = String::from("=== Publish Summary ===\n\n");
    for (name, outcome) in &report.outcomes {
        let mark = match outcome {
            Outcome::Delivered => "✓",
            Outcome::Skipped => "-",
            Outcome::Failed(_) => "✗",
        };
        out.push_str(&format!("  {mark} {name}: {outcome}\n"));
        if let Some((_, m)) = metrics.iter().find(|(n, _)| n == name) {
            out.push_str(&format!(
                "      attempts={} delivered={} failed={} cancelled={} skipped={}\n",
                m.attempts, m.delivered, m.failed, m.cancelled, m.skipped
            ));
        }
    }
    if let Some(ref index) = report.index {
        out.push_str(&format!("\n  search index: {index}\n"));
    }
    out.push('\n');
    out
}

/// Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Slot;
    use std::io::Write;

    #[test]
    fn test_format_collects() {
        let cols = vec![
            Collect::new("https://example.com", "https://web.archive.org/x", Slot::Ia),
            Collect::new("https://example.com", "", Slot::Ph),
        ];
        assert_eq!(
            format_collects(&cols),
            "[Internet Archive]\nhttps://example.com => https://web.archive.org/x\n\n\
             [Telegraph]\nhttps://example.com => -\n\n"
        );
    }

    #[test]
    fn test_report_includes_destination_counters() {
        let report = DispatchReport {
            outcomes: vec![
                ("github".to_string(), Outcome::Skipped),
                ("nostr".to_string(), Outcome::Failed("relay down".to_string())),
            ],
            index: None,
        };
        let metrics = vec![
            (
                "github".to_string(),
                MetricsSnapshot {
                    skipped: 1,
                    ..MetricsSnapshot::default()
                },
            ),
            (
                "nostr".to_string(),
                MetricsSnapshot {
                    attempts: 1,
                    failed: 1,
                    ..MetricsSnapshot::default()
                },
            ),
        ];

        let text = format_report(&report, &metrics);
        assert!(text.contains("✗ nostr: failed: relay down"));
        assert!(text.contains("attempts=1 delivered=0 failed=1 cancelled=0 skipped=0"));
        assert!(text.contains("attempts=0 delivered=0 failed=0 cancelled=0 skipped=1"));
        assert!(!text.contains("search index"));
    }

    #[test]
    fn test_read_records_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"[{"source":"https://example.com","destination":"https://archive.ph/x","slot":"is"}]"#,
        )
        .unwrap();

        let cols: Vec<Collect> = read_json("records", file.path()).unwrap();
        assert_eq!(cols.len(), 1);
        assert_eq!(cols[0].slot, Slot::Is);
    }

    #[test]
    fn test_read_malformed_records() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();

        let err = read_json::<Vec<Collect>>("records", file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to read records"));
    }
}
