//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `address_intel` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - Ctrl-C cancellation
//! - Export and user-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::process;

use tokio_util::sync::CancellationToken;

use address_intel::export::{export_csv, export_json};
use address_intel::initialization::init_logger_with;
use address_intel::{enrich_batch, Opt, ProgressTracker};

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::parse();

    let log_level = opt.log_level.clone();
    let log_format = opt.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    let config = opt.to_config();

    if opt.no_resume {
        ProgressTracker::clear(&config.progress_path)
            .context("Failed to discard previous progress")?;
    }

    // First Ctrl-C cancels the run gracefully; a second one aborts
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupt received, finishing in-flight lookups");
            signal_cancel.cancel();
        }
        if tokio::signal::ctrl_c().await.is_ok() {
            process::exit(130);
        }
    });

    match enrich_batch(config, cancel).await {
        Ok(mut report) => {
            let exported_at = Utc::now();
            for record in &mut report.records {
                record.exported_at = Some(exported_at);
            }

            let (csv_path, json_path) = match (&opt.export_csv, &opt.export_json) {
                (None, None) => {
                    std::fs::create_dir_all(&opt.results_dir).with_context(|| {
                        format!(
                            "Failed to create results directory {}",
                            opt.results_dir.display()
                        )
                    })?;
                    (
                        Some(opt.results_dir.join("addresses.csv")),
                        Some(opt.results_dir.join("addresses.json")),
                    )
                }
                (csv, json) => (csv.clone(), json.clone()),
            };

            if let Some(path) = &csv_path {
                let rows = export_csv(&report.records, path)?;
                println!("Exported {} records to {}", rows, path.display());
            }
            if let Some(path) = &json_path {
                let rows = export_json(&report.records, path)?;
                println!("Exported {} records to {}", rows, path.display());
            }

            println!(
                "✅ Processed {} address{} ({} enriched, {} from cache, {} failed{}) in {:.1}s",
                report.total_addresses,
                if report.total_addresses == 1 { "" } else { "es" },
                report.enriched,
                report.cache_hits,
                report.failed,
                if report.cancelled { ", cancelled" } else { "" },
                report.elapsed_seconds
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("address_intel error: {:#}", e);
            process::exit(1);
        }
    }
}
