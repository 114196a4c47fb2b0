//! Reconciliation commands: a single pass, or passes on an interval.

use std::sync::Arc;
use std::time::Duration;

use console::style;
use tokio::sync::mpsc;

use autoverify::config::Settings;
use autoverify::ocr::{AzureReadClient, ReadProvider};
use autoverify::repository::{redact_url_password, DbContext};
use autoverify::services::{PassOptions, PassSummary, ReconcileEvent, ReconcileService};

fn build_service(settings: &Settings) -> anyhow::Result<ReconcileService> {
    let reconcile = settings.reconcile()?;
    let ocr = settings.ocr()?;

    let ctx = DbContext::from_url(&settings.database_url)?;
    let client = AzureReadClient::new(&ocr)?;
    tracing::info!(
        "Using {} at {} with database {}",
        client.name(),
        client.analyze_url(),
        redact_url_password(&settings.database_url)
    );

    Ok(ReconcileService::new(
        Arc::new(ctx.inspections()),
        Arc::new(client),
        reconcile,
        ocr.poll_policy(),
    ))
}

/// Run one pass.
pub async fn cmd_run(
    settings: &Settings,
    limit: Option<usize>,
    dry_run: bool,
    workers: usize,
) -> anyhow::Result<()> {
    let service = build_service(settings)?;
    if dry_run {
        println!(
            "{} Dry run: nothing will be written to the database",
            style("!").yellow()
        );
    }

    let options = PassOptions {
        limit,
        dry_run,
        workers,
    };
    run_pass(&service, options).await?;
    Ok(())
}

/// Run passes forever, sleeping `interval` seconds between them.
///
/// A pass that fails to fetch candidates is reported and retried after the
/// next sleep.
pub async fn cmd_daemon(
    settings: &Settings,
    interval: u64,
    limit: Option<usize>,
    workers: usize,
) -> anyhow::Result<()> {
    let service = build_service(settings)?;
    let options = PassOptions {
        limit,
        dry_run: false,
        workers,
    };

    println!(
        "{} Running in daemon mode (interval: {}s)",
        style("→").cyan(),
        interval
    );

    loop {
        if let Err(e) = run_pass(&service, options).await {
            tracing::error!("Pass failed: {}", e);
            println!("{} Pass failed: {}", style("✗").red(), e);
        }

        println!(
            "{} Sleeping for {}s before next pass...",
            style("→").dim(),
            interval
        );
        tokio::time::sleep(Duration::from_secs(interval)).await;
    }
}

async fn run_pass(service: &ReconcileService, options: PassOptions) -> anyhow::Result<PassSummary> {
    let (event_tx, mut event_rx) = mpsc::channel::<ReconcileEvent>(100);

    let event_handler = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            print_event(&event);
        }
    });

    let summary = service.run_pass(options, event_tx).await;

    if let Err(e) = event_handler.await {
        tracing::warn!("Event handler task failed: {}", e);
    }

    Ok(summary?)
}

fn print_event(event: &ReconcileEvent) {
    match event {
        ReconcileEvent::PassStarted { candidates } => {
            if *candidates == 0 {
                println!("{} No inspections need verification", style("!").yellow());
            } else {
                println!(
                    "{} Verifying {} inspections",
                    style("→").cyan(),
                    candidates
                );
            }
        }
        ReconcileEvent::RecordSkipped { record_id, reason } => {
            println!(
                "  {} #{} skipped: {}",
                style("○").dim(),
                record_id,
                style(reason).dim()
            );
        }
        ReconcileEvent::RecordRecorded {
            record_id,
            odo_matched,
            plate_matched,
        } => {
            let mark = |matched: bool| {
                if matched {
                    style("✓").green()
                } else {
                    style("✗").red()
                }
            };
            println!(
                "  {} #{} odometer {} plate {}",
                style("✓").green(),
                record_id,
                mark(*odo_matched),
                mark(*plate_matched)
            );
        }
        ReconcileEvent::RecordFailed { record_id, error } => {
            println!("  {} #{} failed: {}", style("✗").red(), record_id, error);
        }
        ReconcileEvent::PassComplete { summary } => {
            if summary.total() == 0 {
                return;
            }
            let mut msg = format!(
                "{} Pass complete: {} recorded ({} fully matched), {} skipped",
                style("✓").green(),
                summary.recorded,
                summary.fully_matched,
                summary.skipped
            );
            if summary.failed > 0 {
                msg.push_str(&format!(
                    ", {}",
                    style(format!("{} failed", summary.failed)).red()
                ));
            }
            println!("{}", msg);
        }
    }
}
