//! Run command implementation.
//!
//! Opens one tab per URL in a single browser, runs the navigation sessions
//! concurrently and writes every record as one JSON line. Ctrl-C cancels the
//! sessions at their next poll boundary; records extracted so far are still
//! written.

use crate::cli::RunArgs;
use crate::config::PagewalkConfig;
use crate::error::{CliError, ConfigError, Result};
use crate::ui;
use futures::future::join_all;
use pagewalk_chrome::ChromeBrowser;
use pagewalk_core::{CancellationToken, NavigationController, SessionReport, SessionStatus};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

type Record = Map<String, Value>;

/// Execute the run command.
///
/// # Errors
///
/// Returns configuration and browser errors, and a `Session` error for the
/// first session that timed out or failed (after all records were written).
pub async fn execute(args: RunArgs) -> Result<()> {
    let config = PagewalkConfig::load(args.config.as_deref(), &args.urls, &args.overrides)?;
    config.validate()?;

    let started = Instant::now();
    ui::info(&format!("Scraping {} page(s)...", config.urls.len()));

    let browser = ChromeBrowser::launch(config.browser_config()).await?;
    let cancel = CancellationToken::new();
    let interrupt = spawn_interrupt_handler(cancel.clone());

    let sessions = config
        .urls
        .iter()
        .map(|url| scrape(&browser, &config, url, cancel.child_token()));
    let results = join_all(sessions).await;

    interrupt.abort();
    if let Err(e) = browser.close().await {
        warn!(error = %e, "browser did not close cleanly");
    }

    let mut out = open_output(args.output.as_deref())?;
    let mut first_failure = None;
    let mut total = 0usize;

    for (url, result) in config.urls.iter().zip(results) {
        let mut report = match result {
            Ok(report) => report,
            Err(e) => {
                ui::error(&format!("{url}: {e}"));
                first_failure.get_or_insert(e);
                continue;
            }
        };

        for record in &report.records {
            serde_json::to_writer(&mut out, record)?;
            out.write_all(b"\n")?;
        }
        total += report.records.len();
        summarize(url, &report);

        match report.status() {
            SessionStatus::TimedOut | SessionStatus::Failed => {
                first_failure.get_or_insert(CliError::Session {
                    url: url.clone(),
                    status: report.status(),
                    reason: report.reason,
                    source: report.error.take(),
                });
            }
            _ => {}
        }
    }
    out.flush()?;

    info!(
        records = total,
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "run finished"
    );

    match first_failure {
        Some(err) => Err(err),
        None => {
            ui::success(&format!("Extracted {total} record(s)"));
            Ok(())
        }
    }
}

#[instrument(skip(browser, config, cancel))]
async fn scrape(
    browser: &ChromeBrowser,
    config: &PagewalkConfig,
    url: &str,
    cancel: CancellationToken,
) -> Result<SessionReport<Record>> {
    let page = browser.new_page().await?;
    page.navigate_with(url, config.navigation.wait_config()).await?;

    let mut sink = config.sink();
    let report = NavigationController::from_config(&page, &config.navigation)
        .map_err(ConfigError::from)?
        .with_cancellation(cancel)
        .run(&mut sink)
        .await;

    if let Err(e) = page.close().await {
        warn!(error = %e, "failed to close tab");
    }
    Ok(report)
}

fn summarize(url: &str, report: &SessionReport<Record>) {
    let line = format!(
        "{url}: {} record(s) in {} iteration(s), {}",
        report.records.len(),
        report.state.actions_dispatched(),
        report.reason
    );
    match report.status() {
        SessionStatus::Stabilized | SessionStatus::Exhausted => ui::success(&line),
        SessionStatus::Cancelled => ui::warning(&line),
        _ => ui::error(&line),
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    })
}

fn spawn_interrupt_handler(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, stopping sessions at the next poll");
            cancel.cancel();
        }
    })
}
