//! Check command implementation.
//!
//! Validates configuration without launching a browser.

use crate::cli::CheckArgs;
use crate::config::PagewalkConfig;
use crate::error::Result;
use crate::ui;
use pagewalk_core::NavigationStrategy;

/// Execute the check command.
///
/// # Errors
///
/// Returns the first configuration problem found.
pub async fn execute(args: CheckArgs) -> Result<()> {
    ui::info("Checking configuration...");

    let config = PagewalkConfig::load(args.config.as_deref(), &[], &args.overrides)?;
    config.validate()?;
    let strategy = config
        .navigation
        .strategy()
        .map_err(crate::error::ConfigError::from)?;

    ui::success("Configuration is valid!");
    ui::info(&format!("  strategy: {}", describe(&strategy)));
    ui::info(&format!(
        "  timings: poll every {}ms, wait up to {}ms, at most {} iterations",
        config.navigation.poll_interval_ms,
        config.navigation.timeout_ms,
        config.navigation.max_iterations
    ));
    for url in &config.urls {
        ui::info(&format!("  url: {url}"));
    }
    if config.fields.is_empty() {
        ui::warning("No [[fields]] configured; records will hold the item text only");
    }

    Ok(())
}

fn describe(strategy: &NavigationStrategy) -> String {
    match strategy {
        NavigationStrategy::ClickTriggeredWait(click) => match &click.loader {
            Some(loader) => format!("click pagination, waiting for {loader} to disappear"),
            None => "click pagination, waiting for new items".to_string(),
        },
        NavigationStrategy::IncrementalLoadWait(load_more) => {
            format!("load more via {}", load_more.control)
        }
        NavigationStrategy::ScrollDrivenWait(_) => "infinite scroll".to_string(),
    }
}
