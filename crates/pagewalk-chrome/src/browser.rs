//! Chrome process and tabs.
//!
//! One `ChromeBrowser` serves every URL of a run: each navigation session
//! gets its own tab from [`ChromeBrowser::new_page`], and tabs run
//! concurrently against the same process.

use crate::error::{ChromeError, Result};
use crate::page::ChromePage;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Launch options, also read from the `pagewalk.toml` top level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromeBrowserConfig {
    /// Run without a window (default: true, unless built with `visible`).
    pub headless: bool,

    /// Window size in pixels.
    pub window_size: (u32, u32),

    /// Extra Chrome flags.
    pub args: Vec<String>,

    /// Chrome executable; auto-detected when unset.
    pub chrome_path: Option<PathBuf>,
}

impl ChromeBrowserConfig {
    /// Sets the window size.
    ///
    /// Infinite-scroll pages load according to the viewport, so the size
    /// affects how many items arrive per scroll.
    #[must_use]
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    #[allow(clippy::result_large_err)]
    fn to_browser_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder().arg(format!(
            "--window-size={},{}",
            self.window_size.0, self.window_size.1
        ));
        builder = if self.headless {
            builder.arg("--headless")
        } else {
            builder.with_head()
        };

        // Concurrent runs must not share a profile directory.
        let profile = std::env::temp_dir().join(format!("pagewalk-{}", uuid::Uuid::new_v4()));
        builder = builder.arg(format!("--user-data-dir={}", profile.display()));

        for arg in &self.args {
            builder = builder.arg(arg.clone());
        }
        if let Some(path) = &self.chrome_path {
            builder = builder.chrome_executable(path.clone());
        }

        builder.build().map_err(|e| ChromeError::LaunchFailed {
            reason: format!("invalid browser configuration: {e}"),
            source: None,
        })
    }
}

impl Default for ChromeBrowserConfig {
    fn default() -> Self {
        Self {
            headless: !cfg!(feature = "visible"),
            window_size: (1920, 1080),
            // Containers usually lack user namespaces and a large /dev/shm.
            args: vec![
                "--no-sandbox".to_string(),
                "--disable-dev-shm-usage".to_string(),
            ],
            chrome_path: None,
        }
    }
}

/// A running Chrome process.
///
/// Call [`close`](Self::close) when the run is over. Dropping the browser
/// instead still kills the process, but without a graceful shutdown.
pub struct ChromeBrowser {
    browser: Browser,
    handler: JoinHandle<()>,
    closed: bool,
}

impl ChromeBrowser {
    /// Starts Chrome and the task that pumps its DevTools events.
    ///
    /// # Errors
    ///
    /// Returns `LaunchFailed` if Chrome is missing or does not start.
    pub async fn launch(config: ChromeBrowserConfig) -> Result<Self> {
        debug!(?config, "launching browser");

        let (browser, mut events) = Browser::launch(config.to_browser_config()?)
            .await
            .map_err(|e| ChromeError::LaunchFailed {
                reason: "failed to launch Chrome process".to_string(),
                source: Some(Box::new(e)),
            })?;

        // Page commands only complete while the event stream is polled.
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    warn!(error = %e, "browser event error");
                }
            }
        });

        Ok(Self {
            browser,
            handler,
            closed: false,
        })
    }

    /// Opens a blank tab for one navigation session.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionFailed` if the tab cannot be created.
    pub async fn new_page(&self) -> Result<ChromePage> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| ChromeError::ConnectionFailed(e.to_string()))?;
        Ok(ChromePage::new(page))
    }

    /// Shuts Chrome down and waits for the process to exit.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionFailed` if Chrome does not acknowledge the close.
    pub async fn close(mut self) -> Result<()> {
        debug!("closing browser");
        self.closed = true;
        self.browser
            .close()
            .await
            .map_err(|e| ChromeError::ConnectionFailed(e.to_string()))?;
        if let Err(e) = self.browser.wait().await {
            warn!(error = %e, "browser process did not exit cleanly");
        }
        Ok(())
    }
}

impl Drop for ChromeBrowser {
    fn drop(&mut self) {
        self.handler.abort();
        if !self.closed {
            warn!("browser dropped without close(); killing the process");
        }
    }
}
