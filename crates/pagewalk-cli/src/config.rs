//! Layered configuration.
//!
//! Priority, lowest first: built-in defaults, `pagewalk.toml` (or the file
//! given with `--config`), `PAGEWALK_*` environment variables, then command
//! line flags. Nested keys use a double underscore in the environment, e.g.
//! `PAGEWALK_NAVIGATION__TIMEOUT_MS=5000`.
//!
//! ```toml
//! urls = ["https://www.scrapethissite.com/pages/ajax-javascript/"]
//! headless = true
//!
//! [navigation]
//! timeout_ms = 8000
//!
//! [navigation.locators]
//! strategy = "click"
//! items = "tr.film"
//! loader = "#loading"
//! controls = ["#2015", "#2014"]
//!
//! [[fields]]
//! name = "title"
//! selector = "td.film-title"
//!
//! [[fields]]
//! name = "best_picture"
//! selector = "td.film-best-picture i@class"
//! ```
//!
//! Fields are a list so records keep the configured column order.

use crate::cli::Overrides;
use crate::error::{ConfigError, Result};
use figment::{
    providers::{Env, Format as _, Serialized, Toml},
    Figment,
};
use pagewalk_chrome::{ChromeBrowserConfig, FieldSink};
use pagewalk_core::NavigationConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "pagewalk.toml";

/// Everything a `pagewalk run` needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagewalkConfig {
    /// Pages to scrape, one session each
    #[serde(default)]
    pub urls: Vec<String>,

    /// Run Chrome without a window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Browser window size in pixels
    #[serde(default = "default_window_size")]
    pub window_size: (u32, u32),

    /// Chrome executable (auto-detected when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<PathBuf>,

    /// Navigation idiom, locators and timings
    pub navigation: NavigationConfig,

    /// Record fields, in output order
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

/// One output column of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Key in the emitted JSON object
    pub name: String,

    /// `selector`, `selector@attribute`, `@attribute` or empty for the
    /// item's own text
    #[serde(default)]
    pub selector: String,
}

fn default_headless() -> bool {
    true
}

fn default_window_size() -> (u32, u32) {
    (1920, 1080)
}

/// Flags merged on top of the file and environment.
#[derive(Debug, Default, Serialize)]
struct FlagLayer {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    headless: Option<bool>,
    #[serde(skip_serializing_if = "NavigationFlags::is_empty")]
    navigation: NavigationFlags,
}

#[derive(Debug, Default, Serialize)]
struct NavigationFlags {
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    poll_interval_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_iterations: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    no_growth_threshold: Option<u32>,
}

impl NavigationFlags {
    fn is_empty(&self) -> bool {
        self.timeout_ms.is_none()
            && self.poll_interval_ms.is_none()
            && self.max_iterations.is_none()
            && self.no_growth_threshold.is_none()
    }
}

impl FlagLayer {
    fn new(urls: &[String], overrides: &Overrides) -> Self {
        Self {
            urls: urls.to_vec(),
            headless: overrides.visible.then_some(false),
            navigation: NavigationFlags {
                timeout_ms: overrides.timeout_ms,
                poll_interval_ms: overrides.poll_interval_ms,
                max_iterations: overrides.max_iterations,
                no_growth_threshold: overrides.no_growth_threshold,
            },
        }
    }
}

impl PagewalkConfig {
    /// Loads configuration from every layer.
    ///
    /// `config_path` must exist when given; otherwise `pagewalk.toml` in the
    /// working directory is used if present.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing explicit file, `Invalid` when the
    /// merged layers do not deserialize.
    pub fn load(config_path: Option<&Path>, urls: &[String], overrides: &Overrides) -> Result<Self> {
        let config_file = match config_path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound(path.to_path_buf()).into());
            }
            Some(path) => Some(path.to_path_buf()),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                default_path.exists().then(|| default_path.to_path_buf())
            }
        };

        let mut figment = Figment::new();
        if let Some(path) = &config_file {
            debug!(path = %path.display(), "loading configuration file");
            figment = figment.merge(Toml::file(path));
        }

        figment = figment
            .merge(Env::prefixed("PAGEWALK_").split("__"))
            .merge(Serialized::defaults(FlagLayer::new(urls, overrides)));

        figment.extract().map_err(|e| {
            ConfigError::Invalid {
                message: e.to_string(),
                hint: "Check pagewalk.toml syntax; [navigation.locators] needs a strategy and items"
                    .to_string(),
            }
            .into()
        })
    }

    /// Checks that the configuration can be run.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` without URLs, `Invalid` for a repeated field
    /// name, or the navigation validation error.
    pub fn validate(&self) -> Result<()> {
        if self.urls.is_empty() {
            return Err(ConfigError::MissingField {
                field: "urls".to_string(),
                hint: "Pass URLs as arguments or set `urls` in pagewalk.toml".to_string(),
            }
            .into());
        }
        let mut seen = HashSet::new();
        if let Some(field) = self.fields.iter().find(|f| !seen.insert(f.name.as_str())) {
            return Err(ConfigError::Invalid {
                message: format!("field '{}' is defined more than once", field.name),
                hint: "Give every [[fields]] entry a distinct name".to_string(),
            }
            .into());
        }
        self.navigation.validate().map_err(ConfigError::from)?;
        Ok(())
    }

    /// Browser launch options.
    #[must_use]
    pub fn browser_config(&self) -> ChromeBrowserConfig {
        let mut config = ChromeBrowserConfig::default()
            .with_window_size(self.window_size.0, self.window_size.1);
        config.headless = self.headless;
        config.chrome_path.clone_from(&self.chrome_path);
        config
    }

    /// Sink for the configured fields, or item text when none are set.
    #[must_use]
    pub fn sink(&self) -> FieldSink {
        if self.fields.is_empty() {
            FieldSink::text_only()
        } else {
            FieldSink::new(self.fields.iter().map(|f| (f.name.as_str(), f.selector.as_str())))
        }
    }
}
