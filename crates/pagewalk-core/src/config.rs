//! Caller-facing session configuration.

use crate::detector::{StabilizationDetector, WaitConfig};
use crate::error::ConfigError;
use crate::locator::Locator;
use crate::policy::TerminationPolicy;
use crate::strategy::{
    ClickControls, ClickTriggeredWait, IncrementalLoadWait, NavigationStrategy, ScrollDrivenWait,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Options recognized by a navigation session.
///
/// ```toml
/// poll_interval_ms = 250
/// timeout_ms = 8000
/// max_iterations = 20
///
/// [locators]
/// strategy = "load_more"
/// items = "div.card"
/// control = "button#load-more"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Interval between two samples of the stabilization signal
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Deadline for one stabilization wait
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Safety cap on the number of actions per session
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Stop after this many consecutive iterations without new items (0 disables)
    #[serde(default = "default_no_growth_threshold")]
    pub no_growth_threshold: u32,

    /// Navigation idiom and its locators
    pub locators: LocatorSpec,
}

/// Locators for each navigation idiom, tagged by `strategy`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum LocatorSpec {
    /// Dynamic pagination through page or year controls
    Click {
        items: Locator,
        /// One control per page, clicked in order
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        controls: Vec<Locator>,
        /// A single "next" control clicked every iteration
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next: Option<Locator>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        loader: Option<Locator>,
    },
    /// "Load more" button
    LoadMore { items: Locator, control: Locator },
    /// Infinite scroll
    Scroll { items: Locator },
}

pub(crate) fn default_poll_interval_ms() -> u64 {
    250
}

pub(crate) fn default_timeout_ms() -> u64 {
    10_000
}

pub(crate) fn default_max_iterations() -> u32 {
    50
}

pub(crate) fn default_no_growth_threshold() -> u32 {
    2
}

impl NavigationConfig {
    /// Configuration with default timings for the given locators.
    #[must_use]
    pub fn new(locators: LocatorSpec) -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            timeout_ms: default_timeout_ms(),
            max_iterations: default_max_iterations(),
            no_growth_threshold: default_no_growth_threshold(),
            locators,
        }
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub fn wait_config(&self) -> WaitConfig {
        WaitConfig::new(self.timeout(), self.poll_interval())
    }

    #[must_use]
    pub fn detector(&self) -> StabilizationDetector {
        StabilizationDetector::new(self.poll_interval())
    }

    #[must_use]
    pub fn termination_policy(&self) -> TerminationPolicy {
        let no_growth = (self.no_growth_threshold > 0).then_some(self.no_growth_threshold);
        TerminationPolicy::new(self.max_iterations, no_growth)
    }

    /// Builds the navigation strategy described by `locators`.
    ///
    /// # Errors
    ///
    /// Returns `AmbiguousControls` for click pagination configured with
    /// both or neither of `controls` and `next`.
    pub fn strategy(&self) -> Result<NavigationStrategy, ConfigError> {
        let strategy = match &self.locators {
            LocatorSpec::Click {
                items,
                controls,
                next,
                loader,
            } => {
                let controls = match (controls.is_empty(), next) {
                    (false, None) => ClickControls::Each(controls.clone()),
                    (true, Some(next)) => ClickControls::Next(next.clone()),
                    _ => return Err(ConfigError::AmbiguousControls),
                };
                ClickTriggeredWait {
                    controls,
                    items: items.clone(),
                    loader: loader.clone(),
                }
                .into()
            }
            LocatorSpec::LoadMore { items, control } => IncrementalLoadWait {
                control: control.clone(),
                items: items.clone(),
            }
            .into(),
            LocatorSpec::Scroll { items } => ScrollDrivenWait {
                items: items.clone(),
            }
            .into(),
        };
        Ok(strategy)
    }

    /// Checks option ranges and locators.
    ///
    /// # Errors
    ///
    /// Returns the first invalid option found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_iterations",
                reason: "must allow at least one iteration".to_string(),
            });
        }

        let mut locators: Vec<(&'static str, &Locator)> = Vec::new();
        match &self.locators {
            LocatorSpec::Click {
                items,
                controls,
                next,
                loader,
            } => {
                locators.push(("items", items));
                locators.extend(controls.iter().map(|c| ("controls", c)));
                locators.extend(next.iter().map(|n| ("next", n)));
                locators.extend(loader.iter().map(|l| ("loader", l)));
            }
            LocatorSpec::LoadMore { items, control } => {
                locators.push(("items", items));
                locators.push(("control", control));
            }
            LocatorSpec::Scroll { items } => locators.push(("items", items)),
        }
        if let Some((field, _)) = locators.iter().find(|(_, l)| l.is_blank()) {
            return Err(ConfigError::EmptyLocator(*field));
        }

        self.strategy().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_more() -> LocatorSpec {
        LocatorSpec::LoadMore {
            items: Locator::css("div.card"),
            control: Locator::css("button.more"),
        }
    }

    #[test]
    fn defaults_from_toml() {
        let config: NavigationConfig = toml::from_str(
            r#"
            [locators]
            strategy = "scroll"
            items = "article"
            "#,
        )
        .unwrap();

        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.timeout_ms, 10_000);
        assert_eq!(config.max_iterations, 50);
        assert_eq!(config.no_growth_threshold, 2);
        assert_eq!(
            config.locators,
            LocatorSpec::Scroll {
                items: Locator::css("article")
            }
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn click_pagination_from_toml() {
        let config: NavigationConfig = toml::from_str(
            r##"
            timeout_ms = 5000

            [locators]
            strategy = "click"
            items = "tr.film"
            loader = "#loading"
            controls = ["#2015", { xpath = "//a[@id='2014']" }]
            "##,
        )
        .unwrap();

        let strategy = config.strategy().unwrap();
        assert_eq!(
            strategy,
            NavigationStrategy::ClickTriggeredWait(ClickTriggeredWait {
                controls: ClickControls::Each(vec![
                    Locator::id("2015"),
                    Locator::xpath("//a[@id='2014']")
                ]),
                items: Locator::css("tr.film"),
                loader: Some(Locator::id("loading")),
            })
        );
    }

    #[test]
    fn rejects_zero_values() {
        let mut config = NavigationConfig::new(load_more());
        config.max_iterations = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "max_iterations",
                ..
            })
        ));

        let mut config = NavigationConfig::new(load_more());
        config.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = NavigationConfig::new(load_more());
        config.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_ambiguous_click_controls() {
        let config = NavigationConfig::new(LocatorSpec::Click {
            items: Locator::css("tr"),
            controls: vec![Locator::id("2015")],
            next: Some(Locator::css("a.next")),
            loader: None,
        });
        assert_eq!(config.validate(), Err(ConfigError::AmbiguousControls));

        let config = NavigationConfig::new(LocatorSpec::Click {
            items: Locator::css("tr"),
            controls: vec![],
            next: None,
            loader: None,
        });
        assert_eq!(config.validate(), Err(ConfigError::AmbiguousControls));
    }

    #[test]
    fn rejects_blank_locators_built_in_code() {
        let config = NavigationConfig::new(LocatorSpec::Scroll {
            items: Locator::css(" "),
        });
        assert_eq!(config.validate(), Err(ConfigError::EmptyLocator("items")));
    }

    #[test]
    fn zero_threshold_disables_no_growth() {
        let mut config = NavigationConfig::new(load_more());
        config.no_growth_threshold = 0;
        let policy = config.termination_policy();
        assert!(!policy
            .conditions()
            .iter()
            .any(|c| matches!(c, crate::TerminationCondition::NoGrowthForConsecutive(_))));
    }

    #[test]
    fn load_wait_uses_session_timings() {
        let mut config = NavigationConfig::new(load_more());
        config.timeout_ms = 4_000;
        config.poll_interval_ms = 50;

        let wait = config.wait_config();
        assert_eq!(wait.timeout, Duration::from_secs(4));
        assert_eq!(wait.poll_interval, Duration::from_millis(50));
    }
}
