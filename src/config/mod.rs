mod error;

pub use error::ConfigError;

use log::LevelFilter;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::alert::Criterion;
use crate::geo::{Observer, DEFAULT_OBSERVER_NAME};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub location: LocationConfig,
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub app: AppConfig,
    pub criteria: Vec<Criterion>,
    #[serde(default)]
    pub stream: StreamConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_location_name")]
    pub name: String,
}

fn default_location_name() -> String {
    DEFAULT_OBSERVER_NAME.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    pub apprise_urls: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            check_interval_seconds: default_check_interval(),
            log_level: default_log_level(),
        }
    }
}

fn default_check_interval() -> u64 {
    300
}

fn default_log_level() -> String {
    "INFO".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamConfig {
    /// Restricts the subscription to these serials; empty means all sondes.
    #[serde(default)]
    pub serials: Vec<String>,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.observer()?;
        self.log_level()?;

        if self.notifications.apprise_urls.is_empty() {
            return Err(ConfigError::Invalid(
                "notifications.apprise_urls must list at least one URL".into(),
            ));
        }
        if self.app.check_interval_seconds == 0 {
            return Err(ConfigError::Invalid(
                "app.check_interval_seconds must be positive".into(),
            ));
        }
        if self.criteria.is_empty() {
            return Err(ConfigError::Invalid("criteria must not be empty".into()));
        }

        let mut names = HashSet::new();
        for (i, criterion) in self.criteria.iter().enumerate() {
            validate_criterion(i, criterion)?;
            if !names.insert(criterion.name.as_str()) {
                return Err(ConfigError::Criterion {
                    index: i,
                    message: format!("duplicate name '{}'", criterion.name),
                });
            }
        }

        Ok(())
    }

    pub fn observer(&self) -> Result<Observer, ConfigError> {
        let loc = &self.location;
        Ok(Observer::new(loc.latitude, loc.longitude, loc.name.clone())?)
    }

    pub fn log_level(&self) -> Result<LevelFilter, ConfigError> {
        parse_log_level(&self.app.log_level)
            .ok_or_else(|| ConfigError::Invalid(format!("unknown log level '{}'", self.app.log_level)))
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.app.check_interval_seconds)
    }

    pub fn enabled_criteria(&self) -> impl Iterator<Item = &Criterion> {
        self.criteria.iter().filter(|c| c.enabled)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(yaml: &str) -> Result<Self, Self::Err> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }
}

fn validate_criterion(index: usize, c: &Criterion) -> Result<(), ConfigError> {
    let err = |message: String| ConfigError::Criterion { index, message };

    if c.name.trim().is_empty() {
        return Err(err("name must not be empty".into()));
    }
    for (key, value) in c.bounds() {
        if !value.is_finite() {
            return Err(err(format!("{} must be a finite number", key)));
        }
    }
    if let (Some(min), Some(max)) = (c.altitude_feet_min, c.altitude_feet_max) {
        if min > max {
            return Err(err(format!("altitude_feet_min {} exceeds altitude_feet_max {}", min, max)));
        }
    }
    if let (Some(min), Some(max)) = (c.climb_rate_min, c.climb_rate_max) {
        if min > max {
            return Err(err(format!("climb_rate_min {} exceeds climb_rate_max {}", min, max)));
        }
    }
    Ok(())
}

/// Python-style level names are accepted alongside the `log` crate's.
pub fn parse_log_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Some(LevelFilter::Trace),
        "DEBUG" => Some(LevelFilter::Debug),
        "INFO" => Some(LevelFilter::Info),
        "WARN" | "WARNING" => Some(LevelFilter::Warn),
        "ERROR" | "CRITICAL" => Some(LevelFilter::Error),
        "OFF" => Some(LevelFilter::Off),
        _ => None,
    }
}
