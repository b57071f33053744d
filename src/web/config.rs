use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use strum_macros::Display;
use thiserror::Error;

use crate::catalog::{load_observer, CatalogError};
use crate::predict::{
    FixedResolver, LocalTimeResolver, Observer, PredictError, SolarResolver, ZoneResolver,
    DEFAULT_BEARING_RESOLUTION,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub station: StationConfig,
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub predict: PredictConfig,
    pub render: RenderConfig,
    #[serde(default)]
    pub api_keys: Vec<ApiKey>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PredictConfig {
    pub default_min_elevation: f64,
    pub default_window_hours: f64,
    pub bearing_resolution: usize,
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            default_min_elevation: 45.0,
            default_window_hours: 72.0,
            bearing_resolution: DEFAULT_BEARING_RESOLUTION,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKey {
    pub key: String,
    pub name: String,
    pub permissions: HashSet<Permission>,
}

/// Where the observer stands. `observer_file` takes precedence over `coordinates`.
#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    pub name: Option<String>,
    pub observer_file: Option<PathBuf>,
    pub coordinates: Option<String>,
    #[serde(default)]
    pub altitude_m: f64,
    /// IANA zone name; the nominal solar offset is used without one.
    pub timezone: Option<String>,
    /// Fixed offset overriding `timezone`.
    pub utc_offset_hours: Option<f64>,
}

impl StationConfig {
    /// Reads the observer file anew on every call.
    pub fn observer(&self) -> Result<Observer, CatalogError> {
        if let Some(path) = &self.observer_file {
            return load_observer(path, Some(self.altitude_m));
        }
        let coordinates = self.coordinates.as_deref().unwrap_or_default();
        Observer::from_coordinates(coordinates, Some(self.altitude_m)).ok_or_else(|| {
            CatalogError::InvalidObserver {
                path: PathBuf::from("<config>"),
                content: coordinates.to_string(),
            }
        })
    }

    pub fn time_resolver(&self) -> Result<Box<dyn LocalTimeResolver>, PredictError> {
        match (self.utc_offset_hours, &self.timezone) {
            (Some(hours), _) => Ok(Box::new(FixedResolver(hours))),
            (None, Some(zone)) => Ok(Box::new(ZoneResolver::new(zone)?)),
            (None, None) => Ok(Box::new(SolarResolver)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Permission {
    ComputePasses,
    RenderViews,
    ControlJob,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    pub fn find_api_key(&self, key: &str) -> Option<&ApiKey> {
        self.api_keys.iter().find(|k| k.key == key)
    }
}
