//! Runtime configuration for the binaries.
//!
//! Values come from an optional JSON file named by `WORKSITE_CONFIG`; individual
//! environment variables override the file.

use crate::timeline::{
    DEFAULT_DAY_WIDTH_PX, DEFAULT_MAX_VISIBLE_DAYS, TimelineConfig, TimelineError,
    TimelineGeometry,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "WORKSITE_CONFIG";
pub const DAY_WIDTH_ENV: &str = "WORKSITE_DAY_WIDTH";
pub const DATA_PATH_ENV: &str = "WORKSITE_DATA";
pub const HTTP_ADDR_ENV: &str = "WORKSITE_HTTP_ADDR";
pub const LOG_LEVEL_ENV: &str = "WORKSITE_LOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error(transparent)]
    Timeline(#[from] TimelineError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Pixels per calendar day on the timeline.
    #[serde(default = "default_day_width")]
    pub day_width_px: f64,
    #[serde(default = "default_max_visible_days")]
    pub max_visible_days: u32,
    /// JSON snapshot used by the binaries; `None` keeps everything in memory.
    #[serde(default)]
    pub data_path: Option<PathBuf>,
    #[serde(default = "default_http_addr")]
    pub http_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_day_width() -> f64 {
    DEFAULT_DAY_WIDTH_PX
}

fn default_max_visible_days() -> u32 {
    DEFAULT_MAX_VISIBLE_DAYS
}

fn default_http_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            day_width_px: default_day_width(),
            max_visible_days: default_max_visible_days(),
            data_path: None,
            http_addr: default_http_addr(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Reads the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(DAY_WIDTH_ENV) {
            self.day_width_px = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: DAY_WIDTH_ENV,
                value: raw.clone(),
            })?;
        }
        if let Some(path) = lookup(DATA_PATH_ENV) {
            self.data_path = (!path.trim().is_empty()).then(|| PathBuf::from(path));
        }
        if let Some(addr) = lookup(HTTP_ADDR_ENV) {
            self.http_addr = addr;
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            self.log_level = level;
        }
        Ok(())
    }

    fn validate(&self) -> ConfigResult<()> {
        TimelineGeometry::new(self.day_width_px)?;
        if self.max_visible_days == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_visible_days",
                value: self.max_visible_days.to_string(),
            });
        }
        Ok(())
    }

    pub fn timeline_config(&self) -> TimelineConfig {
        TimelineConfig {
            day_width_px: self.day_width_px,
            max_visible_days: self.max_visible_days,
        }
    }

    pub fn geometry(&self) -> ConfigResult<TimelineGeometry> {
        Ok(TimelineGeometry::new(self.day_width_px)?)
    }
}
