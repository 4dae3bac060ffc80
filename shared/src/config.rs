use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::geo::ValidatedCoordinate;
use crate::{
    DEFAULT_BASE_URL, DEFAULT_CENTER, DEFAULT_MAP_LEVEL, FOCUS_MAP_LEVEL, GROUPS_PATH,
    MAX_MAP_LEVEL, MIN_MAP_LEVEL, PLACES_PATH, SUB_REGION_THRESHOLD_KM,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("unsupported url scheme {0:?}")]
    UnsupportedScheme(String),
    #[error("sub-region threshold must be a positive distance, got {0}")]
    InvalidThreshold(f64),
    #[error("map level {0} is outside the supported range 1..=14")]
    InvalidLevel(u8),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    pub places_url: String,
    pub groups_url: String,
    pub sub_region_threshold_km: f64,
    pub focus_level: u8,
    pub initial_center: ValidatedCoordinate,
    pub initial_level: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        let (lat, lng) = DEFAULT_CENTER;
        Self {
            places_url: format!("{DEFAULT_BASE_URL}{PLACES_PATH}"),
            groups_url: format!("{DEFAULT_BASE_URL}{GROUPS_PATH}"),
            sub_region_threshold_km: SUB_REGION_THRESHOLD_KM,
            focus_level: FOCUS_MAP_LEVEL,
            initial_center: ValidatedCoordinate::new_unchecked(lat, lng),
            initial_level: DEFAULT_MAP_LEVEL,
        }
    }
}

fn parse_http_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}

pub(crate) fn check_level(level: u8) -> Result<(), ConfigError> {
    if (MIN_MAP_LEVEL..=MAX_MAP_LEVEL).contains(&level) {
        Ok(())
    } else {
        Err(ConfigError::InvalidLevel(level))
    }
}

impl MapConfig {
    /// Default settings with both resources resolved against `base`.
    pub fn with_base_url(base: &str) -> Result<Self, ConfigError> {
        let base = parse_http_url(base)?;
        let join = |path: &str| {
            base.join(path)
                .map(String::from)
                .map_err(|e| ConfigError::InvalidUrl {
                    url: path.to_string(),
                    reason: e.to_string(),
                })
        };
        Ok(Self {
            places_url: join(PLACES_PATH)?,
            groups_url: join(GROUPS_PATH)?,
            ..Self::default()
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_http_url(&self.places_url)?;
        parse_http_url(&self.groups_url)?;
        if !self.sub_region_threshold_km.is_finite() || self.sub_region_threshold_km <= 0.0 {
            return Err(ConfigError::InvalidThreshold(self.sub_region_threshold_km));
        }
        check_level(self.focus_level)?;
        check_level(self.initial_level)
    }
}
