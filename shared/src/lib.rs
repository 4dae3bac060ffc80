// lib.rs - Pothole group map core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod app;
pub mod capabilities;
pub mod config;
pub mod event;
pub mod geo;
pub mod group;
pub mod model;
pub mod presenter;
pub mod region;
pub mod selection;
pub mod view;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::MapConfig;
pub use crux_core::{render::Render, App as CruxApp};
pub use event::Event;
pub use geo::{haversine_km, Bounds, CoordinateError, ValidatedCoordinate};
pub use group::{Group, GroupId, GroupStatus};
pub use model::{LoadState, Model, Viewport};
pub use presenter::{GroupPresentation, GroupPresenter, MarkerColor};
pub use region::{Place, RegionIndex};
pub use selection::{SelectionController, SelectionEffect, SelectionEvent, SelectionState};
pub use view::ViewModel;

pub const EARTH_RADIUS_KM: f64 = 6_371.0;
/// Nearest child closer than this (strictly) is appended to the region label.
pub const SUB_REGION_THRESHOLD_KM: f64 = 50.0;

/// Map levels follow the Kakao scale: smaller is closer.
pub const MIN_MAP_LEVEL: u8 = 1;
pub const MAX_MAP_LEVEL: u8 = 14;
pub const DEFAULT_MAP_LEVEL: u8 = 5;
/// Selecting a group never leaves the map further out than this level.
pub const FOCUS_MAP_LEVEL: u8 = 3;
/// Used for region navigation when a place carries no level hint.
pub const DEFAULT_REGION_LEVEL: u8 = 5;

/// Chuncheon city hall.
pub const DEFAULT_CENTER: (f64, f64) = (37.8813, 127.7300);

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const PLACES_PATH: &str = "/static/data/regions.json";
pub const GROUPS_PATH: &str = "/api/pothole-groups";

pub const MARKER_HALO_RADIUS_M: f64 = 10.0;
pub const GROUP_ID_PREVIEW_LENGTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Validation,
    NotFound,
    Deserialization,
    Configuration,
    Internal,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::Configuration => "CONFIGURATION_ERROR",
            Self::Internal => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            internal_message: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to load map data. Please check your connection and reload the page.".into()
            }
            ErrorKind::NotFound => "The map data could not be found on the server.".into(),
            ErrorKind::Deserialization => {
                "The server sent map data in an unexpected format.".into()
            }
            ErrorKind::Validation | ErrorKind::Configuration => self.message.clone(),
            ErrorKind::Internal | ErrorKind::Unknown => {
                "An unexpected error occurred while loading the map.".into()
            }
        }
    }

    #[must_use]
    pub fn from_http_status(status: u16, body: Option<&[u8]>) -> Self {
        let kind = match status {
            400 | 422 => ErrorKind::Validation,
            404 => ErrorKind::NotFound,
            500..=599 => ErrorKind::Internal,
            _ => ErrorKind::Unknown,
        };

        let message = body
            .and_then(|b| serde_json::from_slice::<ApiErrorResponse>(b).ok())
            .and_then(ApiErrorResponse::into_message)
            .unwrap_or_else(|| format!("HTTP error: {status}"));

        Self::new(kind, message).with_context("http_status", status.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::new(ErrorKind::Configuration, e.to_string())
    }
}

/// Error body as produced by the FastAPI backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

impl ApiErrorResponse {
    fn into_message(self) -> Option<String> {
        match (self.message, self.detail) {
            (Some(message), _) => Some(message),
            (None, Some(serde_json::Value::String(detail))) => Some(detail),
            (None, Some(detail)) => Some(detail.to_string()),
            (None, None) => None,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
