use serde::{Deserialize, Serialize};

use crate::geo::Bounds;
use crate::model::LoadState;
use crate::region::Place;
use crate::{AppError, ErrorKind};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MarkerView {
    pub group_id: String,
    pub lat: f64,
    pub lng: f64,
    pub stroke_color: String,
    pub fill_color: String,
    pub halo_radius_m: f64,
    pub is_active: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ListItemView {
    pub group_id: String,
    pub short_id: String,
    pub status_text: String,
    pub status_color: String,
    pub report_count: u32,
    pub region_text: String,
    pub region_color: String,
    pub reported_at: String,
    pub is_active: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PopupView {
    pub group_id: String,
    pub status_text: String,
    pub status_color: String,
    pub report_count: u32,
    /// e.g. `[ 11, 12, 15 ]`
    pub report_ids_text: String,
    pub anchor_lat: Option<f64>,
    pub anchor_lng: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RegionNodeView {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub level: u8,
    pub children: Vec<RegionNodeView>,
}

impl From<&Place> for RegionNodeView {
    fn from(place: &Place) -> Self {
        Self {
            name: place.name.clone(),
            lat: place.lat,
            lng: place.lng,
            level: place.focus_level(),
            children: place.children.iter().map(Self::from).collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewportView {
    pub center_lat: f64,
    pub center_lng: f64,
    pub level: u8,
    pub fit_bounds: Option<Bounds>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserFacingError {
    pub message: String,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            error_code: e.code().to_string(),
        }
    }
}

impl UserFacingError {
    #[must_use]
    pub fn kind_is(&self, kind: ErrorKind) -> bool {
        self.error_code == kind.code()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub load_state: LoadState,
    pub markers: Vec<MarkerView>,
    pub list_items: Vec<ListItemView>,
    pub popup: Option<PopupView>,
    pub regions: Vec<RegionNodeView>,
    pub viewport: ViewportView,
    pub scroll_to: Option<String>,
    pub empty_message: Option<String>,
    pub error: Option<UserFacingError>,
}
