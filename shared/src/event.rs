use serde::{Deserialize, Serialize};

use crate::group::GroupId;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum Event {
    // Lifecycle
    AppStarted {
        /// Overrides the default backend origin.
        base_url: Option<String>,
    },

    // Selection
    MarkerClicked {
        group_id: GroupId,
    },
    ListItemClicked {
        group_id: GroupId,
    },
    PopupClosed,

    // Map
    RegionClicked {
        root: usize,
        child: Option<usize>,
    },
    MapMoved {
        lat: f64,
        lng: f64,
        level: u8,
    },

    // Load pipeline, local to the core
    #[serde(skip)]
    PlacesLoaded(crux_http::Result<crux_http::Response<Vec<u8>>>),
    #[serde(skip)]
    GroupsLoaded(crux_http::Result<crux_http::Response<Vec<u8>>>),
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AppStarted { .. } => "app_started",
            Self::MarkerClicked { .. } => "marker_clicked",
            Self::ListItemClicked { .. } => "list_item_clicked",
            Self::PopupClosed => "popup_closed",
            Self::RegionClicked { .. } => "region_clicked",
            Self::MapMoved { .. } => "map_moved",
            Self::PlacesLoaded(_) => "places_loaded",
            Self::GroupsLoaded(_) => "groups_loaded",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::MarkerClicked { .. }
                | Self::ListItemClicked { .. }
                | Self::PopupClosed
                | Self::RegionClicked { .. }
                | Self::MapMoved { .. }
        )
    }
}
