use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::MapConfig;
use crate::geo::{Bounds, ValidatedCoordinate};
use crate::group::{Group, GroupId};
use crate::presenter::{GroupPresentation, GroupPresenter};
use crate::region::RegionIndex;
use crate::selection::{PopupHandle, SelectionController, SelectionEffect, SelectionEvent};
use crate::AppError;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    NotStarted,
    LoadingPlaces,
    LoadingGroups,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: ValidatedCoordinate,
    /// Smaller is closer.
    pub level: u8,
    /// Set after loading so the shell frames every marker; cleared by any
    /// later explicit move.
    pub fit_bounds: Option<Bounds>,
}

impl Viewport {
    #[must_use]
    pub const fn new(center: ValidatedCoordinate, level: u8) -> Self {
        Self {
            center,
            level,
            fit_bounds: None,
        }
    }

    pub fn move_to(&mut self, center: ValidatedCoordinate, level: u8) {
        self.center = center;
        self.level = level;
        self.fit_bounds = None;
    }
}

impl Default for Viewport {
    fn default() -> Self {
        let config = MapConfig::default();
        Self::new(config.initial_center, config.initial_level)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPopup {
    pub handle: PopupHandle,
    pub group_id: GroupId,
    pub anchor: Option<ValidatedCoordinate>,
}

#[derive(Debug, Default)]
pub struct Model {
    pub config: MapConfig,
    pub load_state: LoadState,

    pub regions: RegionIndex,
    pub groups: Vec<Group>,
    /// Parallel to `groups`; computed once when the listing arrives.
    pub presentations: Vec<GroupPresentation>,
    pub skipped_records: usize,

    pub selection: SelectionController,

    // Render state, only ever written from selection effects or shell reports.
    pub viewport: Viewport,
    pub popup: Option<OpenPopup>,
    pub highlighted: Option<GroupId>,
    pub scroll_target: Option<GroupId>,

    pub active_error: Option<AppError>,
}

impl Model {
    #[must_use]
    pub fn new(config: MapConfig) -> Self {
        Self {
            viewport: Viewport::new(config.initial_center, config.initial_level),
            selection: SelectionController::new(config.focus_level),
            config,
            ..Self::default()
        }
    }

    pub fn set_error(&mut self, error: AppError) {
        self.active_error = Some(error);
    }

    #[must_use]
    pub fn group(&self, group_id: &GroupId) -> Option<(usize, &Group)> {
        self.groups
            .iter()
            .enumerate()
            .find(|(_, g)| &g.group_id == group_id)
    }

    /// Replaces the group listing and derives every presentation.
    pub fn install_groups(&mut self, groups: Vec<Group>) {
        let presenter = GroupPresenter::new(&self.regions);
        self.presentations = groups.iter().map(|g| presenter.present(g)).collect();
        self.groups = groups;
        self.viewport.fit_bounds = Bounds::covering(self.groups.iter().filter_map(|g| g.location));
    }

    /// Runs one selection event and applies its effects to the render state.
    pub fn dispatch_selection(&mut self, event: SelectionEvent) {
        let groups = &self.groups;
        let effects = self.selection.apply(event, self.viewport.level, |id| {
            groups
                .iter()
                .find(|g| &g.group_id == id)
                .and_then(|g| g.location)
        });
        self.apply_selection_effects(effects);
    }

    pub fn apply_selection_effects(&mut self, effects: Vec<SelectionEffect>) {
        self.scroll_target = None;
        for effect in effects {
            match effect {
                SelectionEffect::ClosePopup(handle) => {
                    if self.popup.as_ref().map(|p| p.handle) == Some(handle) {
                        self.popup = None;
                    } else {
                        warn!(?handle, "close requested for a popup that is not open");
                    }
                }
                SelectionEffect::ClearHighlight(group_id) => {
                    if self.highlighted.as_ref() == Some(&group_id) {
                        self.highlighted = None;
                    }
                }
                SelectionEffect::FocusViewport { center, level } => {
                    self.viewport.move_to(center, level);
                }
                SelectionEffect::OpenPopup {
                    group_id,
                    popup,
                    anchor,
                } => {
                    debug_assert!(self.popup.is_none(), "popup opened while another is open");
                    self.popup = Some(OpenPopup {
                        handle: popup,
                        group_id,
                        anchor,
                    });
                }
                SelectionEffect::Highlight(group_id) => {
                    self.highlighted = Some(group_id);
                }
                SelectionEffect::ScrollIntoView(group_id) => {
                    self.scroll_target = Some(group_id);
                }
            }
        }
    }
}
