//! Single active selection shared by the map marker, the list entry and the popup.
//!
//! The controller only decides. Every transition returns the ordered side
//! effects the renderer must perform; an outgoing popup and highlight are
//! always torn down before the incoming ones are created, so two popups can
//! never be open at the same time.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geo::ValidatedCoordinate;
use crate::group::GroupId;
use crate::FOCUS_MAP_LEVEL;

/// Identifies one popup instance. Every open gets a fresh handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PopupHandle(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    Active {
        group_id: GroupId,
        popup: PopupHandle,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    SelectMarker(GroupId),
    SelectListItem(GroupId),
    /// Re-click on the list entry: deselects when it is the active one.
    ToggleListItem(GroupId),
    /// The popup was dismissed by its own close button.
    ExternalClose,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectionEffect {
    ClosePopup(PopupHandle),
    ClearHighlight(GroupId),
    FocusViewport {
        center: ValidatedCoordinate,
        level: u8,
    },
    OpenPopup {
        group_id: GroupId,
        popup: PopupHandle,
        anchor: Option<ValidatedCoordinate>,
    },
    Highlight(GroupId),
    ScrollIntoView(GroupId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionController {
    state: SelectionState,
    next_popup: u64,
    focus_level: u8,
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new(FOCUS_MAP_LEVEL)
    }
}

impl SelectionController {
    #[must_use]
    pub fn new(focus_level: u8) -> Self {
        Self {
            state: SelectionState::Idle,
            next_popup: 0,
            focus_level,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &SelectionState {
        &self.state
    }

    #[must_use]
    pub fn active(&self) -> Option<&GroupId> {
        match &self.state {
            SelectionState::Active { group_id, .. } => Some(group_id),
            SelectionState::Idle => None,
        }
    }

    #[must_use]
    pub fn is_active(&self, group_id: &GroupId) -> bool {
        self.active() == Some(group_id)
    }

    #[must_use]
    pub const fn focus_level(&self) -> u8 {
        self.focus_level
    }

    /// Applies one event.
    ///
    /// `current_level` is the map level before the transition and `locate`
    /// maps a group to its marker position, if it has one.
    pub fn apply<F>(
        &mut self,
        event: SelectionEvent,
        current_level: u8,
        locate: F,
    ) -> Vec<SelectionEffect>
    where
        F: Fn(&GroupId) -> Option<ValidatedCoordinate>,
    {
        let effects = match event {
            SelectionEvent::SelectMarker(group_id) => {
                let anchor = locate(&group_id);
                let mut effects = self.select(group_id.clone(), anchor, current_level);
                effects.push(SelectionEffect::ScrollIntoView(group_id));
                effects
            }
            SelectionEvent::SelectListItem(group_id) => {
                let anchor = locate(&group_id);
                self.select(group_id, anchor, current_level)
            }
            SelectionEvent::ToggleListItem(group_id) => {
                if self.is_active(&group_id) {
                    self.close_active()
                } else {
                    Vec::new()
                }
            }
            SelectionEvent::ExternalClose => match std::mem::take(&mut self.state) {
                SelectionState::Active { group_id, .. } => {
                    vec![SelectionEffect::ClearHighlight(group_id)]
                }
                SelectionState::Idle => Vec::new(),
            },
        };

        debug!(state = ?self.state, effects = effects.len(), "selection transition");
        effects
    }

    fn close_active(&mut self) -> Vec<SelectionEffect> {
        match std::mem::take(&mut self.state) {
            SelectionState::Active { group_id, popup } => vec![
                SelectionEffect::ClosePopup(popup),
                SelectionEffect::ClearHighlight(group_id),
            ],
            SelectionState::Idle => Vec::new(),
        }
    }

    fn select(
        &mut self,
        group_id: GroupId,
        anchor: Option<ValidatedCoordinate>,
        current_level: u8,
    ) -> Vec<SelectionEffect> {
        let mut effects = self.close_active();

        if let Some(center) = anchor {
            effects.push(SelectionEffect::FocusViewport {
                center,
                level: current_level.min(self.focus_level),
            });
        }

        let popup = PopupHandle(self.next_popup);
        self.next_popup += 1;

        effects.push(SelectionEffect::OpenPopup {
            group_id: group_id.clone(),
            popup,
            anchor,
        });
        effects.push(SelectionEffect::Highlight(group_id.clone()));

        self.state = SelectionState::Active { group_id, popup };
        effects
    }
}
