use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::capabilities::Capabilities;
use crate::config::{check_level, MapConfig};
use crate::event::Event;
use crate::geo::ValidatedCoordinate;
use crate::group::{decode_groups, GroupId};
use crate::model::{LoadState, Model};
use crate::region::{Place, RegionIndex};
use crate::selection::SelectionEvent;
use crate::view::{
    ListItemView, MarkerView, PopupView, RegionNodeView, UserFacingError, ViewModel, ViewportView,
};
use crate::{
    AppError, AppResult, ErrorKind, GROUP_ID_PREVIEW_LENGTH, MARKER_HALO_RADIUS_M, MAX_MAP_LEVEL,
    MIN_MAP_LEVEL,
};

const NO_LOCATION_TEXT: &str = "No location info";
const EMPTY_GROUPS_TEXT: &str = "No pothole groups to display.";

#[derive(Default)]
pub struct App;

fn transport_failure(e: crux_http::Error, resource: &str) -> AppError {
    let err = match e {
        crux_http::Error::Http(e) => AppError::from_http_status(e.code.into(), e.body.as_deref()),
        crux_http::Error::Json(reason) => AppError::new(
            ErrorKind::Deserialization,
            format!("{resource} response could not be decoded"),
        )
        .with_internal(reason),
        other => AppError::new(ErrorKind::Network, format!("failed to fetch {resource}"))
            .with_internal(other.to_string()),
    };
    err.with_context("resource", resource)
}

/// Decodes an HTTP completion as JSON, mapping transport failures,
/// non-success statuses and malformed bodies onto [`AppError`].
fn decode_json<T: DeserializeOwned>(
    result: crux_http::Result<crux_http::Response<Vec<u8>>>,
    resource: &str,
) -> AppResult<T> {
    let mut response = result.map_err(|e| transport_failure(e, resource))?;

    let status: u16 = response.status().into();
    let body = response.take_body();
    if !(200..300).contains(&status) {
        return Err(AppError::from_http_status(status, body.as_deref())
            .with_context("resource", resource));
    }

    let body = body.ok_or_else(|| {
        AppError::new(ErrorKind::Deserialization, format!("{resource} response had no body"))
            .with_context("resource", resource)
    })?;

    serde_json::from_slice(&body).map_err(|e| {
        AppError::new(
            ErrorKind::Deserialization,
            format!("{resource} response could not be decoded"),
        )
        .with_internal(e.to_string())
        .with_context("resource", resource)
    })
}

impl App {
    fn start(model: &mut Model, caps: &Capabilities, base_url: Option<String>) {
        if model.load_state != LoadState::NotStarted {
            warn!(state = ?model.load_state, "load pipeline already started; ignoring");
            return;
        }

        let config = match base_url {
            Some(base) => MapConfig::with_base_url(&base),
            None => Ok(MapConfig::default()),
        }
        .and_then(|config| config.validate().map(|()| config));

        match config {
            Ok(config) => {
                *model = Model::new(config);
                model.load_state = LoadState::LoadingPlaces;
                info!(url = %model.config.places_url, "loading place hierarchy");
                caps.http
                    .get(&model.config.places_url)
                    .send(Event::PlacesLoaded);
            }
            Err(e) => {
                let e = AppError::from(e);
                error!(error = %e, "invalid map configuration; nothing will be loaded");
                Self::fail(model, e);
            }
        }
    }

    fn fail(model: &mut Model, e: AppError) {
        model.load_state = LoadState::Failed;
        model.set_error(e);
    }

    #[instrument(skip_all)]
    fn on_places_loaded(
        model: &mut Model,
        caps: &Capabilities,
        places: Result<Vec<Place>, AppError>,
    ) {
        if model.load_state != LoadState::LoadingPlaces {
            warn!(state = ?model.load_state, "unexpected place hierarchy completion");
            return;
        }

        match places {
            Ok(places) => {
                info!(roots = places.len(), "place hierarchy loaded");
                model.regions =
                    RegionIndex::with_threshold(places, model.config.sub_region_threshold_km);
                model.load_state = LoadState::LoadingGroups;
                caps.http
                    .get(&model.config.groups_url)
                    .send(Event::GroupsLoaded);
            }
            Err(e) => {
                // Group resolution depends on the hierarchy: stop here.
                error!(error = %e, "failed to load place hierarchy");
                Self::fail(model, e);
            }
        }
    }

    #[instrument(skip_all)]
    fn on_groups_loaded(model: &mut Model, records: Result<Vec<Value>, AppError>) {
        if model.load_state != LoadState::LoadingGroups {
            warn!(state = ?model.load_state, "unexpected group listing completion");
            return;
        }

        match records {
            Ok(records) => {
                let decoded = decode_groups(&records);
                if decoded.groups.is_empty() {
                    info!(skipped = decoded.skipped, "no pothole groups to display");
                } else {
                    info!(
                        groups = decoded.groups.len(),
                        skipped = decoded.skipped,
                        degraded = decoded.degraded,
                        "pothole groups loaded"
                    );
                }
                model.skipped_records = decoded.skipped;
                model.install_groups(decoded.groups);
                model.load_state = LoadState::Ready;
            }
            Err(e) => {
                error!(error = %e, "failed to load pothole groups");
                Self::fail(model, e);
            }
        }
    }

    fn known_group(model: &Model, group_id: &GroupId, event_name: &str) -> bool {
        if model.load_state != LoadState::Ready {
            warn!(event = event_name, %group_id, "selection before groups are loaded; ignoring");
            return false;
        }
        if model.group(group_id).is_none() {
            warn!(event = event_name, %group_id, "unknown group; ignoring");
            return false;
        }
        true
    }

    fn focus_region(model: &mut Model, root: usize, child: Option<usize>) {
        let Some(place) = model.regions.place(root, child) else {
            warn!(root, ?child, "region click outside the hierarchy; ignoring");
            return;
        };
        match ValidatedCoordinate::new(place.lat, place.lng) {
            Ok(center) => {
                let level = place.focus_level();
                debug!(region = %place.name, level, "moving to region");
                model.viewport.move_to(center, level);
            }
            Err(e) => warn!(region = %place.name, error = %e, "region has an invalid coordinate"),
        }
    }

    fn track_viewport(model: &mut Model, lat: f64, lng: f64, level: u8) {
        let level = match check_level(level) {
            Ok(()) => level,
            Err(e) => {
                warn!(error = %e, "shell reported an out-of-range map level; clamping");
                level.clamp(MIN_MAP_LEVEL, MAX_MAP_LEVEL)
            }
        };
        match ValidatedCoordinate::new(lat, lng) {
            Ok(center) => model.viewport.move_to(center, level),
            Err(e) => warn!(error = %e, "shell reported an invalid map center"),
        }
    }

    fn build_markers(model: &Model) -> Vec<MarkerView> {
        let active = model.selection.active();
        model
            .groups
            .iter()
            .zip(&model.presentations)
            .filter_map(|(group, presentation)| {
                let location = group.location?;
                Some(MarkerView {
                    group_id: group.group_id.0.clone(),
                    lat: location.lat(),
                    lng: location.lng(),
                    stroke_color: presentation.marker_color.stroke.clone(),
                    fill_color: presentation.marker_color.fill.clone(),
                    halo_radius_m: MARKER_HALO_RADIUS_M,
                    is_active: active == Some(&group.group_id),
                })
            })
            .collect()
    }

    fn build_list_items(model: &Model) -> Vec<ListItemView> {
        model
            .groups
            .iter()
            .zip(&model.presentations)
            .map(|(group, presentation)| ListItemView {
                group_id: group.group_id.0.clone(),
                short_id: group.group_id.preview(GROUP_ID_PREVIEW_LENGTH),
                status_text: group.status_text.clone(),
                status_color: presentation.status_color.clone(),
                report_count: group.report_count,
                region_text: if presentation.region_label.is_empty() {
                    NO_LOCATION_TEXT.to_string()
                } else {
                    presentation.region_label.clone()
                },
                region_color: presentation.region_color.clone(),
                reported_at: group.latest_reported_at.display(),
                is_active: model.highlighted.as_ref() == Some(&group.group_id),
            })
            .collect()
    }

    fn build_popup(model: &Model) -> Option<PopupView> {
        let popup = model.popup.as_ref()?;
        let (idx, group) = model.group(&popup.group_id)?;
        Some(PopupView {
            group_id: group.group_id.0.clone(),
            status_text: group.status_text.clone(),
            status_color: model.presentations.get(idx)?.status_color.clone(),
            report_count: group.report_count,
            report_ids_text: format!("[ {} ]", group.report_ids.join(", ")),
            anchor_lat: popup.anchor.map(ValidatedCoordinate::lat),
            anchor_lng: popup.anchor.map(ValidatedCoordinate::lng),
        })
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        let event_name = event.name();
        if event.is_user_initiated() {
            debug!(event = event_name, "user action");
        }

        // The list scrolls once per marker click, not on every later render.
        model.scroll_target = None;

        match event {
            Event::AppStarted { base_url } => Self::start(model, caps, base_url),

            Event::PlacesLoaded(result) => {
                Self::on_places_loaded(model, caps, decode_json(result, "place hierarchy"));
            }

            Event::GroupsLoaded(result) => {
                Self::on_groups_loaded(model, decode_json(result, "pothole groups"));
            }

            Event::MarkerClicked { group_id } => {
                if Self::known_group(model, &group_id, event_name) {
                    model.dispatch_selection(SelectionEvent::SelectMarker(group_id));
                }
            }

            Event::ListItemClicked { group_id } => {
                if Self::known_group(model, &group_id, event_name) {
                    let selection = if model.selection.is_active(&group_id) {
                        SelectionEvent::ToggleListItem(group_id)
                    } else {
                        SelectionEvent::SelectListItem(group_id)
                    };
                    model.dispatch_selection(selection);
                }
            }

            Event::PopupClosed => {
                // The popup is already gone on screen.
                model.popup = None;
                model.dispatch_selection(SelectionEvent::ExternalClose);
            }

            Event::RegionClicked { root, child } => Self::focus_region(model, root, child),

            Event::MapMoved { lat, lng, level } => Self::track_viewport(model, lat, lng, level),
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        let empty_message = (model.load_state == LoadState::Ready && model.groups.is_empty())
            .then(|| EMPTY_GROUPS_TEXT.to_string());

        ViewModel {
            load_state: model.load_state,
            markers: Self::build_markers(model),
            list_items: Self::build_list_items(model),
            popup: Self::build_popup(model),
            regions: model.regions.roots().iter().map(RegionNodeView::from).collect(),
            viewport: ViewportView {
                center_lat: model.viewport.center.lat(),
                center_lng: model.viewport.center.lng(),
                level: model.viewport.level,
                fit_bounds: model.viewport.fit_bounds,
            },
            scroll_to: model.scroll_target.as_ref().map(|id| id.0.clone()),
            empty_message,
            error: model.active_error.as_ref().map(UserFacingError::from),
        }
    }
}
