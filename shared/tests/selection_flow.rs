use crux_core::testing::AppTester;
use crux_http::testing::ResponseBuilder;
use crux_http::Response;
use pothole_shared::{App, Effect, Event, GroupId, LoadState, Model, Place};
use serde::Serialize;
use serde_json::json;

fn json_response<T: Serialize>(body: &T) -> Response<Vec<u8>> {
    ResponseBuilder::ok()
        .body(serde_json::to_vec(body).unwrap())
        .build()
}

fn loaded(app: &AppTester<App, Effect>) -> Model {
    let mut model = Model::default();
    app.update(Event::AppStarted { base_url: None }, &mut model);

    let places = vec![Place::new("춘천시", 37.8813, 127.7300)
        .with_children(vec![Place::new("신북읍", 37.9300, 127.7600).with_level(4)])];
    let response = json_response(&places);
    app.update(Event::PlacesLoaded(Ok(response)), &mut model);

    let records = vec![
        json!({"group_id": "g1", "latitude": 37.8800, "longitude": 127.7310,
               "status": "RECEIVED", "report_count": 2, "report_ids": [11, 12],
               "latest_reported_at": "2024-07-01T09:00:00"}),
        json!({"group_id": "g2", "latitude": 37.9290, "longitude": 127.7610,
               "status": "DONE", "report_count": 1, "report_ids": [15],
               "latest_reported_at": "2024-07-02T09:00:00"}),
        json!({"group_id": "g3", "status": "RECEIVED", "report_count": 1,
               "report_ids": [20], "latest_reported_at": "2024-07-03T09:00:00"}),
    ];
    let response = json_response(&records);
    app.update(Event::GroupsLoaded(Ok(response)), &mut model);
    assert_eq!(model.load_state, LoadState::Ready);
    model
}

fn active_markers(app: &AppTester<App, Effect>, model: &Model) -> Vec<String> {
    app.view(model)
        .markers
        .into_iter()
        .filter(|m| m.is_active)
        .map(|m| m.group_id)
        .collect()
}

fn active_items(app: &AppTester<App, Effect>, model: &Model) -> Vec<String> {
    app.view(model)
        .list_items
        .into_iter()
        .filter(|i| i.is_active)
        .map(|i| i.group_id)
        .collect()
}

#[test]
fn test_marker_selection() {
    let app = AppTester::<App, Effect>::default();
    let mut model = loaded(&app);

    let update = app.update(
        Event::MarkerClicked {
            group_id: GroupId::new("g1"),
        },
        &mut model,
    );
    assert!(update.effects.iter().any(|e| matches!(e, Effect::Render(_))));

    let view = app.view(&model);
    let popup = view.popup.expect("popup for g1");
    assert_eq!(popup.group_id, "g1");
    assert_eq!(popup.report_ids_text, "[ 11, 12 ]");
    assert_eq!(popup.status_color, "#dc3545");
    assert_eq!(view.viewport.level, 3);
    assert_eq!(view.viewport.center_lat, 37.8800);
    assert!(view.viewport.fit_bounds.is_none());
    assert_eq!(view.scroll_to.as_deref(), Some("g1"));
    assert_eq!(active_markers(&app, &model), ["g1"]);
    assert_eq!(active_items(&app, &model), ["g1"]);
}

#[test]
fn test_switching_selection_keeps_one_active() {
    let app = AppTester::<App, Effect>::default();
    let mut model = loaded(&app);

    for id in ["g1", "g2", "g1"] {
        app.update(
            Event::MarkerClicked {
                group_id: GroupId::new(id),
            },
            &mut model,
        );
        assert_eq!(active_items(&app, &model), [id]);
        assert_eq!(active_markers(&app, &model), [id]);
        assert_eq!(app.view(&model).popup.map(|p| p.group_id).as_deref(), Some(id));
    }
}

#[test]
fn test_list_click_toggles() {
    let app = AppTester::<App, Effect>::default();
    let mut model = loaded(&app);

    app.update(
        Event::ListItemClicked {
            group_id: GroupId::new("g2"),
        },
        &mut model,
    );
    let view = app.view(&model);
    assert_eq!(view.popup.map(|p| p.group_id).as_deref(), Some("g2"));
    assert_eq!(view.viewport.center_lat, 37.9290);
    assert!(view.scroll_to.is_none(), "list selection does not scroll the list");

    app.update(
        Event::ListItemClicked {
            group_id: GroupId::new("g2"),
        },
        &mut model,
    );
    let view = app.view(&model);
    assert!(view.popup.is_none());
    assert!(active_items(&app, &model).is_empty());
    assert!(active_markers(&app, &model).is_empty());
}

#[test]
fn test_popup_close_clears_highlight() {
    let app = AppTester::<App, Effect>::default();
    let mut model = loaded(&app);

    app.update(
        Event::MarkerClicked {
            group_id: GroupId::new("g1"),
        },
        &mut model,
    );
    app.update(Event::PopupClosed, &mut model);

    let view = app.view(&model);
    assert!(view.popup.is_none());
    assert!(active_items(&app, &model).is_empty());

    // A list click after closing selects again rather than toggling off.
    app.update(
        Event::ListItemClicked {
            group_id: GroupId::new("g1"),
        },
        &mut model,
    );
    assert_eq!(active_items(&app, &model), ["g1"]);
}

#[test]
fn test_unlocated_group_opens_detached_popup() {
    let app = AppTester::<App, Effect>::default();
    let mut model = loaded(&app);
    let before = app.view(&model).viewport;

    app.update(
        Event::ListItemClicked {
            group_id: GroupId::new("g3"),
        },
        &mut model,
    );
    let view = app.view(&model);
    let popup = view.popup.expect("popup for g3");
    assert_eq!(popup.anchor_lat, None);
    assert_eq!(view.viewport.center_lat, before.center_lat);
    assert_eq!(active_items(&app, &model), ["g3"]);
}

#[test]
fn test_unknown_group_changes_nothing() {
    let app = AppTester::<App, Effect>::default();
    let mut model = loaded(&app);

    app.update(
        Event::MarkerClicked {
            group_id: GroupId::new("g1"),
        },
        &mut model,
    );
    app.update(
        Event::MarkerClicked {
            group_id: GroupId::new("missing"),
        },
        &mut model,
    );
    assert_eq!(app.view(&model).popup.map(|p| p.group_id).as_deref(), Some("g1"));
}

#[test]
fn test_region_navigation() {
    let app = AppTester::<App, Effect>::default();
    let mut model = loaded(&app);

    app.update(Event::RegionClicked { root: 0, child: Some(0) }, &mut model);
    let view = app.view(&model);
    assert_eq!(view.viewport.center_lat, 37.9300);
    assert_eq!(view.viewport.level, 4);

    app.update(Event::RegionClicked { root: 0, child: None }, &mut model);
    assert_eq!(app.view(&model).viewport.level, 5);

    // Selection never zooms out past the focus level, but keeps a closer one.
    app.update(
        Event::MapMoved {
            lat: 37.88,
            lng: 127.73,
            level: 2,
        },
        &mut model,
    );
    app.update(
        Event::MarkerClicked {
            group_id: GroupId::new("g1"),
        },
        &mut model,
    );
    assert_eq!(app.view(&model).viewport.level, 2);
}

#[test]
fn test_list_scrolls_once_per_marker_click() {
    let app = AppTester::<App, Effect>::default();
    let mut model = loaded(&app);

    app.update(
        Event::MarkerClicked {
            group_id: GroupId::new("g1"),
        },
        &mut model,
    );
    assert_eq!(app.view(&model).scroll_to.as_deref(), Some("g1"));

    app.update(
        Event::MapMoved {
            lat: 37.90,
            lng: 127.75,
            level: 4,
        },
        &mut model,
    );
    assert!(app.view(&model).scroll_to.is_none());

    app.update(Event::RegionClicked { root: 0, child: None }, &mut model);
    let view = app.view(&model);
    assert!(view.scroll_to.is_none());
    assert_eq!(view.popup.map(|p| p.group_id).as_deref(), Some("g1"));
}

#[test]
fn test_selection_level_stays_in_range() {
    let app = AppTester::<App, Effect>::default();
    let mut model = loaded(&app);

    app.update(
        Event::MapMoved {
            lat: 37.88,
            lng: 127.73,
            level: 0,
        },
        &mut model,
    );
    assert_eq!(app.view(&model).viewport.level, 1);

    app.update(
        Event::MarkerClicked {
            group_id: GroupId::new("g2"),
        },
        &mut model,
    );
    assert_eq!(app.view(&model).viewport.level, 1);
}
