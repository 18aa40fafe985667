//! Integration tests for wialon-client
//!
//! These tests run sessions against a scripted Remote API endpoint served over
//! real HTTP, and check both the results and the exact call sequence.

use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use serde_json::{json, Value};
use wialon_client::testing::{MockApi, TestServer};
use wialon_client::{
    ErrorKind, Exchange, IntervalQuery, ResponseSink, Session, SessionState, WialonError,
};

// =============================================================================
// Test Helpers
// =============================================================================

async fn create_test_server(api: &MockApi) -> TestServer {
    TestServer::start(api.router())
        .await
        .expect("Failed to start test server")
}

fn logged_in_api() -> MockApi {
    MockApi::new().with_login("S1", "alice", 42)
}

fn data_messages(times: &[i64]) -> Value {
    let messages: Vec<Value> = times
        .iter()
        .map(|t| json!({ "t": t, "f": 1, "tp": "ud", "pos": { "y": 53.9, "x": 27.56 }, "p": {} }))
        .collect();
    json!({ "count": times.len(), "messages": messages })
}

#[derive(Default)]
struct RecordingSink {
    methods: Mutex<Vec<String>>,
}

impl ResponseSink for RecordingSink {
    fn store(&self, exchange: &Exchange<'_>) {
        self.methods.lock().push(exchange.method.to_string());
    }
}

// =============================================================================
// Login / Logout Tests
// =============================================================================

#[tokio::test]
async fn test_login() {
    let api = logged_in_api();
    let server = create_test_server(&api).await;

    let mut session = server.open_session("token").await.unwrap();
    assert_eq!(session.state(), SessionState::Authenticated);
    assert_eq!(session.sid(), Some("S1"));
    assert_eq!(session.username(), Some("alice"));
    assert_eq!(session.account_id(), Some(42));
    assert_eq!(session.session_info()["eid"], "S1");

    let calls = api.calls();
    assert_eq!(calls[0].svc, "token/login");
    assert_eq!(calls[0].params, json!({ "token": "token" }));
    assert_eq!(calls[0].sid, None);

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_login_is_idempotent() {
    let api = logged_in_api();
    let server = create_test_server(&api).await;

    let mut session = server.open_session("token").await.unwrap();
    session.login().await.unwrap();
    assert_eq!(api.services(), vec!["token/login"]);

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_login_rejected() {
    let api = MockApi::new().respond("token/login", json!({ "error": 8 }));
    let server = create_test_server(&api).await;

    let mut session = server.builder("bad-token").build().unwrap();
    let err = session.login().await.unwrap_err();

    assert!(err.is_authentication());
    assert_eq!(err.code(), Some(8));
    assert_eq!(session.state(), SessionState::Disconnected);
    assert_eq!(session.sid(), None);

    // Nothing to log out from
    session.close().await.unwrap();
    assert_eq!(api.services(), vec!["token/login"]);
}

#[tokio::test]
async fn test_login_with_empty_sid_fails() {
    let api = MockApi::new().respond(
        "token/login",
        json!({ "eid": "", "user": { "nm": "alice", "id": 43, "bact": 42 } }),
    );
    let server = create_test_server(&api).await;

    let mut session = server.builder("token").build().unwrap();
    let err = session.login().await.unwrap_err();

    assert!(matches!(err, WialonError::ParseError(_)));
    assert_eq!(session.state(), SessionState::Disconnected);
    assert_eq!(session.sid(), None);
    assert_eq!(session.username(), None);
}

#[tokio::test]
async fn test_logout_sends_sid() {
    let api = logged_in_api();
    let server = create_test_server(&api).await;

    let mut session = server.open_session("token").await.unwrap();
    session.close().await.unwrap();

    assert_eq!(session.state(), SessionState::Disconnected);
    assert_eq!(session.sid(), None);
    let calls = api.calls();
    assert_eq!(calls[1].svc, "core/logout");
    assert_eq!(calls[1].sid.as_deref(), Some("S1"));

    // Closing twice does nothing
    session.close().await.unwrap();
    assert_eq!(api.calls().len(), 2);
}

#[tokio::test]
async fn test_logout_tolerates_expired_session() {
    let api = logged_in_api().respond("core/logout", json!({ "error": 1 }));
    let server = create_test_server(&api).await;

    let mut session = server.open_session("token").await.unwrap();
    session.close().await.unwrap();
    assert_eq!(session.state(), SessionState::Disconnected);
}

#[tokio::test]
async fn test_logout_failure_still_releases() {
    let api = logged_in_api().respond("core/logout", json!({ "error": 5 }));
    let server = create_test_server(&api).await;

    let mut session = server.open_session("token").await.unwrap();
    let err = session.close().await.unwrap_err();

    assert_eq!(err.code(), Some(5));
    assert_eq!(session.state(), SessionState::Disconnected);
    assert_eq!(session.sid(), None);
}

// =============================================================================
// Service Call Tests
// =============================================================================

#[tokio::test]
async fn test_call_error_classification() {
    let api = logged_in_api()
        .respond("core/search_item", json!({ "error": 7, "reason": "ACCESS_DENIED" }))
        .respond("core/duplicate", json!({ "error": 4 }));
    let server = create_test_server(&api).await;

    let mut session = server.open_session("token").await.unwrap();

    let err = session
        .call("core/search_item", json!({ "id": 1, "flags": 1 }))
        .await
        .unwrap_err();
    let api_err = err.api().unwrap();
    assert_eq!(api_err.kind, ErrorKind::Authentication);
    assert_eq!(api_err.reason.as_deref(), Some("ACCESS_DENIED"));
    assert_eq!(api_err.sid.as_deref(), Some("S1"));

    let err = session.call("core/duplicate", json!({})).await.unwrap_err();
    assert!(err.is_invalid_input());

    let err = session.call("core/unknown", json!({})).await.unwrap_err();
    assert_eq!(err.api().unwrap().kind, ErrorKind::Generic);

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_call_after_close() {
    let api = logged_in_api();
    let server = create_test_server(&api).await;

    let mut session = server.open_session("token").await.unwrap();
    session.close().await.unwrap();

    let err = session.load_units(None).await.unwrap_err();
    assert!(matches!(err, WialonError::NotAuthenticated));
    assert_eq!(api.services(), vec!["token/login", "core/logout"]);
}

#[tokio::test]
async fn test_sink_receives_exchanges() {
    let api = logged_in_api().respond("core/search_items", json!({ "items": [] }));
    let server = create_test_server(&api).await;
    let sink = Arc::new(RecordingSink::default());

    let mut session = server
        .builder("token")
        .sink(sink.clone())
        .open()
        .await
        .unwrap();
    session.load_units(None).await.unwrap();
    session.close().await.unwrap();

    assert_eq!(
        *sink.methods.lock(),
        vec!["token/login", "core/search_items", "core/logout"]
    );
}

#[tokio::test]
async fn test_dump_dir_writes_files() {
    let dir = tempfile::tempdir().unwrap();
    let api = logged_in_api();
    let server = create_test_server(&api).await;

    let config = server.config();
    let config = wialon_client::SessionConfig {
        dump_dir: Some(dir.path().to_path_buf()),
        ..config
    };
    let mut session = Session::open("token", config).await.unwrap();
    session.close().await.unwrap();

    let count = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(count, 2);
}

// =============================================================================
// Scoped Session Tests
// =============================================================================

#[tokio::test]
async fn test_scoped_logs_out() {
    let api = logged_in_api().respond(
        "core/search_items",
        json!({ "totalItemsCount": 1, "items": [{ "id": 7, "nm": "Truck" }] }),
    );
    let server = create_test_server(&api).await;

    let units = Session::scoped(server.builder("token"), |session| {
        async move { session.load_units(None).await }.boxed()
    })
    .await
    .unwrap();

    assert_eq!(units.len(), 1);
    assert_eq!(units[0].name, "Truck");
    assert_eq!(
        api.services(),
        vec!["token/login", "core/search_items", "core/logout"]
    );
}

#[tokio::test]
async fn test_scoped_logs_out_on_error() {
    let api = logged_in_api()
        .respond("core/search_items", json!({ "error": 6 }))
        .respond("core/logout", json!({ "error": 5 }));
    let server = create_test_server(&api).await;

    let err = Session::scoped(server.builder("token"), |session| {
        async move { session.load_units(None).await }.boxed()
    })
    .await
    .unwrap_err();

    // The body's error wins over the logout error
    assert_eq!(err.code(), Some(6));
    assert_eq!(api.services().last().map(String::as_str), Some("core/logout"));
}

// =============================================================================
// Unit / Account Tests
// =============================================================================

#[tokio::test]
async fn test_load_units() {
    let api = logged_in_api().respond(
        "core/search_items",
        json!({
            "totalItemsCount": 2,
            "items": [
                { "id": 7, "nm": "Truck", "cls": 2, "mu": 0, "uacl": 19327369763u64 },
                { "id": 8, "nm": "Van" }
            ]
        }),
    );
    let server = create_test_server(&api).await;
    let mut session = server.open_session("token").await.unwrap();

    let units = session.load_units(None).await.unwrap();
    assert_eq!(units.len(), 2);
    assert_eq!(units[0].id, 7);
    assert_eq!(units[1].name, "Van");

    let params = &api.calls()[1].params;
    assert_eq!(params["spec"]["itemsType"], "avl_unit");
    assert_eq!(params["flags"], 1);

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_get_account_data() {
    let api = logged_in_api().respond("account/get_account_data", json!({ "plan": "basic" }));
    let server = create_test_server(&api).await;
    let mut session = server.open_session("token").await.unwrap();

    let data = session.get_account_data().await.unwrap();
    assert_eq!(data["plan"], "basic");
    assert_eq!(api.calls()[1].params, json!({ "itemId": 42, "type": 1 }));

    session.close().await.unwrap();
}

// =============================================================================
// Message Tests
// =============================================================================

#[tokio::test]
async fn test_count_messages() {
    let api = logged_in_api()
        .respond_once("messages/unload", json!({ "error": 4 }))
        .respond("messages/unload", json!({}))
        .respond("messages/load_interval", json!({ "count": 3, "messages": [] }));
    let server = create_test_server(&api).await;
    let mut session = server.open_session("token").await.unwrap();

    let query = IntervalQuery::new(7, 1_600_000_000, 1_600_086_400);
    let count = session.count_messages(&query).await.unwrap();
    assert_eq!(count, 3);

    let calls = api.calls();
    let services: Vec<&str> = calls.iter().map(|c| c.svc.as_str()).collect();
    assert_eq!(
        services,
        vec![
            "token/login",
            "messages/unload",
            "messages/load_interval",
            "messages/unload"
        ]
    );
    assert_eq!(
        calls[2].params,
        json!({
            "itemId": 7,
            "timeFrom": 1_600_000_000i64,
            "timeTo": 1_600_086_400i64,
            "flags": 0,
            "flagsMask": 0xFF00,
            "loadCount": 0
        })
    );

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_load_messages_with_sensors() {
    let api = logged_in_api()
        .respond("messages/unload", json!({}))
        .respond("messages/load_interval", data_messages(&[100, 160]))
        .respond(
            "unit/calc_sensors",
            json!([{ "1": 12.5 }, { "1": 13.0 }]),
        );
    let server = create_test_server(&api).await;
    let mut session = server.open_session("token").await.unwrap();

    let query = IntervalQuery::new(7, 0, 200);
    let batch = session.load_messages(&query, true).await.unwrap();

    assert_eq!(batch.count, 2);
    assert_eq!(batch.messages[0].time, 100);
    assert_eq!(batch.messages[0].sensors, Some(json!({ "1": 12.5 })));
    assert_eq!(batch.messages[1].sensors, Some(json!({ "1": 13.0 })));
    assert_eq!(batch.messages[1].position.unwrap().latitude, 53.9);

    let calls = api.calls();
    assert_eq!(calls[2].params["loadCount"], 0xFFFF_FFFFu32);
    assert_eq!(calls[3].svc, "unit/calc_sensors");
    assert_eq!(calls[3].params["indexFrom"], 0);
    assert_eq!(calls[3].params["indexTo"], 1);
    assert_eq!(calls[3].params["unitId"], 7);
    assert_eq!(calls[4].svc, "messages/unload");

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_load_messages_without_sensors() {
    let api = logged_in_api()
        .respond("messages/unload", json!({}))
        .respond("messages/load_interval", data_messages(&[100]));
    let server = create_test_server(&api).await;
    let mut session = server.open_session("token").await.unwrap();

    let batch = session
        .load_messages(&IntervalQuery::new(7, 0, 200), false)
        .await
        .unwrap();
    assert_eq!(batch.messages.len(), 1);
    assert!(batch.messages[0].sensors.is_none());
    assert!(!api.services().iter().any(|s| s == "unit/calc_sensors"));

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_sensor_mismatch_still_unloads() {
    let api = logged_in_api()
        .respond("messages/unload", json!({}))
        .respond("messages/load_interval", data_messages(&[100, 160, 220]))
        .respond("unit/calc_sensors", json!([{}, {}]));
    let server = create_test_server(&api).await;
    let mut session = server.open_session("token").await.unwrap();

    let err = session
        .load_messages(&IntervalQuery::new(7, 0, 300), true)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WialonError::SensorDataMismatch {
            messages: 3,
            sensors: 2
        }
    ));
    assert_eq!(
        api.services().last().map(String::as_str),
        Some("messages/unload")
    );

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_load_error_still_unloads() {
    let api = logged_in_api()
        .respond("messages/unload", json!({}))
        .respond("messages/load_interval", json!({ "error": 7 }));
    let server = create_test_server(&api).await;
    let mut session = server.open_session("token").await.unwrap();

    let err = session
        .count_messages(&IntervalQuery::new(7, 0, 300))
        .await
        .unwrap_err();
    assert!(err.is_authentication());
    assert_eq!(
        api.services(),
        vec![
            "token/login",
            "messages/unload",
            "messages/load_interval",
            "messages/unload"
        ]
    );

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_initial_unload_error_aborts_load() {
    let api = logged_in_api()
        .respond("messages/unload", json!({ "error": 5 }))
        .respond("messages/load_interval", json!({ "count": 3, "messages": [] }));
    let server = create_test_server(&api).await;
    let mut session = server.open_session("token").await.unwrap();

    let err = session
        .count_messages(&IntervalQuery::new(7, 0, 300))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(5));
    assert_eq!(api.services(), vec!["token/login", "messages/unload"]);

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_final_unload_error_surfaces() {
    let api = logged_in_api()
        .respond_once("messages/unload", json!({}))
        .respond("messages/unload", json!({ "error": 5 }))
        .respond("messages/load_interval", json!({ "count": 3, "messages": [] }));
    let server = create_test_server(&api).await;
    let mut session = server.open_session("token").await.unwrap();

    let err = session
        .count_messages(&IntervalQuery::new(7, 0, 300))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(5));
    assert_eq!(
        api.services(),
        vec![
            "token/login",
            "messages/unload",
            "messages/load_interval",
            "messages/unload"
        ]
    );

    session.close().await.unwrap();
}

// =============================================================================
// Area Tests
// =============================================================================

fn resources_response() -> Value {
    json!({
        "totalItemsCount": 2,
        "items": [
            {
                "id": 10,
                "nm": "Main",
                "zl": {
                    "2": { "id": 2, "n": "Depot", "d": "", "t": 3 },
                    "1": { "id": 1, "n": "Yard", "d": "north", "t": 2 }
                }
            },
            {
                "id": 20,
                "nm": "Other",
                "zl": {
                    "5": { "id": 5, "n": "Route", "d": "", "t": 1 }
                }
            }
        ]
    })
}

#[tokio::test]
async fn test_list_areas() {
    let api = logged_in_api().respond("core/search_items", resources_response());
    let server = create_test_server(&api).await;
    let mut session = server.open_session("token").await.unwrap();

    let areas = session.list_areas(false).await.unwrap();
    let ids: Vec<(i64, i64)> = areas.iter().map(|a| (a.resource_id, a.id)).collect();
    assert_eq!(ids, vec![(10, 1), (10, 2), (20, 5)]);
    assert_eq!(api.calls()[1].params["flags"], 0x1001);

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_list_areas_with_detail() {
    let api = logged_in_api()
        .respond("core/search_items", resources_response())
        .respond_once(
            "resource/get_zone_data",
            json!([
                { "id": 1, "n": "Yard", "d": "north", "t": 2,
                  "p": [{ "y": 0.0, "x": 0.0 }, { "y": 0.0, "x": 1.0 }, { "y": 1.0, "x": 1.0 }] },
                { "id": 2, "n": "Depot", "d": "", "t": 3, "w": 100.0,
                  "p": [{ "y": 53.9, "x": 27.56, "r": 250.0 }] }
            ]),
        )
        .respond_once(
            "resource/get_zone_data",
            json!([
                { "id": 5, "n": "Route", "d": "", "t": 1, "w": 10.0,
                  "p": [{ "y": 0.0, "x": 0.0 }, { "y": 1.0, "x": 1.0 }] }
            ]),
        );
    let server = create_test_server(&api).await;
    let mut session = server.open_session("token").await.unwrap();

    let areas = session.load_areas().await.unwrap();
    assert_eq!(areas.len(), 3);
    assert!(areas[0].is_polygon());
    assert!(areas[1].is_circle());
    assert!(areas[2].is_line());
    assert_eq!(areas[0].to_string(), "Yard (north)");
    assert_eq!(areas[2].resource_id, 20);

    assert!(areas[1].contains(53.9, 27.56).unwrap());
    assert!(areas[2].contains(0.5, 0.5).is_err());

    let calls = api.calls();
    assert_eq!(calls[2].params, json!({ "itemId": 10, "col": [1, 2], "flag": 0x10 }));
    assert_eq!(calls[3].params, json!({ "itemId": 20, "col": [5], "flag": 0x10 }));

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_search_areas_by_point() {
    let api = logged_in_api()
        .respond(
            "resource/get_zones_by_point",
            json!({ "42": { "9": 0.0, "3": 120.5 } }),
        )
        .respond(
            "resource/get_zone_data",
            json!([
                { "id": 3, "n": "Yard", "d": "", "t": 2, "p": [] },
                { "id": 9, "n": "Depot", "d": "", "t": 3, "p": [{ "y": 1.0, "x": 2.0, "r": 10.0 }] }
            ]),
        );
    let server = create_test_server(&api).await;
    let mut session = server.open_session("token").await.unwrap();

    let matches = session
        .search_areas_by_point(53.9, 27.56, None, 500, true)
        .await
        .unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].0.id, 3);
    assert_eq!(matches[0].1, 120.5);
    assert_eq!(matches[0].0.resource_id, 42);
    assert_eq!(matches[1].0.detail.as_ref().unwrap().name, "Depot");

    let calls = api.calls();
    assert_eq!(
        calls[1].params,
        json!({ "spec": { "zoneId": { "42": [] }, "lat": 53.9, "lon": 27.56, "radius": 500 } })
    );
    assert_eq!(calls[2].params["itemId"], 42);
    assert_eq!(calls[2].params["col"], json!([3, 9]));

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_search_areas_no_match() {
    let api = logged_in_api().respond("resource/get_zones_by_point", json!({}));
    let server = create_test_server(&api).await;
    let mut session = server.open_session("token").await.unwrap();

    let matches = session
        .search_areas_by_point(0.0, 0.0, Some(10), 0, true)
        .await
        .unwrap();
    assert!(matches.is_empty());
    assert!(!api.services().iter().any(|s| s == "resource/get_zone_data"));

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_get_area_detail_not_found() {
    let api = logged_in_api().respond("resource/get_zone_data", json!([]));
    let server = create_test_server(&api).await;
    let mut session = server.open_session("token").await.unwrap();

    let err = session.get_area_detail(10, 99, None).await.unwrap_err();
    assert!(matches!(
        err,
        WialonError::AreaNotFound {
            resource_id: 10,
            area_id: 99
        }
    ));

    // Empty id list never reaches the server
    let records = session.get_areas_detail(&[], None, None).await.unwrap();
    assert!(records.is_empty());
    assert_eq!(api.services().len(), 2);

    session.close().await.unwrap();
}
