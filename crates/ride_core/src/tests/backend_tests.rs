use super::*;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn spawn_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}

async fn assigning_handler(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.seen.lock().await.push((auth, body));
    Json(json!({
        "RideId": "ride-1",
        "Unicorn": {"Name": "Bob", "Color": "Golden", "Gender": "Male"},
        "Eta": 2,
        "Rider": "rider-1"
    }))
}

fn pin() -> Coordinate {
    Coordinate::new(47.6174, -122.2017).expect("coordinate")
}

#[tokio::test]
async fn http_backend_posts_pickup_with_token_and_decodes_assignment() {
    let state = ServerState::default();
    let router = Router::new()
        .route("/prod/ride", post(assigning_handler))
        .with_state(state.clone());
    let base = spawn_server(router).await;

    let backend = HttpRideBackend::new(
        &format!("{base}/prod"),
        DEFAULT_RIDE_PATH,
        "token-abc",
        Duration::from_secs(5),
    )
    .expect("backend");
    let assignment = backend.assign(pin()).await.expect("assignment");

    assert_eq!(assignment, RideAssignment::new("Bob", 2));
    let seen = state.seen.lock().await;
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0.as_deref(), Some("token-abc"));
    assert_eq!(seen[0].1["PickupLocation"]["Latitude"], 47.6174);
    assert_eq!(seen[0].1["PickupLocation"]["Longitude"], -122.2017);
}

#[tokio::test]
async fn http_backend_maps_unauthorized() {
    let router = Router::new().route("/ride", post(|| async { StatusCode::UNAUTHORIZED }));
    let base = spawn_server(router).await;

    let backend = HttpRideBackend::new(&base, "ride", "bad", Duration::from_secs(5))
        .expect("backend");
    let err = backend.assign(pin()).await.expect_err("should fail");
    assert_eq!(err, AssignmentError::Unauthorized);
}

#[tokio::test]
async fn http_backend_maps_server_error_status() {
    let router = Router::new().route(
        "/ride",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"Error": "no unicorns", "Reference": "req-9"})),
            )
        }),
    );
    let base = spawn_server(router).await;

    let backend =
        HttpRideBackend::new(&base, "/ride", "t", Duration::from_secs(5)).expect("backend");
    let err = backend.assign(pin()).await.expect_err("should fail");
    assert_eq!(err, AssignmentError::Status { status: 500 });
}

#[tokio::test]
async fn http_backend_reports_malformed_body_as_decode_error() {
    let router = Router::new().route("/ride", post(|| async { Json(json!({"Eta": "soon"})) }));
    let base = spawn_server(router).await;

    let backend =
        HttpRideBackend::new(&base, "/ride", "t", Duration::from_secs(5)).expect("backend");
    let err = backend.assign(pin()).await.expect_err("should fail");
    assert!(matches!(err, AssignmentError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn http_backend_reports_unreachable_server_as_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let backend = HttpRideBackend::new(
        &format!("http://{addr}"),
        "/ride",
        "t",
        Duration::from_secs(2),
    )
    .expect("backend");
    let err = backend.assign(pin()).await.expect_err("should fail");
    assert!(matches!(err, AssignmentError::Transport(_)), "got {err:?}");
}

#[test]
fn ride_endpoint_joins_stage_prefix_and_path() {
    assert_eq!(
        ride_endpoint("https://api.example.com/prod", "/ride")
            .expect("url")
            .as_str(),
        "https://api.example.com/prod/ride"
    );
    assert_eq!(
        ride_endpoint("https://api.example.com/prod/", "ride")
            .expect("url")
            .as_str(),
        "https://api.example.com/prod/ride"
    );
    assert!(ride_endpoint("not a url", "/ride").is_err());
}

#[tokio::test]
async fn missing_backend_always_fails_not_configured() {
    let err = MissingRideBackend
        .assign(pin())
        .await
        .expect_err("should fail");
    assert_eq!(err, AssignmentError::NotConfigured);
}

#[tokio::test]
async fn simulated_backend_rotates_through_fleet() {
    let backend = SimulatedRideBackend::new(
        vec!["Bucephalus".to_string(), "Shadowfax".to_string()],
        7,
    );

    let names: Vec<String> = [
        backend.assign(pin()).await,
        backend.assign(pin()).await,
        backend.assign(pin()).await,
    ]
    .into_iter()
    .map(|r| r.expect("assignment").unicorn_name)
    .collect();

    assert_eq!(names, ["Bucephalus", "Shadowfax", "Bucephalus"]);
    assert_eq!(
        backend.assign(pin()).await.expect("assignment").eta_seconds,
        7
    );
}

#[tokio::test]
async fn simulated_backend_with_empty_fleet_fails() {
    let backend = SimulatedRideBackend::new(Vec::new(), 7);
    assert!(backend.assign(pin()).await.is_err());
}
