//! Tests for the HTTP API.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use rooms_server::{
    AppState, CreateRoomResponse, ErrorBody, GameStateView, JoinRoomResponse, Registry,
    RoomSummary, SessionEngine, StatePublisher, TurnPolicy, router,
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;

fn app(policy: TurnPolicy) -> Router {
    app_with_registry(policy).0
}

fn app_with_registry(policy: TurnPolicy) -> (Router, Registry) {
    let registry = Registry::new();
    let engine = SessionEngine::new(registry.clone(), policy);
    let publisher = StatePublisher::new(registry.clone(), Duration::from_millis(10));
    (router(AppState::new(engine, publisher, 4)), registry)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

fn parse<T: DeserializeOwned>(bytes: &[u8]) -> T {
    serde_json::from_slice(bytes).expect("Invalid JSON body")
}

async fn create_duel(app: &Router) -> String {
    let (status, body) = send(app, "POST", "/rooms", Some(json!({"participant_name": "Alice"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let room_id = parse::<CreateRoomResponse>(&body).room_id;

    let (status, body) = send(
        app,
        "POST",
        &format!("/rooms/{room_id}/join"),
        Some(json!({"participant_name": "Bob"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        parse::<JoinRoomResponse>(&body).message,
        "Successfully joined the room!"
    );
    room_id
}

async fn play(app: &Router, room_id: &str, name: &str, row: i64, col: i64) -> (StatusCode, Vec<u8>) {
    send(
        app,
        "POST",
        &format!("/rooms/{room_id}/moves"),
        Some(json!({"participant_name": name, "row": row, "col": col})),
    )
    .await
}

#[tokio::test]
async fn test_health() {
    let app = app(TurnPolicy::Strict);
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn test_full_game_over_http() {
    let app = app(TurnPolicy::Permissive);
    let room_id = create_duel(&app).await;

    play(&app, &room_id, "Alice", 0, 0).await;
    play(&app, &room_id, "Alice", 0, 1).await;
    let (status, body) = play(&app, &room_id, "Alice", 0, 2).await;
    assert_eq!(status, StatusCode::OK);

    let view: GameStateView = parse(&body);
    assert!(view.is_over);
    assert_eq!(view.winner, "Alice");
    assert_eq!(view.board[0], vec!["X", "X", "X"]);
    assert_eq!(view.board[1], vec!["", "", ""]);

    let (status, body) = play(&app, &room_id, "Bob", 2, 2).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(parse::<ErrorBody>(&body).error, "game_over");
}

#[tokio::test]
async fn test_error_statuses() {
    let app = app(TurnPolicy::Strict);
    let room_id = create_duel(&app).await;

    let (status, body) = play(&app, "ghost", "Alice", 0, 0).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(parse::<ErrorBody>(&body).error, "room_not_found");

    let (status, _) = play(&app, &room_id, "Alice", 5, 0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = play(&app, &room_id, "Bob", 0, 0).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(parse::<ErrorBody>(&body).error, "not_your_turn");

    let (status, _) = play(&app, &room_id, "Mallory", 0, 0).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/rooms/{room_id}/join"),
        Some(json!({"participant_name": "Carol"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(parse::<ErrorBody>(&body).error, "room_full");

    let (status, _) = send(&app, "POST", "/rooms", Some(json!({"participant_name": " "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_state_list_and_close() {
    let app = app(TurnPolicy::Strict);
    let room_id = create_duel(&app).await;
    play(&app, &room_id, "Alice", 1, 1).await;

    let (status, body) = send(&app, "GET", &format!("/rooms/{room_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let view: GameStateView = parse(&body);
    assert_eq!(view.board[1][1], "X");
    assert_eq!(view.turn.as_deref(), Some("Bob"));
    assert!(!view.is_over);
    assert_eq!(view.winner, "");

    let (_, body) = send(&app, "GET", "/rooms", None).await;
    let list: Vec<RoomSummary> = parse(&body);
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].room_id, room_id);

    let (status, _) = send(&app, "DELETE", &format!("/rooms/{room_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &format!("/rooms/{room_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stream_unknown_room_is_not_found() {
    let app = app(TurnPolicy::Strict);
    let (status, _) = send(&app, "GET", "/rooms/ghost/stream", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stream_emits_state_events() {
    let app = app(TurnPolicy::Strict);
    let room_id = create_duel(&app).await;

    let request = Request::builder()
        .uri(format!("/rooms/{room_id}/stream"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );

    let mut body = response.into_body();
    let mut text = String::new();
    while !text.contains("\n\n") {
        let frame = body.frame().await.expect("stream ended").unwrap();
        if let Ok(data) = frame.into_data() {
            text.push_str(&String::from_utf8_lossy(&data));
        }
    }

    assert!(text.starts_with("event: state\n"), "got {text:?}");
    let data = text
        .lines()
        .find_map(|line| line.strip_prefix("data: "))
        .expect("no data line");
    let view: GameStateView = serde_json::from_str(data).unwrap();
    assert_eq!(view.room_id, room_id);
    assert_eq!(view.players.len(), 2);
}

#[tokio::test]
async fn test_negative_coordinate_is_out_of_range() {
    let app = app(TurnPolicy::Strict);
    let room_id = create_duel(&app).await;

    let (status, body) = play(&app, &room_id, "Alice", -1, 0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let err: ErrorBody = parse(&body);
    assert_eq!(err.error, "out_of_range");
    assert_eq!(err.message, "Position (-1, 0) is out of range");

    let (status, body) = play(&app, "ghost", "Alice", -1, 0).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(parse::<ErrorBody>(&body).error, "room_not_found");
}

#[tokio::test]
async fn test_malformed_body_uses_error_body() {
    let app = app(TurnPolicy::Strict);
    let room_id = create_duel(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/rooms/{room_id}/moves"),
        Some(json!({"participant_name": "Alice", "row": "middle", "col": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse::<ErrorBody>(&body).error, "invalid_request");

    let (status, body) = send(&app, "POST", "/rooms", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse::<ErrorBody>(&body).error, "invalid_request");
}

#[tokio::test]
async fn test_conflict_kinds() {
    let app = app(TurnPolicy::Strict);
    let (_, body) = send(&app, "POST", "/rooms", Some(json!({"participant_name": "Alice"}))).await;
    let room_id = parse::<CreateRoomResponse>(&body).room_id;

    let (status, body) = play(&app, &room_id, "Alice", 0, 0).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(parse::<ErrorBody>(&body).error, "awaiting_opponent");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/rooms/{room_id}/join"),
        Some(json!({"participant_name": "Alice"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(parse::<ErrorBody>(&body).error, "duplicate_name");

    send(
        &app,
        "POST",
        &format!("/rooms/{room_id}/join"),
        Some(json!({"participant_name": "Bob"})),
    )
    .await;
    let (status, _) = play(&app, &room_id, "Alice", 0, 0).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = play(&app, &room_id, "Bob", 0, 0).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(parse::<ErrorBody>(&body).error, "cell_occupied");
}

#[tokio::test]
async fn test_closed_room_is_gone() {
    let (app, registry) = app_with_registry(TurnPolicy::Strict);
    let room_id = create_duel(&app).await;
    // Closed but still registered, as seen by a request racing a close.
    registry.lookup(&room_id).unwrap().close();

    let (status, body) = play(&app, &room_id, "Alice", 0, 0).await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(parse::<ErrorBody>(&body).error, "room_closed");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/rooms/{room_id}/join"),
        Some(json!({"participant_name": "Carol"})),
    )
    .await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(parse::<ErrorBody>(&body).error, "room_closed");

    let (_, body) = send(&app, "GET", &format!("/rooms/{room_id}"), None).await;
    assert!(parse::<GameStateView>(&body).closed);
}
