//! HTTP API over the session engine.
//!
//! Plain JSON request/response routes for create, join, move, read, close
//! and list, plus a Server-Sent-Events stream fed by the state publisher.

use crate::engine::{RoomSummary, SessionEngine};
use crate::publisher::StatePublisher;
use crate::room::{Participant, RoomSnapshot};
use crate::SessionError;
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Path, State};
use axum::http::{Request, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tracing::{debug, info, instrument, warn};

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    engine: SessionEngine,
    publisher: StatePublisher,
    stream_buffer: usize,
}

impl AppState {
    /// Bundles the engine and publisher for the router.
    pub fn new(engine: SessionEngine, publisher: StatePublisher, stream_buffer: usize) -> Self {
        Self {
            engine,
            publisher,
            stream_buffer: stream_buffer.max(1),
        }
    }
}

/// Body of `POST /rooms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    /// Display name of the creator.
    pub participant_name: String,
}

/// Response of `POST /rooms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    /// Identifier of the new room.
    pub room_id: String,
}

/// Body of `POST /rooms/{room_id}/join`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRoomRequest {
    /// Display name of the joining participant.
    pub participant_name: String,
}

/// Response of `POST /rooms/{room_id}/join`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRoomResponse {
    /// Human-readable confirmation.
    pub message: String,
}

/// Body of `POST /rooms/{room_id}/moves`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Participant making the move.
    pub participant_name: String,
    /// Row, 0-2.
    pub row: i64,
    /// Column, 0-2.
    pub col: i64,
}

/// Wire form of a room snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStateView {
    /// Room identifier.
    pub room_id: String,
    /// Rows of `"X"`, `"O"` or `""`.
    pub board: Vec<Vec<String>>,
    /// True once won or drawn.
    pub is_over: bool,
    /// Winner's name, `""` when there is none.
    pub winner: String,
    /// Participant expected to move next.
    pub turn: Option<String>,
    /// Roster in join order.
    pub players: Vec<Participant>,
    /// True once the room is closed.
    pub closed: bool,
}

impl From<&RoomSnapshot> for GameStateView {
    fn from(snapshot: &RoomSnapshot) -> Self {
        let board = snapshot
            .board
            .rows()
            .iter()
            .map(|row| row.iter().map(|sq| sq.symbol().to_string()).collect())
            .collect();
        Self {
            room_id: snapshot.room_id.clone(),
            board,
            is_over: snapshot.is_over(),
            winner: snapshot.winner().unwrap_or_default().to_string(),
            turn: snapshot.turn.clone(),
            players: snapshot.players.clone(),
            closed: snapshot.is_closed(),
        }
    }
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error kind, e.g. `room_not_found`.
    pub error: String,
    /// Human-readable description.
    pub message: String,
}

impl SessionError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            SessionError::RoomNotFound(_) => StatusCode::NOT_FOUND,
            SessionError::RoomClosed(_) => StatusCode::GONE,
            SessionError::InvalidName | SessionError::OutOfRange { .. } => StatusCode::BAD_REQUEST,
            SessionError::NotInRoom(_) => StatusCode::FORBIDDEN,
            SessionError::RoomFull(_)
            | SessionError::DuplicateName(_)
            | SessionError::CellOccupied(_)
            | SessionError::GameOver
            | SessionError::NotYourTurn(_)
            | SessionError::AwaitingOpponent => StatusCode::CONFLICT,
            SessionError::IdSpaceExhausted(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.kind().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// JSON body extractor whose rejections render as [`ErrorBody`].
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!(error = %rejection.body_text(), "Rejected request body");
                let body = ErrorBody {
                    error: "invalid_request".to_string(),
                    message: rejection.body_text(),
                };
                Err((StatusCode::BAD_REQUEST, Json(body)).into_response())
            }
        }
    }
}

/// Builds the router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/rooms", get(list_rooms).post(create_room))
        .route("/rooms/{room_id}", get(get_state).delete(close_room))
        .route("/rooms/{room_id}/join", post(join_room))
        .route("/rooms/{room_id}/moves", post(apply_move))
        .route("/rooms/{room_id}/stream", get(stream_state))
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            debug!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

#[instrument(skip(state))]
async fn list_rooms(State(state): State<AppState>) -> Json<Vec<RoomSummary>> {
    Json(state.engine.list())
}

#[instrument(skip(state, req), fields(participant = %req.participant_name))]
async fn create_room(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateRoomRequest>,
) -> Result<(StatusCode, Json<CreateRoomResponse>), SessionError> {
    let room_id = state.engine.create(&req.participant_name)?;
    Ok((StatusCode::CREATED, Json(CreateRoomResponse { room_id })))
}

#[instrument(skip(state, req), fields(participant = %req.participant_name))]
async fn join_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    ApiJson(req): ApiJson<JoinRoomRequest>,
) -> Result<Json<JoinRoomResponse>, SessionError> {
    let message = state.engine.join(&room_id, &req.participant_name)?;
    Ok(Json(JoinRoomResponse {
        message: message.to_string(),
    }))
}

#[instrument(skip(state, req), fields(participant = %req.participant_name, row = req.row, col = req.col))]
async fn apply_move(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    ApiJson(req): ApiJson<MoveRequest>,
) -> Result<Json<GameStateView>, SessionError> {
    let snapshot = state
        .engine
        .apply_move(&room_id, &req.participant_name, req.row, req.col)
        .inspect_err(|e| warn!(error = %e, "Move refused"))?;
    Ok(Json(GameStateView::from(&snapshot)))
}

#[instrument(skip(state))]
async fn get_state(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<GameStateView>, SessionError> {
    let snapshot = state.engine.snapshot(&room_id)?;
    Ok(Json(GameStateView::from(&snapshot)))
}

#[instrument(skip(state))]
async fn close_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<StatusCode, SessionError> {
    state.engine.close(&room_id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
async fn stream_state(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, SessionError> {
    let (tx, rx) = mpsc::channel::<RoomSnapshot>(state.stream_buffer);
    // Detached: the task stops on its first push after the client goes away.
    let subscription = state.publisher.subscribe(&room_id, tx)?;
    info!(room_id = subscription.room_id(), "State stream opened");

    let events = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|snapshot| (snapshot, rx))
    })
    .map(|snapshot| {
        Event::default()
            .event("state")
            .json_data(GameStateView::from(&snapshot))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
