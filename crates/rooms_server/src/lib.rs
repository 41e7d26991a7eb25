//! Concurrent room server for two-player tic-tac-toe.
//!
//! # Architecture
//!
//! - **Registry**: room identifier to shared room, behind its own lock
//! - **Room**: roster, turn, board and outcome behind a per-room lock
//! - **Engine**: create/join/move/close, one room lock per operation
//! - **Publisher**: polling snapshot stream, one task per subscriber
//! - **Sweeper**: optional expiry of idle rooms
//! - **API**: axum routes and an SSE stream over the above
//!
//! # Example
//!
//! ```
//! use rooms_server::{Registry, SessionEngine, TurnPolicy};
//!
//! let engine = SessionEngine::new(Registry::new(), TurnPolicy::Strict);
//! let room = engine.create("Alice")?;
//! engine.join(&room, "Bob")?;
//! let snapshot = engine.apply_move(&room, "Alice", 1, 1)?;
//! assert_eq!(snapshot.turn.as_deref(), Some("Bob"));
//! # Ok::<(), rooms_server::SessionError>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod api;
mod cli;
mod config;
mod engine;
mod error;
mod ids;
mod publisher;
mod registry;
mod room;
mod sweeper;

// Crate-level exports - HTTP boundary
pub use api::{
    ApiJson, AppState, CreateRoomRequest, CreateRoomResponse, ErrorBody, GameStateView,
    JoinRoomRequest, JoinRoomResponse, MoveRequest, router,
};

// Crate-level exports - CLI and configuration
pub use cli::{Cli, Command};
pub use config::{ConfigError, ServerConfig};

// Crate-level exports - Session engine
pub use engine::{JOIN_CONFIRMATION, RoomSummary, SessionEngine};
pub use error::SessionError;
pub use ids::{RandomRoomIds, RoomIdSource};
pub use registry::Registry;
pub use room::{
    Lifecycle, MAX_PARTICIPANTS, Outcome, Participant, Room, RoomId, RoomSnapshot, RoomState,
    TurnPolicy,
};

// Crate-level exports - Streaming
pub use publisher::{SinkClosed, SnapshotSink, StatePublisher, Subscription, Termination};
pub use sweeper::ExpirySweeper;

// Crate-level exports - Board types
pub use rooms_board::{Board, Mark, Position, Square};
