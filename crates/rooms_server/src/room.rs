//! One game session: roster, turn, board and outcome behind a room lock.

use crate::SessionError;
use rooms_board::{Board, Mark, Position, Square, Verdict, rules};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Unique identifier for a room.
pub type RoomId = String;

/// Most participants a room admits.
pub const MAX_PARTICIPANTS: usize = 2;

/// A participant on a room's roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
pub struct Participant {
    /// Display name supplied by the caller.
    pub name: String,
    /// Mark assigned on entry.
    pub mark: Mark,
}

/// Terminal classification of a room.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "winner", rename_all = "snake_case")]
pub enum Outcome {
    /// Moves are still accepted.
    #[default]
    InProgress,
    /// The named participant completed a line.
    WonBy(String),
    /// The board filled without a line.
    Drawn,
}

impl Outcome {
    /// True once the outcome is decided.
    pub fn is_over(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }

    /// Winner's name, if any.
    pub fn winner(&self) -> Option<&str> {
        match self {
            Outcome::WonBy(name) => Some(name),
            _ => None,
        }
    }
}

/// Whether the room still accepts changes. Independent of [`Outcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// Joins and moves are accepted (subject to outcome).
    #[default]
    Open,
    /// Closed explicitly or by expiry. Never reopens.
    Closed,
}

/// How strictly turn ownership is enforced on moves.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TurnPolicy {
    /// Only the participant holding the turn may move, and only once both
    /// participants are present.
    #[default]
    Strict,
    /// Any roster member may move at any time.
    Permissive,
}

/// Immutable copy of a room's state, taken under the room lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    /// Room the snapshot was taken from.
    pub room_id: RoomId,
    /// Board at the instant of the snapshot.
    pub board: Board,
    /// Outcome at the instant of the snapshot.
    pub outcome: Outcome,
    /// Participant whose move is accepted next; `None` once the game is
    /// over or while the turn mark has no holder yet.
    pub turn: Option<String>,
    /// Roster in join order.
    pub players: Vec<Participant>,
    /// Open or closed.
    pub lifecycle: Lifecycle,
}

impl RoomSnapshot {
    /// True once the outcome is decided.
    pub fn is_over(&self) -> bool {
        self.outcome.is_over()
    }

    /// Winner's name, if any.
    pub fn winner(&self) -> Option<&str> {
        self.outcome.winner()
    }

    /// True if the room has been closed.
    pub fn is_closed(&self) -> bool {
        self.lifecycle == Lifecycle::Closed
    }
}

/// Mutable state of a room. Only reachable through [`Room::lock`].
#[derive(Debug, Clone)]
pub struct RoomState {
    roster: Vec<Participant>,
    turn: Mark,
    board: Board,
    outcome: Outcome,
    lifecycle: Lifecycle,
    last_activity: Instant,
}

impl RoomState {
    fn new(creator: String) -> Self {
        Self {
            roster: vec![Participant::new(creator, Mark::X)],
            turn: Mark::X,
            board: Board::new(),
            outcome: Outcome::InProgress,
            lifecycle: Lifecycle::Open,
            last_activity: Instant::now(),
        }
    }

    /// Roster in join order.
    pub fn roster(&self) -> &[Participant] {
        &self.roster
    }

    /// Mark whose move is accepted next.
    pub fn turn(&self) -> Mark {
        self.turn
    }

    /// Current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Current outcome.
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Current lifecycle.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Instant of the last accepted mutation.
    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    fn holder_of(&self, mark: Mark) -> Option<&Participant> {
        self.roster.iter().find(|p| p.mark == mark)
    }

    fn member(&self, name: &str) -> Option<&Participant> {
        self.roster.iter().find(|p| p.name == name)
    }

    fn ensure_open(&self, id: &str) -> Result<(), SessionError> {
        match self.lifecycle {
            Lifecycle::Open => Ok(()),
            Lifecycle::Closed => Err(SessionError::RoomClosed(id.to_string())),
        }
    }

    fn join(&mut self, id: &str, name: String) -> Result<Mark, SessionError> {
        self.ensure_open(id)?;
        if self.roster.len() >= MAX_PARTICIPANTS {
            return Err(SessionError::RoomFull(id.to_string()));
        }
        if self.member(&name).is_some() {
            return Err(SessionError::DuplicateName(name));
        }

        let mark = Mark::O;
        self.roster.push(Participant::new(name, mark));
        self.last_activity = Instant::now();
        Ok(mark)
    }

    fn apply_move(
        &mut self,
        id: &str,
        name: &str,
        row: i64,
        col: i64,
        policy: TurnPolicy,
    ) -> Result<(), SessionError> {
        self.ensure_open(id)?;
        let pos = usize::try_from(row)
            .ok()
            .zip(usize::try_from(col).ok())
            .and_then(|(r, c)| Position::new(r, c).ok())
            .ok_or(SessionError::OutOfRange { row, col })?;
        if self.board.get(pos) != Square::Empty {
            return Err(SessionError::CellOccupied(pos));
        }
        if self.outcome.is_over() {
            return Err(SessionError::GameOver);
        }
        let mark = self
            .member(name)
            .map(|p| p.mark)
            .ok_or_else(|| SessionError::NotInRoom(name.to_string()))?;

        if policy == TurnPolicy::Strict {
            if self.roster.len() < MAX_PARTICIPANTS {
                return Err(SessionError::AwaitingOpponent);
            }
            if mark != self.turn {
                let holder = self
                    .holder_of(self.turn)
                    .map(|p| p.name.clone())
                    .unwrap_or_default();
                return Err(SessionError::NotYourTurn(holder));
            }
        }

        #[cfg(debug_assertions)]
        let before = self.board.clone();

        self.board.place(pos, mark)?;
        self.last_activity = Instant::now();

        match rules::evaluate(&self.board, mark) {
            Verdict::Win => self.outcome = Outcome::WonBy(name.to_string()),
            Verdict::Draw => self.outcome = Outcome::Drawn,
            Verdict::Continue => self.turn = self.turn.opponent(),
        }

        #[cfg(debug_assertions)]
        debug_assert!(self.board.extends(&before), "board lost a mark");

        Ok(())
    }

    fn snapshot(&self, id: &str) -> RoomSnapshot {
        let turn = if self.outcome.is_over() {
            None
        } else {
            self.holder_of(self.turn).map(|p| p.name.clone())
        };
        RoomSnapshot {
            room_id: id.to_string(),
            board: self.board.clone(),
            outcome: self.outcome.clone(),
            turn,
            players: self.roster.clone(),
            lifecycle: self.lifecycle,
        }
    }
}

/// A game session shared between request handlers and publishers.
///
/// All reads and writes go through the room's own mutex, so a snapshot
/// never observes a half-applied move.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    state: Mutex<RoomState>,
}

impl Room {
    /// Creates a room with `creator` as its sole participant, holding `X`
    /// and the first turn.
    pub fn new(id: RoomId, creator: String) -> Self {
        Self {
            id,
            state: Mutex::new(RoomState::new(creator)),
        }
    }

    /// Room identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Locks the room state.
    ///
    /// Validation happens before every mutation, so state behind a poisoned
    /// lock is still consistent and is recovered rather than propagated.
    pub fn lock(&self) -> MutexGuard<'_, RoomState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds the second participant.
    #[instrument(skip(self), fields(room_id = %self.id))]
    pub fn join(&self, name: String) -> Result<Mark, SessionError> {
        let joined = self.lock().join(&self.id, name);
        match &joined {
            Ok(mark) => info!(mark = %mark, "Participant joined"),
            Err(e) => warn!(error = %e, "Join refused"),
        }
        joined
    }

    /// Validates and applies a move, returning the state it produced.
    #[instrument(skip(self, policy), fields(room_id = %self.id))]
    pub fn apply_move(
        &self,
        name: &str,
        row: i64,
        col: i64,
        policy: TurnPolicy,
    ) -> Result<RoomSnapshot, SessionError> {
        let mut state = self.lock();
        let applied = state
            .apply_move(&self.id, name, row, col, policy)
            .map(|()| state.snapshot(&self.id));
        drop(state);
        let snapshot = applied.inspect_err(|e| debug!(error = %e, "Move rejected"))?;
        debug!(board = %snapshot.board.render(), outcome = ?snapshot.outcome, "Move applied");
        Ok(snapshot)
    }

    /// Reads a consistent snapshot.
    pub fn snapshot(&self) -> RoomSnapshot {
        self.lock().snapshot(&self.id)
    }

    /// Marks the room closed. Returns `false` if it already was.
    #[instrument(skip(self), fields(room_id = %self.id))]
    pub fn close(&self) -> bool {
        let closed = {
            let mut state = self.lock();
            let was_open = state.lifecycle == Lifecycle::Open;
            state.lifecycle = Lifecycle::Closed;
            was_open
        };
        if closed {
            info!("Room closed");
        }
        closed
    }

    /// Closes the room if nothing happened in it for at least `ttl`.
    ///
    /// The idle check and the close happen under one lock acquisition, so a
    /// move racing with expiry either lands before the close or is refused.
    pub fn close_if_idle(&self, ttl: Duration, now: Instant) -> bool {
        let expired = {
            let mut state = self.lock();
            let idle = state.lifecycle == Lifecycle::Open
                && now.saturating_duration_since(state.last_activity) >= ttl;
            if idle {
                state.lifecycle = Lifecycle::Closed;
            }
            idle
        };
        if expired {
            info!(room_id = %self.id, "Room expired");
        }
        expired
    }
}
