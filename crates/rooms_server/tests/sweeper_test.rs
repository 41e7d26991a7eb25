//! Tests for idle room expiry.

use rooms_server::{ExpirySweeper, Registry, SessionEngine, SessionError, TurnPolicy};
use std::time::Duration;

const TTL: Duration = Duration::from_secs(60);

fn engine() -> SessionEngine {
    SessionEngine::new(Registry::new(), TurnPolicy::Strict)
}

#[tokio::test(start_paused = true)]
async fn test_idle_room_expires_active_room_stays() {
    let engine = engine();
    let idle = engine.create("Alice").unwrap();
    let busy = engine.create("Carol").unwrap();
    engine.join(&busy, "Dave").unwrap();
    let sweeper = ExpirySweeper::new(engine.clone(), TTL, Duration::from_secs(10));

    tokio::time::advance(Duration::from_secs(45)).await;
    engine.apply_move(&busy, "Carol", 0, 0).unwrap();
    assert!(sweeper.sweep_once().is_empty());

    tokio::time::advance(Duration::from_secs(20)).await;
    assert_eq!(sweeper.sweep_once(), vec![idle.clone()]);

    assert_eq!(
        engine.snapshot(&idle).unwrap_err(),
        SessionError::RoomNotFound(idle)
    );
    assert!(engine.snapshot(&busy).is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_spawned_sweeper_runs_periodically() {
    let engine = engine();
    let id = engine.create("Alice").unwrap();
    let handle = ExpirySweeper::new(engine.clone(), TTL, Duration::from_secs(10)).spawn();

    tokio::time::sleep(Duration::from_secs(75)).await;
    assert!(engine.registry().is_empty(), "room {id} should have expired");
    handle.abort();
}
