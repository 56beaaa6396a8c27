//! Board service — id allocation, join/leave, title, and room broadcast.
//!
//! DESIGN
//! ======
//! Rooms hydrate from Postgres on first join and are never evicted: a board
//! that has been visited once stays resident so later joins and writes are
//! memory-only. Leaving a room only removes the client sender.
//!
//! The broadcast path is decoupled from the websocket: clients are plain
//! mpsc senders in the room registry, so fan-out is unit-testable without a
//! network stack, and a slow client's full queue drops frames instead of
//! stalling the room.

use canvas::Snapshot;
use frames::Frame;
use rand::Rng;
use sqlx::PgPool;
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::services::persistence;
use crate::state::{AppState, RoomState};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("board not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl frames::ErrorCode for BoardError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_BOARD_NOT_FOUND",
            Self::Database(_) => "E_DATABASE",
        }
    }
}

// =============================================================================
// ID ALLOCATION
// =============================================================================

const BOARD_ID_LEN: usize = 8;
const BOARD_ID_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate one candidate board id.
#[must_use]
pub fn generate_board_id() -> String {
    let mut rng = rand::rng();
    (0..BOARD_ID_LEN)
        .map(|_| BOARD_ID_CHARS[rng.random_range(0..BOARD_ID_CHARS.len())] as char)
        .collect()
}

/// Allocate a fresh board id, retrying on collision, and create the board.
///
/// # Errors
///
/// Returns a database error if the existence check or insert fails.
pub async fn allocate_board(pool: &PgPool) -> Result<String, BoardError> {
    loop {
        let id = generate_board_id();
        if persistence::board_exists(pool, &id).await? {
            continue;
        }
        persistence::create_board(pool, &id).await?;
        info!(board_id = %id, "board created");
        return Ok(id);
    }
}

// =============================================================================
// JOIN / LEAVE
// =============================================================================

/// Join a board room. Hydrates from Postgres when the board is not yet
/// resident. Returns the snapshot delivered to the joining session.
///
/// # Errors
///
/// Returns `NotFound` for an unknown board id, or a database error if
/// hydration fails.
pub async fn join_room(
    state: &AppState,
    board_id: &str,
    client_id: Uuid,
    tx: mpsc::Sender<Frame>,
) -> Result<Snapshot, BoardError> {
    {
        let mut rooms = state.rooms.write().await;
        if let Some(room) = rooms.get_mut(board_id) {
            room.clients.insert(client_id, tx);
            info!(%board_id, %client_id, clients = room.clients.len(), "client joined board");
            return Ok(room.items.snapshot());
        }
    }

    // Not resident: check existence and fetch the snapshot outside the lock.
    if !persistence::board_exists(&state.pool, board_id).await? {
        return Err(BoardError::NotFound(board_id.to_owned()));
    }
    let snapshot = persistence::load_board_state(&state.pool, board_id).await?;

    let mut rooms = state.rooms.write().await;
    // EDGE: a concurrent join may have hydrated meanwhile; keep the resident
    // room and discard our snapshot in that case.
    let room = rooms
        .entry(board_id.to_owned())
        .or_insert_with(|| RoomState::from_snapshot(snapshot));
    room.clients.insert(client_id, tx);
    info!(%board_id, %client_id, items = room.items.len(), "hydrated board and joined");
    Ok(room.items.snapshot())
}

/// Leave a board room. Removes the client sender; the room itself stays
/// resident.
pub async fn leave_room(state: &AppState, board_id: &str, client_id: Uuid) {
    let mut rooms = state.rooms.write().await;
    let Some(room) = rooms.get_mut(board_id) else {
        return;
    };
    room.clients.remove(&client_id);
    info!(%board_id, %client_id, remaining = room.clients.len(), "client left board");
}

// =============================================================================
// TITLE
// =============================================================================

/// Update a board's title in the authoritative store. A cleared title falls
/// back to the board id. Returns the normalized title, or `None` when the
/// board is not resident.
pub async fn set_title(state: &AppState, board_id: &str, title: &str) -> Option<String> {
    let mut rooms = state.rooms.write().await;
    let room = rooms.get_mut(board_id)?;
    let normalized = if title.trim().is_empty() { board_id.to_owned() } else { title.to_owned() };
    room.items.set_title(Some(normalized.clone()));
    Some(normalized)
}

// =============================================================================
// BROADCAST
// =============================================================================

/// Broadcast a frame to all clients in a room, optionally excluding one.
pub async fn broadcast(state: &AppState, board_id: &str, frame: &Frame, exclude: Option<Uuid>) {
    let rooms = state.rooms.read().await;
    let Some(room) = rooms.get(board_id) else {
        return;
    };

    for (client_id, tx) in &room.clients {
        if exclude == Some(*client_id) {
            continue;
        }
        // Best-effort: if a client's channel is full, skip it.
        let _ = tx.try_send(frame.clone());
    }
}

#[cfg(test)]
#[path = "board_test.rs"]
mod tests;
