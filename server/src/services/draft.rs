//! Draft service — private per-user scratch strokes.
//!
//! Draft mutations are owner-scoped end to end: the acting user must match
//! the draft's `user` field, and nothing here is ever fanned out to other
//! connections. On identify, the owner's drafts hydrate from Postgres; if
//! that read fails the in-memory set is served instead (availability over
//! the rare durability gap, same as every other persistence path).

use canvas::DraftStroke;
use tracing::{debug, warn};

use crate::services::persistence;
use crate::state::AppState;

/// Insert a draft stroke. Returns the stored draft, or `None` when the room
/// is not resident, the actor is anonymous, or the actor is not the owner.
pub async fn add_draft(
    state: &AppState,
    board_id: &str,
    actor: Option<&str>,
    draft: DraftStroke,
) -> Option<DraftStroke> {
    if actor != Some(draft.user.as_str()) {
        debug!(board_id, id = %draft.id, ?actor, "draft add denied: not the owner");
        return None;
    }
    let mut rooms = state.rooms.write().await;
    let room = rooms.get_mut(board_id)?;
    if !room.drafts.insert(draft.clone()) {
        return None;
    }
    Some(draft)
}

/// Remove one of the actor's own drafts. Stale ids and foreign drafts are
/// silent no-ops.
pub async fn remove_draft(state: &AppState, board_id: &str, actor: Option<&str>, id: &str) -> bool {
    let Some(owner) = actor else {
        return false;
    };
    let mut rooms = state.rooms.write().await;
    let Some(room) = rooms.get_mut(board_id) else {
        return false;
    };
    room.drafts.remove(id, owner)
}

/// Hydrate and return one user's drafts for the `draft:init` reply.
pub async fn identify_drafts(state: &AppState, board_id: &str, user: &str) -> Vec<DraftStroke> {
    match persistence::list_draft_strokes(&state.pool, board_id, user).await {
        Ok(persisted) => {
            let mut rooms = state.rooms.write().await;
            if let Some(room) = rooms.get_mut(board_id) {
                // Idempotent merge: keeps drafts added this session whose
                // write-through has not landed yet.
                for draft in persisted {
                    room.drafts.insert(draft);
                }
                return room.drafts.list_for(user);
            }
            Vec::new()
        }
        Err(e) => {
            warn!(error = %e, board_id, user, "draft hydration failed; serving in-memory set");
            let rooms = state.rooms.read().await;
            rooms.get(board_id).map_or_else(Vec::new, |room| room.drafts.list_for(user))
        }
    }
}

#[cfg(test)]
#[path = "draft_test.rs"]
mod tests;
