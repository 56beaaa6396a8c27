//! Item service — authoritative mutations with silent-drop enforcement.
//!
//! DESIGN
//! ======
//! Every mutation either changes the room's state and returns what must be
//! persisted and rebroadcast, or returns `None` and changes nothing. There
//! is no rejection message on the wire: the client UI already prevents
//! disallowed actions locally, so a denied or stale mutation simply
//! disappears. Stale ids are the expected outcome of benign races, not
//! corruption.

use canvas::{
    Image, ImagePatch, Item, ItemKind, Layer, Stroke, StrokePatch, Text, TextPatch, layer,
};
use tracing::debug;

use crate::state::AppState;

/// Current time as milliseconds since Unix epoch.
fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

// =============================================================================
// ADD
// =============================================================================

/// Insert a stroke into the room. Returns the stored stroke, or `None` when
/// the room is not resident or the id was already present (duplicate
/// delivery keeps the first-arrived values and is not rebroadcast).
pub async fn add_stroke(state: &AppState, board_id: &str, stroke: Stroke) -> Option<Stroke> {
    let mut rooms = state.rooms.write().await;
    let room = rooms.get_mut(board_id)?;
    if !room.items.insert_stroke(stroke.clone()) {
        debug!(board_id, id = %stroke.id, "duplicate stroke:add ignored");
        return None;
    }
    Some(stroke)
}

/// Insert a text label. Stamps `created_at` server-side when the client
/// omitted it, so the chronological list view always has a timestamp.
pub async fn add_text(state: &AppState, board_id: &str, mut text: Text) -> Option<Text> {
    if text.created_at == 0 {
        text.created_at = now_ms();
    }
    let mut rooms = state.rooms.write().await;
    let room = rooms.get_mut(board_id)?;
    if !room.items.insert_text(text.clone()) {
        debug!(board_id, id = %text.id, "duplicate text:add ignored");
        return None;
    }
    Some(text)
}

/// Insert an image.
pub async fn add_image(state: &AppState, board_id: &str, image: Image) -> Option<Image> {
    let mut rooms = state.rooms.write().await;
    let room = rooms.get_mut(board_id)?;
    if !room.items.insert_image(image.clone()) {
        debug!(board_id, id = %image.id, "duplicate image:add ignored");
        return None;
    }
    Some(image)
}

// =============================================================================
// UPDATE
// =============================================================================

/// Merge a sparse patch into an item. Field-level last-writer-wins: the
/// patch overwrites whatever fields it names regardless of concurrent
/// writers. A patch that moves the item into a gated layer without the
/// admin role is dropped whole. Returns the merged item for persistence.
pub async fn update_item(
    state: &AppState,
    board_id: &str,
    kind: ItemKind,
    id: &str,
    patch: &serde_json::Value,
    actor: Option<&str>,
) -> Option<Item> {
    let target_layer = patch
        .get("layer")
        .and_then(|v| v.as_str())
        .map(Layer::parse);
    if let Some(target) = target_layer {
        if !layer::can_assign_layer(target, actor) {
            debug!(board_id, id, ?target, ?actor, "layer promotion denied");
            return None;
        }
    }

    let mut rooms = state.rooms.write().await;
    let room = rooms.get_mut(board_id)?;

    match kind {
        ItemKind::Stroke => {
            let patch: StrokePatch = serde_json::from_value(patch.clone()).ok()?;
            room.items.patch_stroke(id, &patch).map(Item::Stroke)
        }
        ItemKind::Text => {
            let patch: TextPatch = serde_json::from_value(patch.clone()).ok()?;
            room.items.patch_text(id, &patch).map(Item::Text)
        }
        ItemKind::Image => {
            let patch: ImagePatch = serde_json::from_value(patch.clone()).ok()?;
            room.items.patch_image(id, &patch).map(Item::Image)
        }
    }
}

// =============================================================================
// REMOVE
// =============================================================================

/// Delete an item, subject to the deletion superset rule. Returns the
/// removed item for persistence, or `None` (nothing changed, nothing
/// rebroadcast) on a stale id or a permission denial.
pub async fn remove_item(
    state: &AppState,
    board_id: &str,
    kind: ItemKind,
    id: &str,
    actor: Option<&str>,
) -> Option<Item> {
    let mut rooms = state.rooms.write().await;
    let room = rooms.get_mut(board_id)?;

    let existing = room.items.item(kind, id)?;
    if !layer::can_delete(existing.layer(), existing.user(), actor) {
        debug!(board_id, id, ?actor, "deletion denied");
        return None;
    }
    room.items.remove(kind, id)
}

#[cfg(test)]
#[path = "item_test.rs"]
mod tests;
