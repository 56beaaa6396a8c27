//! Local edit actions that produce outbound frames.
//!
//! Actions mutate the local store optimistically and return the frames to
//! emit, so the transport layer stays a dumb pipe and the whole flow is
//! testable without a socket.

#[cfg(test)]
#[path = "actions_test.rs"]
mod actions_test;

use canvas::{ItemKind, Layer, Stroke};
use frames::{Data, Frame};

use crate::state::board::ClientBoard;

/// Generate a fresh item id. Item ids are client-minted and must be unique
/// per kind and board; a random UUID comfortably clears that bar.
#[must_use]
pub fn fresh_item_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn remove_frame(board_id: &str, kind: ItemKind, id: &str) -> Frame {
    let mut data = Data::new();
    data.insert("type".into(), serde_json::to_value(kind).unwrap_or_default());
    data.insert("id".into(), serde_json::Value::String(id.to_owned()));
    Frame::request("item:remove", data).with_board_id(board_id)
}

/// Delete a stroke, expanding group links: strokes sharing a `group_id`
/// form one compound shape and go together. Emits one `item:remove` per
/// removed stroke. Permission-ineligible strokes are left untouched.
pub fn delete_stroke(board: &mut ClientBoard, stroke_id: &str) -> Vec<Frame> {
    let Some(board_id) = board.board_id.clone() else {
        return Vec::new();
    };
    let Some(stroke) = board.items.stroke(stroke_id).cloned() else {
        return Vec::new();
    };
    if !board.can_delete_stroke(&stroke) {
        return Vec::new();
    }

    let removed = if let Some(group_id) = stroke.group_id.clone() {
        board.items.remove_stroke_group(&group_id)
    } else if board.items.remove(ItemKind::Stroke, stroke_id).is_some() {
        vec![stroke]
    } else {
        Vec::new()
    };

    removed
        .iter()
        .map(|s| remove_frame(&board_id, ItemKind::Stroke, &s.id))
        .collect()
}

/// Submit a selection of the session's own drafts into the public `user`
/// layer: each draft becomes a new public stroke with a fresh id and a fresh
/// public order rank, and the original draft is deleted.
///
/// Only meaningful from the draft active layer; returns no frames otherwise,
/// or when the session is still anonymous. Ids not owned by the session are
/// skipped.
pub fn submit_drafts(
    board: &mut ClientBoard,
    draft_ids: &[String],
    mut fresh_id: impl FnMut() -> String,
) -> Vec<Frame> {
    if board.active_layer != Layer::Draft {
        return Vec::new();
    }
    let Some(user) = board.user.clone() else {
        return Vec::new();
    };
    let Some(board_id) = board.board_id.clone() else {
        return Vec::new();
    };

    let mut frames_out = Vec::new();
    let mut submitted = Vec::new();

    for id in draft_ids {
        let Some(draft) = board.drafts.get(id) else {
            continue;
        };
        if draft.user != user {
            continue;
        }
        let draft = draft.clone();

        let stroke = Stroke {
            id: fresh_id(),
            user: Some(user.clone()),
            color: draft.color.clone(),
            size: draft.size,
            points: draft.points.clone(),
            layer: Layer::User,
            order: board.items.next_order(),
            group_id: None,
        };
        board.items.insert_stroke(stroke.clone());

        frames_out.push(
            Frame::request("stroke:add", frames::data_from(&stroke))
                .with_board_id(board_id.clone())
                .with_from(user.clone()),
        );
        submitted.push(draft.id);
    }

    for id in submitted {
        board.drafts.remove(&id, &user);
        let mut data = Data::new();
        data.insert("id".into(), serde_json::Value::String(id));
        frames_out.push(
            Frame::request("draft:stroke:remove", data)
                .with_board_id(board_id.clone())
                .with_from(user.clone()),
        );
    }

    frames_out
}
