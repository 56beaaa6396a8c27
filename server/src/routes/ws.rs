//! WebSocket handler — bidirectional frame relay.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID and enters a `select!` loop:
//! - Incoming client frames → parse + dispatch by syscall prefix
//! - Broadcast frames from board peers → forward to client
//!
//! Handler functions are pure business logic — they validate, mutate state,
//! and return an `Outcome`. The dispatch layer owns all outbound concerns:
//! write-through persistence, reply to sender, and fan-out to peers.
//!
//! Mutations are fire-and-forget: most produce no reply at all. The only
//! replies are the join snapshot, the draft:init after identification, and
//! error frames for the not-found/parse cases.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → send `session:connected` with `client_id`
//! 2. Client sends frames → dispatch → handler returns Outcome
//! 3. Dispatch applies Outcome (reply / broadcast / silence)
//! 4. Close → leave room (no teardown broadcast; pointer expiry covers it)

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use canvas::{DraftStroke, Image, ItemKind, Stroke, Text};
use frames::{Data, Frame};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services;
use crate::services::persistence;
use crate::state::AppState;

// =============================================================================
// OUTCOME
// =============================================================================

/// Result returned by handler functions. The dispatch layer uses this to
/// decide who receives what — handlers never send frames directly.
enum Outcome {
    /// Send done+data to sender only (join snapshot, draft:init).
    Reply(Data),
    /// Fan data out to all board peers EXCLUDING the sender, under the
    /// request's own syscall. No reply to the sender.
    Broadcast(Data),
    /// Nothing changed and nothing is sent. Permission denials, stale ids,
    /// board-id mismatches, and duplicate deliveries all land here.
    Silent,
}

/// Per-connection session context.
pub(crate) struct Session {
    pub client_id: Uuid,
    /// Board this connection has joined, if any.
    pub board: Option<String>,
    /// Identified display name. Anonymous until `user:identify`.
    pub user: Option<String>,
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();

    // Per-connection channel for receiving broadcast frames from peers.
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(256);

    let welcome =
        Frame::request("session:connected", Data::new()).with_data("client_id", client_id.to_string());
    if send_frame(&mut socket, &welcome).await.is_err() {
        return;
    }

    info!(%client_id, "ws: client connected");

    let mut session = Session { client_id, board: None, user: None };

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let replies = process_inbound_text(&state, &mut session, &client_tx, &text).await;
                        for frame in replies {
                            if send_frame(&mut socket, &frame).await.is_err() {
                                break;
                            }
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(frame) = client_rx.recv() => {
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    if let Some(board_id) = session.board.take() {
        services::board::leave_room(&state, &board_id, client_id).await;
    }
    info!(%client_id, "ws: client disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Parse and process one inbound text frame and return frames for the
/// sender. Split from the socket loop so dispatch is testable end-to-end
/// without a live network stack.
pub(crate) async fn process_inbound_text(
    state: &AppState,
    session: &mut Session,
    client_tx: &mpsc::Sender<Frame>,
    text: &str,
) -> Vec<Frame> {
    let mut req = match frames::decode_frame(text) {
        Ok(r) => r,
        Err(e) => {
            warn!(client_id = %session.client_id, error = %e, "ws: invalid inbound frame");
            let err = Frame::request("gateway:error", Data::new())
                .with_data("message", format!("invalid frame: {e}"));
            return vec![err];
        }
    };

    // Stamp the authenticated identity; never trust a client-supplied `from`.
    req.from = session.user.clone();

    let prefix = req.prefix();
    let is_attention = prefix == "attention";
    if !is_attention {
        info!(client_id = %session.client_id, id = %req.id, syscall = %req.syscall, "ws: recv frame");
    }

    let result = match prefix {
        "board" => handle_board(state, session, client_tx, &req).await,
        "stroke" | "text" | "image" => handle_add(state, session, &req).await,
        "item" => handle_item(state, session, &req).await,
        "draft" => handle_draft(state, session, &req).await,
        "user" => handle_user(state, session, &req).await,
        "attention" => handle_attention(session, &req),
        _ => Err(req.error(format!("unknown prefix: {prefix}"))),
    };

    match result {
        Ok(Outcome::Reply(data)) => vec![req.done_with(data)],
        Ok(Outcome::Broadcast(data)) => {
            if let Some(board_id) = session.board.clone() {
                let mut frame = Frame::request(&req.syscall, data).with_board_id(board_id.clone());
                if let Some(user) = &session.user {
                    frame = frame.with_from(user.clone());
                }
                services::board::broadcast(state, &board_id, &frame, Some(session.client_id)).await;
            }
            vec![]
        }
        Ok(Outcome::Silent) => vec![],
        Err(err_frame) => vec![err_frame],
    }
}

/// Board-membership guard: the event must name the board this connection
/// has joined. Anything else is silently ignored — a lightweight check
/// against cross-board event injection.
fn guarded_board(session: &Session, req: &Frame) -> Option<String> {
    let board = session.board.clone()?;
    if req.board_id.as_deref() == Some(board.as_str()) {
        Some(board)
    } else {
        debug!(client_id = %session.client_id, ?req.board_id, joined = %board, "board id mismatch; event ignored");
        None
    }
}

// =============================================================================
// BOARD HANDLERS
// =============================================================================

async fn handle_board(
    state: &AppState,
    session: &mut Session,
    client_tx: &mpsc::Sender<Frame>,
    req: &Frame,
) -> Result<Outcome, Frame> {
    match req.op() {
        "join" => {
            let board_id = req.board_id.clone().or_else(|| {
                req.data.get("board_id").and_then(|v| v.as_str()).map(str::to_owned)
            });
            let Some(board_id) = board_id else {
                return Err(req.error("board_id required"));
            };

            // A later join replaces the current association.
            if let Some(old_board) = session.board.take() {
                services::board::leave_room(state, &old_board, session.client_id).await;
            }

            match services::board::join_room(state, &board_id, session.client_id, client_tx.clone())
                .await
            {
                Ok(snapshot) => {
                    session.board = Some(board_id);
                    Ok(Outcome::Reply(frames::data_from(&snapshot)))
                }
                Err(e) => Err(req.error_from(&e)),
            }
        }
        "title:update" => {
            let Some(board_id) = guarded_board(session, req) else {
                return Ok(Outcome::Silent);
            };
            let title = req.data.get("title").and_then(|v| v.as_str()).unwrap_or("");

            let Some(normalized) = services::board::set_title(state, &board_id, title).await else {
                return Ok(Outcome::Silent);
            };

            let pool = state.pool.clone();
            let persist_title = normalized.clone();
            persistence::spawn_write("board title", async move {
                persistence::set_board_title(&pool, &board_id, &persist_title).await
            });

            let mut data = Data::new();
            data.insert("title".into(), serde_json::Value::String(normalized));
            Ok(Outcome::Broadcast(data))
        }
        op => Err(req.error(format!("unknown board op: {op}"))),
    }
}

// =============================================================================
// ADD HANDLERS
// =============================================================================

async fn handle_add(state: &AppState, session: &Session, req: &Frame) -> Result<Outcome, Frame> {
    if req.op() != "add" {
        return Err(req.error(format!("unknown op: {}", req.syscall)));
    }
    let Some(board_id) = guarded_board(session, req) else {
        return Ok(Outcome::Silent);
    };

    match req.prefix() {
        "stroke" => {
            let Ok(stroke) = frames::data_into::<Stroke>(&req.data) else {
                debug!(%board_id, "malformed stroke:add ignored");
                return Ok(Outcome::Silent);
            };
            let Some(stored) = services::item::add_stroke(state, &board_id, stroke).await else {
                return Ok(Outcome::Silent);
            };

            let pool = state.pool.clone();
            let persist = stored.clone();
            let persist_board = board_id;
            persistence::spawn_write("stroke add", async move {
                persistence::save_stroke(&pool, &persist_board, &persist).await
            });
            Ok(Outcome::Broadcast(frames::data_from(&stored)))
        }
        "text" => {
            let Ok(text) = frames::data_into::<Text>(&req.data) else {
                debug!(%board_id, "malformed text:add ignored");
                return Ok(Outcome::Silent);
            };
            let Some(stored) = services::item::add_text(state, &board_id, text).await else {
                return Ok(Outcome::Silent);
            };

            let pool = state.pool.clone();
            let persist = stored.clone();
            let persist_board = board_id;
            persistence::spawn_write("text add", async move {
                persistence::save_text(&pool, &persist_board, &persist).await
            });
            Ok(Outcome::Broadcast(frames::data_from(&stored)))
        }
        "image" => {
            let Ok(image) = frames::data_into::<Image>(&req.data) else {
                debug!(%board_id, "malformed image:add ignored");
                return Ok(Outcome::Silent);
            };
            let Some(stored) = services::item::add_image(state, &board_id, image).await else {
                return Ok(Outcome::Silent);
            };

            let pool = state.pool.clone();
            let persist = stored.clone();
            let persist_board = board_id;
            persistence::spawn_write("image add", async move {
                persistence::save_image(&pool, &persist_board, &persist).await
            });
            Ok(Outcome::Broadcast(frames::data_from(&stored)))
        }
        _ => unreachable!("dispatch routes only stroke/text/image here"),
    }
}

// =============================================================================
// ITEM HANDLERS
// =============================================================================

async fn handle_item(state: &AppState, session: &Session, req: &Frame) -> Result<Outcome, Frame> {
    let Some(board_id) = guarded_board(session, req) else {
        return Ok(Outcome::Silent);
    };

    let kind: Option<ItemKind> = req
        .data
        .get("type")
        .and_then(|v| serde_json::from_value(v.clone()).ok());
    let Some(kind) = kind else {
        return Ok(Outcome::Silent);
    };
    let Some(id) = req.data.get("id").and_then(|v| v.as_str()).map(str::to_owned) else {
        return Ok(Outcome::Silent);
    };

    match req.op() {
        "update" => {
            let Some(patch) = req.data.get("patch").cloned() else {
                return Ok(Outcome::Silent);
            };
            let actor = session.user.as_deref();
            let Some(merged) =
                services::item::update_item(state, &board_id, kind, &id, &patch, actor).await
            else {
                return Ok(Outcome::Silent);
            };

            let pool = state.pool.clone();
            let persist_board = board_id;
            persistence::spawn_write("item update", async move {
                persistence::save_item(&pool, &persist_board, &merged).await
            });

            // Rebroadcast the patch, not the full item: receivers merge.
            let mut data = Data::new();
            data.insert("type".into(), serde_json::to_value(kind).unwrap_or_default());
            data.insert("id".into(), serde_json::Value::String(id));
            data.insert("patch".into(), patch);
            Ok(Outcome::Broadcast(data))
        }
        "remove" => {
            let actor = session.user.as_deref();
            if services::item::remove_item(state, &board_id, kind, &id, actor)
                .await
                .is_none()
            {
                return Ok(Outcome::Silent);
            }

            let pool = state.pool.clone();
            let persist_board = board_id;
            let persist_id = id.clone();
            persistence::spawn_write("item remove", async move {
                persistence::delete_item(&pool, &persist_board, kind, &persist_id).await
            });

            let mut data = Data::new();
            data.insert("type".into(), serde_json::to_value(kind).unwrap_or_default());
            data.insert("id".into(), serde_json::Value::String(id));
            Ok(Outcome::Broadcast(data))
        }
        op => Err(req.error(format!("unknown item op: {op}"))),
    }
}

// =============================================================================
// DRAFT HANDLERS
// =============================================================================

/// Drafts are stored and persisted but never fanned out: visibility is
/// restricted to the owner, so there is nobody else to tell.
async fn handle_draft(state: &AppState, session: &Session, req: &Frame) -> Result<Outcome, Frame> {
    let Some(board_id) = guarded_board(session, req) else {
        return Ok(Outcome::Silent);
    };
    let actor = session.user.as_deref();

    match req.op() {
        "stroke:add" => {
            let Ok(draft) = frames::data_into::<DraftStroke>(&req.data) else {
                return Ok(Outcome::Silent);
            };
            let Some(stored) = services::draft::add_draft(state, &board_id, actor, draft).await
            else {
                return Ok(Outcome::Silent);
            };

            let pool = state.pool.clone();
            persistence::spawn_write("draft add", async move {
                persistence::save_draft_stroke(&pool, &board_id, &stored).await
            });
            Ok(Outcome::Silent)
        }
        "stroke:remove" => {
            let Some(id) = req.data.get("id").and_then(|v| v.as_str()).map(str::to_owned) else {
                return Ok(Outcome::Silent);
            };
            if !services::draft::remove_draft(state, &board_id, actor, &id).await {
                return Ok(Outcome::Silent);
            }

            let owner = session.user.clone().unwrap_or_default();
            let pool = state.pool.clone();
            persistence::spawn_write("draft remove", async move {
                persistence::delete_draft_stroke(&pool, &board_id, &id, &owner).await
            });
            Ok(Outcome::Silent)
        }
        op => Err(req.error(format!("unknown draft op: {op}"))),
    }
}

// =============================================================================
// USER HANDLERS
// =============================================================================

async fn handle_user(
    state: &AppState,
    session: &mut Session,
    req: &Frame,
) -> Result<Outcome, Frame> {
    match req.op() {
        "identify" => {
            let Some(name) = req
                .data
                .get("user")
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
            else {
                return Ok(Outcome::Silent);
            };
            session.user = Some(name.to_owned());

            // Identification is independent of join; the draft:init reply
            // only makes sense once both have happened.
            let Some(board_id) = guarded_board(session, req) else {
                return Ok(Outcome::Silent);
            };

            let pool = state.pool.clone();
            let link_board = board_id.clone();
            let link_name = name.to_owned();
            persistence::spawn_write("user link", async move {
                persistence::register_user(&pool, &link_name).await?;
                persistence::link_user_to_board(&pool, &link_board, &link_name).await
            });

            let drafts = services::draft::identify_drafts(state, &board_id, name).await;
            let mut data = Data::new();
            data.insert("drafts".into(), serde_json::to_value(drafts).unwrap_or_default());
            Ok(Outcome::Reply(data))
        }
        op => Err(req.error(format!("unknown user op: {op}"))),
    }
}

// =============================================================================
// ATTENTION HANDLER
// =============================================================================

/// Attention pointers are purely ephemeral: relay to the rest of the room,
/// store nothing, persist nothing. Receivers expire stale pointers on their
/// own clock, so a lost end event is harmless.
fn handle_attention(session: &Session, req: &Frame) -> Result<Outcome, Frame> {
    match req.op() {
        "start" | "update" | "end" => {
            if guarded_board(session, req).is_none() {
                return Ok(Outcome::Silent);
            }
            Ok(Outcome::Broadcast(req.data.clone()))
        }
        op => Err(req.error(format!("unknown attention op: {op}"))),
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), ()> {
    let json = frames::encode_frame(frame);
    let is_attention = frame.syscall.starts_with("attention:");
    if !is_attention {
        info!(id = %frame.id, syscall = %frame.syscall, status = ?frame.status, "ws: send frame");
    }
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
