//! Board lifecycle HTTP endpoints.
//!
//! `/new` allocates a collision-checked board id and redirects to the board
//! page; `/b/{id}` answers 404 for unknown boards so a stale link fails at
//! page level instead of inside the websocket; `/api/templates` lists the
//! stock images available for insertion.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use tracing::{error, warn};

use crate::services::{board, persistence};
use crate::state::AppState;

/// Allocate a fresh board and redirect to it.
pub async fn new_board(State(state): State<AppState>) -> Response {
    match board::allocate_board(&state.pool).await {
        Ok(id) => Redirect::temporary(&format!("/b/{id}")).into_response(),
        Err(e) => {
            error!(error = %e, "board allocation failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to create board").into_response()
        }
    }
}

/// Serve the board page shell, or 404 when the board does not exist.
pub async fn board_page(State(state): State<AppState>, Path(board_id): Path<String>) -> Response {
    // A resident room proves existence without touching the database.
    let resident = {
        let rooms = state.rooms.read().await;
        rooms.contains_key(&board_id)
    };

    if !resident {
        match persistence::board_exists(&state.pool, &board_id).await {
            Ok(true) => {}
            Ok(false) => return (StatusCode::NOT_FOUND, "Board not found").into_response(),
            Err(e) => {
                error!(error = %e, %board_id, "board existence check failed");
                return (StatusCode::INTERNAL_SERVER_ERROR, "lookup failed").into_response();
            }
        }
    }

    Html(BOARD_PAGE_SHELL).into_response()
}

/// Minimal page shell; the client bundle takes over from here.
const BOARD_PAGE_SHELL: &str = "<!doctype html>\n<html>\n<head><meta charset=\"utf-8\"><title>inkboard</title></head>\n<body><div id=\"board\"></div></body>\n</html>\n";

/// List available stock-image filenames (PNG only). A missing templates
/// directory yields an empty list, not an error.
pub async fn templates() -> Json<Vec<String>> {
    let dir = std::env::var("TEMPLATES_DIR").unwrap_or_else(|_| "templates".into());

    let mut names = Vec::new();
    match tokio::fs::read_dir(&dir).await {
        Ok(mut entries) => {
            while let Ok(Some(entry)) = entries.next_entry().await {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.to_lowercase().ends_with(".png") {
                    names.push(name);
                }
            }
        }
        Err(e) => {
            warn!(error = %e, %dir, "templates directory unreadable; returning empty list");
        }
    }
    Json(names)
}
