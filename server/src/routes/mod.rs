//! Router assembly.
//!
//! Binds the board-lifecycle HTTP endpoints and the websocket upgrade under
//! a single Axum router. Page bodies are deliberately thin — rendering lives
//! client-side; the server's job is board existence, the template list, and
//! the realtime channel.

pub mod boards;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/new", get(boards::new_board))
        .route("/b/{board_id}", get(boards::board_page))
        .route("/api/templates", get(boards::templates))
        .route("/api/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
