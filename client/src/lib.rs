//! Headless client state for the shared whiteboard.
//!
//! This crate is the reconciliation layer a renderer reads from: it merges
//! inbound frames (init snapshots and incremental events) into a local
//! `canvas` store without duplicating or corrupting items, tracks ephemeral
//! attention pointers with idle expiry, and records which image assets have
//! finished their asynchronous decode. It never touches a socket or a pixel.

pub mod actions;
pub mod state;

pub use actions::{delete_stroke, fresh_item_id, submit_drafts};
pub use state::attention::{ATTENTION_TIMEOUT_MS, AttentionPointers, Pointer};
pub use state::board::ClientBoard;
pub use state::images::{AssetState, ImageAssets};
