//! Document model for the shared whiteboard canvas.
//!
//! This crate owns what is *on* a board — strokes, text labels, images, and
//! per-user draft strokes — plus the two pieces of logic every process in the
//! system agrees on: the ordered item store with idempotent mutation
//! semantics, and the layer/permission engine. Pure logic, no I/O; the server
//! holds one store per live board, the client holds one for its local view.

pub mod draft;
pub mod item;
pub mod layer;
pub mod store;

pub use draft::DraftStore;
pub use item::{
    DraftStroke, Image, ImagePatch, Item, ItemKind, Layer, Point, Stroke, StrokePatch, Text,
    TextPatch,
};
pub use layer::{
    ADMIN_USER, can_assign_layer, can_delete, can_delete_on_layer, image_interactable,
    image_visible, interactable, is_admin_equivalent, visible,
};
pub use store::{ItemStore, Snapshot};
