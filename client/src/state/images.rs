//! Asynchronous image-asset tracking.
//!
//! An image item can exist in the store before its bytes have decoded; the
//! render pass asks [`ImageAssets::is_paintable`] and skips anything still
//! loading or failed, so one broken asset never aborts a draw loop.

#[cfg(test)]
#[path = "images_test.rs"]
mod images_test;

use std::collections::HashMap;

use canvas::Image;

/// Decode state of one image source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetState {
    Loading,
    Ready,
    Failed,
}

/// Decode states keyed by image `src`.
#[derive(Debug, Clone, Default)]
pub struct ImageAssets {
    assets: HashMap<String, AssetState>,
}

impl ImageAssets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a decode has started. Already-tracked sources keep their
    /// state, so re-adding an item never flips Ready back to Loading.
    pub fn request(&mut self, src: &str) {
        self.assets.entry(src.to_owned()).or_insert(AssetState::Loading);
    }

    pub fn mark_ready(&mut self, src: &str) {
        self.assets.insert(src.to_owned(), AssetState::Ready);
    }

    /// A failed decode is terminal for that source; the item stays in the
    /// store but is skipped by rendering.
    pub fn mark_failed(&mut self, src: &str) {
        self.assets.insert(src.to_owned(), AssetState::Failed);
    }

    #[must_use]
    pub fn state(&self, src: &str) -> Option<AssetState> {
        self.assets.get(src).copied()
    }

    /// Whether a render pass may paint this image right now.
    #[must_use]
    pub fn is_paintable(&self, image: &Image) -> bool {
        self.state(&image.src) == Some(AssetState::Ready)
    }
}
