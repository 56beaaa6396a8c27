//! Item Store — per-board ordered collections with idempotent mutations.
//!
//! DESIGN
//! ======
//! Collections are insertion-ordered vectors: composite render order sorts by
//! the `order` field and breaks ties by list position, so stable insertion
//! order is part of the contract. All operations are total — inserting a
//! duplicate id, patching a missing id, or removing a missing id is a no-op,
//! never an error. This mirrors "last writer wins, absent writer is ignored"
//! and makes out-of-order network delivery harmless.

use serde::{Deserialize, Serialize};

use crate::item::{
    Image, ImagePatch, Item, ItemKind, Stroke, StrokePatch, Text, TextPatch,
};

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Full copy of a board's public collections, as delivered to a joining
/// session and as loaded from persistence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub strokes: Vec<Stroke>,
    #[serde(default)]
    pub texts: Vec<Text>,
    #[serde(default)]
    pub images: Vec<Image>,
}

// =============================================================================
// STORE
// =============================================================================

/// Per-board public item collections and the shared order counter.
#[derive(Debug, Clone, Default)]
pub struct ItemStore {
    title: Option<String>,
    strokes: Vec<Stroke>,
    texts: Vec<Text>,
    images: Vec<Image>,
    /// Next order rank. Strokes, texts, and images share this counter.
    order_counter: i64,
}

impl ItemStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a persisted or received snapshot. Inserts are
    /// idempotent, so duplicate rows collapse to the first occurrence.
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut store = Self { title: snapshot.title, ..Self::default() };
        for stroke in snapshot.strokes {
            store.insert_stroke(stroke);
        }
        for text in snapshot.texts {
            store.insert_text(text);
        }
        for image in snapshot.images {
            store.insert_image(image);
        }
        store
    }

    // -------------------------------------------------------------------------
    // TITLE
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title;
    }

    // -------------------------------------------------------------------------
    // ORDER
    // -------------------------------------------------------------------------

    /// Allocate the next order rank for a locally created item.
    pub fn next_order(&mut self) -> i64 {
        let order = self.order_counter;
        self.order_counter += 1;
        order
    }

    /// Advance the counter past an order rank seen from the network, so the
    /// next local allocation never collides regardless of delivery order.
    fn bump_order(&mut self, seen: i64) {
        self.order_counter = self.order_counter.max(seen + 1);
    }

    // -------------------------------------------------------------------------
    // INSERT
    // -------------------------------------------------------------------------

    /// Insert a stroke. Returns false (keeping the first-arrived values) if
    /// the id is already present.
    pub fn insert_stroke(&mut self, stroke: Stroke) -> bool {
        if self.stroke(&stroke.id).is_some() {
            return false;
        }
        self.bump_order(stroke.order);
        self.strokes.push(stroke);
        true
    }

    pub fn insert_text(&mut self, text: Text) -> bool {
        if self.text(&text.id).is_some() {
            return false;
        }
        self.bump_order(text.order);
        self.texts.push(text);
        true
    }

    pub fn insert_image(&mut self, image: Image) -> bool {
        if self.image(&image.id).is_some() {
            return false;
        }
        self.bump_order(image.order);
        self.images.push(image);
        true
    }

    // -------------------------------------------------------------------------
    // LOOKUP
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn stroke(&self, id: &str) -> Option<&Stroke> {
        self.strokes.iter().find(|s| s.id == id)
    }

    #[must_use]
    pub fn text(&self, id: &str) -> Option<&Text> {
        self.texts.iter().find(|t| t.id == id)
    }

    #[must_use]
    pub fn image(&self, id: &str) -> Option<&Image> {
        self.images.iter().find(|i| i.id == id)
    }

    /// Look up any public item by kind and id.
    #[must_use]
    pub fn item(&self, kind: ItemKind, id: &str) -> Option<Item> {
        match kind {
            ItemKind::Stroke => self.stroke(id).cloned().map(Item::Stroke),
            ItemKind::Text => self.text(id).cloned().map(Item::Text),
            ItemKind::Image => self.image(id).cloned().map(Item::Image),
        }
    }

    #[must_use]
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    #[must_use]
    pub fn texts(&self) -> &[Text] {
        &self.texts
    }

    #[must_use]
    pub fn images(&self) -> &[Image] {
        &self.images
    }

    // -------------------------------------------------------------------------
    // PATCH
    // -------------------------------------------------------------------------

    /// Merge a sparse patch into an existing stroke. Returns the merged
    /// stroke, or `None` (no-op) when the id is unknown.
    pub fn patch_stroke(&mut self, id: &str, patch: &StrokePatch) -> Option<Stroke> {
        let stroke = self.strokes.iter_mut().find(|s| s.id == id)?;
        patch.apply(stroke);
        Some(stroke.clone())
    }

    pub fn patch_text(&mut self, id: &str, patch: &TextPatch) -> Option<Text> {
        let text = self.texts.iter_mut().find(|t| t.id == id)?;
        patch.apply(text);
        Some(text.clone())
    }

    pub fn patch_image(&mut self, id: &str, patch: &ImagePatch) -> Option<Image> {
        let image = self.images.iter_mut().find(|i| i.id == id)?;
        patch.apply(image);
        Some(image.clone())
    }

    // -------------------------------------------------------------------------
    // REMOVE
    // -------------------------------------------------------------------------

    /// Remove an item by kind and id. Returns the removed item, or `None`
    /// (no-op) when the id is unknown.
    pub fn remove(&mut self, kind: ItemKind, id: &str) -> Option<Item> {
        match kind {
            ItemKind::Stroke => {
                let idx = self.strokes.iter().position(|s| s.id == id)?;
                Some(Item::Stroke(self.strokes.remove(idx)))
            }
            ItemKind::Text => {
                let idx = self.texts.iter().position(|t| t.id == id)?;
                Some(Item::Text(self.texts.remove(idx)))
            }
            ItemKind::Image => {
                let idx = self.images.iter().position(|i| i.id == id)?;
                Some(Item::Image(self.images.remove(idx)))
            }
        }
    }

    /// Remove every stroke sharing the given group id. Group links are
    /// symmetric: the whole compound shape goes at once.
    pub fn remove_stroke_group(&mut self, group_id: &str) -> Vec<Stroke> {
        let mut removed = Vec::new();
        self.strokes.retain(|s| {
            if s.group_id.as_deref() == Some(group_id) {
                removed.push(s.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    // -------------------------------------------------------------------------
    // SNAPSHOT
    // -------------------------------------------------------------------------

    /// Full clone of the current collections, for late-join delivery.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            title: self.title.clone(),
            strokes: self.strokes.clone(),
            texts: self.texts.clone(),
            images: self.images.clone(),
        }
    }

    /// Drop everything, including the order counter. Used by clients when a
    /// fresh init snapshot replaces local state.
    pub fn clear(&mut self) {
        self.title = None;
        self.strokes.clear();
        self.texts.clear();
        self.images.clear();
        self.order_counter = 0;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strokes.len() + self.texts.len() + self.images.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
