//! Local board state and the inbound-frame reducer.
//!
//! DESIGN
//! ======
//! Every network event funnels through [`ClientBoard::apply_frame`]. The
//! reducer is deliberately forgiving: duplicate adds are absorbed by the
//! store's idempotent insert, updates and removes naming unknown ids are
//! silently ignored (the item may have been deleted locally in a benign
//! race — a stale patch must never resurrect it), and malformed payloads are
//! dropped without error. Draft events are filtered by owner equality before
//! they touch local state.

#[cfg(test)]
#[path = "board_test.rs"]
mod board_test;

use canvas::{
    DraftStore, DraftStroke, Image, ImagePatch, ItemKind, ItemStore, Layer, Snapshot, Stroke,
    StrokePatch, Text, TextPatch, layer,
};
use frames::{Frame, Status};

/// Client-side view of one board, fed by the websocket.
#[derive(Debug, Clone, Default)]
pub struct ClientBoard {
    pub board_id: Option<String>,
    /// Identified display name. `None` while anonymous.
    pub user: Option<String>,
    /// Active layer context for visibility/interaction decisions.
    pub active_layer: Layer,
    pub items: ItemStore,
    pub drafts: DraftStore,
    /// True once a `draft:init` has arrived for the identified user.
    pub drafts_loaded: bool,
}

impl ClientBoard {
    #[must_use]
    pub fn new(board_id: impl Into<String>) -> Self {
        Self { board_id: Some(board_id.into()), ..Self::default() }
    }

    /// Set the local display name. Cleared drafts reload on the next
    /// `draft:init`.
    pub fn identify(&mut self, user: impl Into<String>) {
        self.user = Some(user.into());
    }

    /// Merge one inbound frame into local state. Returns true when anything
    /// changed.
    pub fn apply_frame(&mut self, frame: &Frame) -> bool {
        match (frame.syscall.as_str(), frame.status) {
            ("board:join", Status::Done) => self.apply_init(&frame.data),
            ("user:identify", Status::Done) => self.apply_draft_init(&frame.data),
            ("stroke:add", Status::Request) => self.apply_stroke_add(&frame.data),
            ("text:add", Status::Request) => self.apply_text_add(&frame.data),
            ("image:add", Status::Request) => self.apply_image_add(&frame.data),
            ("draft:stroke:add", Status::Request) => self.apply_draft_add(&frame.data),
            ("draft:stroke:remove", Status::Request) => self.apply_draft_remove(&frame.data),
            ("item:update", Status::Request) => self.apply_item_update(&frame.data),
            ("item:remove", Status::Request) => self.apply_item_remove(&frame.data),
            ("board:title:update", Status::Request) => self.apply_title(&frame.data),
            _ => false,
        }
    }

    // -------------------------------------------------------------------------
    // SNAPSHOTS
    // -------------------------------------------------------------------------

    fn apply_init(&mut self, data: &frames::Data) -> bool {
        let Ok(snapshot) = frames::data_into::<Snapshot>(data) else {
            return false;
        };
        // Clear, then idempotent inserts. On a reconnect replay this also
        // resets the order counters before the snapshot bumps them back up.
        self.items.clear();
        self.items.set_title(snapshot.title);
        for stroke in snapshot.strokes {
            self.items.insert_stroke(stroke);
        }
        for text in snapshot.texts {
            self.items.insert_text(text);
        }
        for image in snapshot.images {
            self.items.insert_image(image);
        }
        true
    }

    fn apply_draft_init(&mut self, data: &frames::Data) -> bool {
        let Some(user) = self.user.clone() else {
            return false;
        };
        let drafts: Vec<DraftStroke> = data
            .get("drafts")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();
        let own: Vec<DraftStroke> = drafts.into_iter().filter(|d| d.user == user).collect();
        self.drafts.replace_for(&user, own);
        self.drafts_loaded = true;
        true
    }

    // -------------------------------------------------------------------------
    // ADDS
    // -------------------------------------------------------------------------

    fn apply_stroke_add(&mut self, data: &frames::Data) -> bool {
        let Ok(stroke) = frames::data_into::<Stroke>(data) else {
            return false;
        };
        self.items.insert_stroke(stroke)
    }

    fn apply_text_add(&mut self, data: &frames::Data) -> bool {
        let Ok(text) = frames::data_into::<Text>(data) else {
            return false;
        };
        self.items.insert_text(text)
    }

    fn apply_image_add(&mut self, data: &frames::Data) -> bool {
        let Ok(image) = frames::data_into::<Image>(data) else {
            return false;
        };
        self.items.insert_image(image)
    }

    fn apply_draft_add(&mut self, data: &frames::Data) -> bool {
        let Ok(draft) = frames::data_into::<DraftStroke>(data) else {
            return false;
        };
        // Drafts are private: anything not owned by this session is dropped
        // before it can reach local state, even if a server fans it out.
        if self.user.as_deref() != Some(draft.user.as_str()) {
            return false;
        }
        self.drafts.insert(draft)
    }

    fn apply_draft_remove(&mut self, data: &frames::Data) -> bool {
        let Some(user) = self.user.as_deref() else {
            return false;
        };
        let Some(id) = data.get("id").and_then(|v| v.as_str()) else {
            return false;
        };
        self.drafts.remove(id, user)
    }

    // -------------------------------------------------------------------------
    // UPDATE / REMOVE
    // -------------------------------------------------------------------------

    fn apply_item_update(&mut self, data: &frames::Data) -> bool {
        let Some(kind) = parse_kind(data) else {
            return false;
        };
        let Some(id) = data.get("id").and_then(|v| v.as_str()) else {
            return false;
        };
        let Some(patch) = data.get("patch") else {
            return false;
        };

        match kind {
            ItemKind::Stroke => {
                let Ok(patch) = serde_json::from_value::<StrokePatch>(patch.clone()) else {
                    return false;
                };
                self.items.patch_stroke(id, &patch).is_some()
            }
            ItemKind::Text => {
                let Ok(patch) = serde_json::from_value::<TextPatch>(patch.clone()) else {
                    return false;
                };
                self.items.patch_text(id, &patch).is_some()
            }
            ItemKind::Image => {
                let Ok(patch) = serde_json::from_value::<ImagePatch>(patch.clone()) else {
                    return false;
                };
                self.items.patch_image(id, &patch).is_some()
            }
        }
    }

    fn apply_item_remove(&mut self, data: &frames::Data) -> bool {
        let Some(kind) = parse_kind(data) else {
            return false;
        };
        let Some(id) = data.get("id").and_then(|v| v.as_str()) else {
            return false;
        };
        self.items.remove(kind, id).is_some()
    }

    fn apply_title(&mut self, data: &frames::Data) -> bool {
        let Some(title) = data.get("title").and_then(|v| v.as_str()) else {
            return false;
        };
        self.items.set_title(Some(title.to_owned()));
        true
    }

    // -------------------------------------------------------------------------
    // VIEWS
    // -------------------------------------------------------------------------

    /// Strokes visible on the current active layer, in composite draw order.
    /// Draft-layer strokes belonging to other users are excluded even on the
    /// all-surfacing draft view.
    #[must_use]
    pub fn visible_strokes(&self) -> Vec<&Stroke> {
        let mut out: Vec<&Stroke> = self
            .items
            .strokes()
            .iter()
            .filter(|s| layer::visible(s.layer, self.active_layer))
            .filter(|s| {
                s.layer != Layer::Draft || s.user.as_deref() == self.user.as_deref()
            })
            .collect();
        out.sort_by_key(|s| s.order);
        out
    }

    /// Texts visible on the current active layer, in composite draw order.
    #[must_use]
    pub fn visible_texts(&self) -> Vec<&Text> {
        let mut out: Vec<&Text> = self
            .items
            .texts()
            .iter()
            .filter(|t| layer::visible(t.layer, self.active_layer))
            .filter(|t| {
                t.layer != Layer::Draft || t.user.as_deref() == self.user.as_deref()
            })
            .collect();
        out.sort_by_key(|t| t.order);
        out
    }

    /// Images in composite draw order. Images are visible regardless of the
    /// active layer; only interaction is gated.
    #[must_use]
    pub fn visible_images(&self) -> Vec<&Image> {
        let mut out: Vec<&Image> =
            self.items.images().iter().filter(|_| layer::image_visible()).collect();
        out.sort_by_key(|i| i.order);
        out
    }

    /// Own drafts, shown only from the draft active layer.
    #[must_use]
    pub fn visible_drafts(&self) -> Vec<DraftStroke> {
        if self.active_layer != Layer::Draft {
            return Vec::new();
        }
        match &self.user {
            Some(user) => self.drafts.list_for(user),
            None => Vec::new(),
        }
    }

    /// Whether the session may grab/edit a stroke right now.
    #[must_use]
    pub fn can_interact_stroke(&self, stroke: &Stroke) -> bool {
        layer::interactable(stroke.layer, self.active_layer, stroke.user.as_deref(), self.user.as_deref())
    }

    /// Whether the session may grab/edit a text label right now.
    #[must_use]
    pub fn can_interact_text(&self, text: &Text) -> bool {
        layer::interactable(text.layer, self.active_layer, text.user.as_deref(), self.user.as_deref())
    }

    /// Whether the session may grab/move/resize an image right now.
    #[must_use]
    pub fn can_interact_image(&self) -> bool {
        layer::image_interactable(self.active_layer)
    }

    /// Whether the session may delete a stroke (superset rule: the admin
    /// context, community base items, own items, and ownerless items).
    #[must_use]
    pub fn can_delete_stroke(&self, stroke: &Stroke) -> bool {
        layer::can_delete_on_layer(self.active_layer, stroke.layer, stroke.user.as_deref(), self.user.as_deref())
    }

    /// Whether the session may delete a text label.
    #[must_use]
    pub fn can_delete_text(&self, text: &Text) -> bool {
        layer::can_delete_on_layer(self.active_layer, text.layer, text.user.as_deref(), self.user.as_deref())
    }
}

fn parse_kind(data: &frames::Data) -> Option<ItemKind> {
    let raw = data.get("type")?.clone();
    serde_json::from_value(raw).ok()
}
