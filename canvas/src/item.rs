//! Item types: strokes, text labels, images, draft strokes.
//!
//! Data flows into this layer from the network (JSON deserialization) and
//! from local editing. Sparse patch structs carry `item:update` payloads;
//! a patch can never rename an item's `id` or reassign its creator, so those
//! fields simply do not exist on the patch types.

use serde::{Deserialize, Serialize};

// =============================================================================
// LAYER
// =============================================================================

/// Visibility/permission partition an item belongs to, also selectable as a
/// session's active context.
///
/// Unrecognized layer strings from older stored rows deserialize as `User`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum Layer {
    #[default]
    User,
    Base,
    Image,
    Draft,
    Admin,
}

impl From<String> for Layer {
    fn from(s: String) -> Self {
        Layer::parse(&s)
    }
}

impl From<Layer> for String {
    fn from(layer: Layer) -> Self {
        layer.as_str().to_owned()
    }
}

impl Layer {
    /// Storage/wire name of the layer.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Layer::User => "user",
            Layer::Base => "base",
            Layer::Image => "image",
            Layer::Draft => "draft",
            Layer::Admin => "admin",
        }
    }

    /// Parse a storage/wire layer name. Unknown names fall back to `User`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "base" => Layer::Base,
            "image" => Layer::Image,
            "draft" => Layer::Draft,
            "admin" => Layer::Admin,
            _ => Layer::User,
        }
    }
}

// =============================================================================
// ITEM KINDS
// =============================================================================

/// Which public collection an `item:update`/`item:remove` targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Stroke,
    Text,
    Image,
}

/// One point of a stroke path, in board coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A freehand pen stroke.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stroke {
    /// Client-generated identifier, stable across persistence and network.
    pub id: String,
    /// Creator's display name. `None` for anonymous sessions.
    #[serde(default)]
    pub user: Option<String>,
    pub color: String,
    /// Line width in pixels.
    pub size: f64,
    /// Ordered path, at least one point.
    pub points: Vec<Point>,
    #[serde(default)]
    pub layer: Layer,
    /// Board-scoped insertion rank.
    #[serde(default)]
    pub order: i64,
    /// Strokes sharing a `group_id` move and delete as one unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

/// A text label: explicit lines, no automatic wrapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Text {
    pub id: String,
    #[serde(default)]
    pub user: Option<String>,
    pub lines: Vec<String>,
    pub x: f64,
    pub y: f64,
    /// Board-space units, independent of zoom.
    pub font_size: f64,
    pub color: String,
    #[serde(default)]
    pub layer: Layer,
    #[serde(default)]
    pub order: i64,
    /// Milliseconds since Unix epoch; feeds the chronological list view.
    #[serde(default)]
    pub created_at: i64,
    /// Short user-assigned tag for quick lookup. Empty when unset.
    #[serde(default)]
    pub label: String,
}

/// A placed image: either an embedded data URI or a server-relative path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    #[serde(default)]
    pub user: Option<String>,
    pub src: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub layer: Layer,
    #[serde(default)]
    pub order: i64,
}

/// A private scratch stroke, visible only to its owner until submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftStroke {
    pub id: String,
    /// Owner. Drafts are never anonymous.
    pub user: String,
    pub color: String,
    pub size: f64,
    pub points: Vec<Point>,
    /// Rank in the owner's private counter, separate from the public one.
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub created_at: i64,
}

/// Any public item, tagged with its kind. Used where the three collections
/// are handled uniformly (deletion permission, persistence dispatch).
#[derive(Debug, Clone)]
pub enum Item {
    Stroke(Stroke),
    Text(Text),
    Image(Image),
}

impl Item {
    #[must_use]
    pub fn kind(&self) -> ItemKind {
        match self {
            Item::Stroke(_) => ItemKind::Stroke,
            Item::Text(_) => ItemKind::Text,
            Item::Image(_) => ItemKind::Image,
        }
    }

    #[must_use]
    pub fn layer(&self) -> Layer {
        match self {
            Item::Stroke(s) => s.layer,
            Item::Text(t) => t.layer,
            Item::Image(i) => i.layer,
        }
    }

    #[must_use]
    pub fn user(&self) -> Option<&str> {
        match self {
            Item::Stroke(s) => s.user.as_deref(),
            Item::Text(t) => t.user.as_deref(),
            Item::Image(i) => i.user.as_deref(),
        }
    }
}

// =============================================================================
// PATCHES
// =============================================================================

/// Sparse update for a stroke. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrokePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<Layer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

impl StrokePatch {
    pub fn apply(&self, stroke: &mut Stroke) {
        if let Some(color) = &self.color {
            stroke.color = color.clone();
        }
        if let Some(size) = self.size {
            stroke.size = size;
        }
        if let Some(points) = &self.points {
            stroke.points = points.clone();
        }
        if let Some(layer) = self.layer {
            stroke.layer = layer;
        }
        if let Some(group_id) = &self.group_id {
            stroke.group_id = Some(group_id.clone());
        }
    }
}

/// Sparse update for a text label.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<Layer>,
}

impl TextPatch {
    pub fn apply(&self, text: &mut Text) {
        if let Some(lines) = &self.lines {
            text.lines = lines.clone();
        }
        if let Some(x) = self.x {
            text.x = x;
        }
        if let Some(y) = self.y {
            text.y = y;
        }
        if let Some(font_size) = self.font_size {
            text.font_size = font_size;
        }
        if let Some(color) = &self.color {
            text.color = color.clone();
        }
        if let Some(label) = &self.label {
            text.label = label.clone();
        }
        if let Some(layer) = self.layer {
            text.layer = layer;
        }
    }
}

/// Sparse update for an image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImagePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<Layer>,
}

impl ImagePatch {
    pub fn apply(&self, image: &mut Image) {
        if let Some(x) = self.x {
            image.x = x;
        }
        if let Some(y) = self.y {
            image.y = y;
        }
        if let Some(width) = self.width {
            image.width = width;
        }
        if let Some(height) = self.height {
            image.height = height;
        }
        if let Some(layer) = self.layer {
            image.layer = layer;
        }
    }
}

#[cfg(test)]
#[path = "item_test.rs"]
mod tests;
