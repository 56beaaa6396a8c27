//! Layer & Permission Engine.
//!
//! ARCHITECTURE
//! ============
//! The layer system is the whiteboard's only substitute for per-object ACLs:
//! every item-actor pair classifies into not-visible, visible-only, or
//! visible-and-interactable, from the item's layer, the session's active
//! layer, and the two display names involved. The client uses the full
//! matrix to drive rendering and hit-testing; the server enforces the
//! identity-based subset (`can_delete`, `can_assign_layer`) and silently
//! drops anything outside it.
//!
//! Images are the one cross-cutting case: always visible on every active
//! layer, interactable only from the `image` or `admin` context.

use crate::item::Layer;

/// Reserved display name granting unrestricted visibility and interaction.
pub const ADMIN_USER: &str = "Admin";

/// Whether the acting user holds the reserved admin role.
#[must_use]
pub fn is_admin_equivalent(actor: Option<&str>) -> bool {
    actor == Some(ADMIN_USER)
}

/// Visibility of a stroke or text item for a session on `active`.
///
/// The draft active layer surfaces everything for moderation; items on the
/// draft *item* layer are still interaction-gated by ownership.
#[must_use]
pub fn visible(item_layer: Layer, active: Layer) -> bool {
    match active {
        Layer::Admin | Layer::Draft => true,
        Layer::User => matches!(item_layer, Layer::User | Layer::Base),
        Layer::Base => item_layer == Layer::Base,
        Layer::Image => false,
    }
}

/// Images are visible regardless of the active layer.
#[must_use]
pub fn image_visible() -> bool {
    true
}

/// Whether an image can be grabbed/moved/resized from the active layer.
#[must_use]
pub fn image_interactable(active: Layer) -> bool {
    matches!(active, Layer::Image | Layer::Admin)
}

/// Whether a stroke or text item can be selected, moved, or edited.
#[must_use]
pub fn interactable(
    item_layer: Layer,
    active: Layer,
    owner: Option<&str>,
    actor: Option<&str>,
) -> bool {
    match active {
        Layer::Admin => true,
        Layer::Draft => item_layer == Layer::Draft && owner.is_some() && owner == actor,
        Layer::User => item_layer == Layer::User,
        Layer::Base => item_layer == Layer::Base,
        Layer::Image => false,
    }
}

/// Deletion is a superset rule: the admin role, base-layer items (community
/// property), the item's own creator, and anonymous items (ownerless means
/// anyone with layer rights may delete) all pass.
#[must_use]
pub fn can_delete(item_layer: Layer, owner: Option<&str>, actor: Option<&str>) -> bool {
    if is_admin_equivalent(actor) {
        return true;
    }
    if item_layer == Layer::Base {
        return true;
    }
    match owner {
        None => true,
        Some(o) => actor == Some(o),
    }
}

/// Client-side deletion check: a session working on the admin active layer
/// gets the same superset as the admin role.
#[must_use]
pub fn can_delete_on_layer(
    active: Layer,
    item_layer: Layer,
    owner: Option<&str>,
    actor: Option<&str>,
) -> bool {
    active == Layer::Admin || can_delete(item_layer, owner, actor)
}

/// Whether the actor may assign an item to `target`. Promotions into the
/// shared `base` and `image` layers are admin-only; `user` and `draft` are
/// open (draft self-submission goes through the copy-and-delete path, not a
/// layer patch).
#[must_use]
pub fn can_assign_layer(target: Layer, actor: Option<&str>) -> bool {
    match target {
        Layer::Base | Layer::Image | Layer::Admin => is_admin_equivalent(actor),
        Layer::User | Layer::Draft => true,
    }
}

#[cfg(test)]
#[path = "layer_test.rs"]
mod tests;
