//! Draft Store — private per-user scratch strokes.
//!
//! Drafts never mix with the public collections: they live in their own
//! store, their own persistence table, and their own order counters, one
//! counter per owner. Removal is owner-scoped so one user can never delete
//! another user's draft even with a guessed id.

use std::collections::HashMap;

use crate::item::DraftStroke;

/// Draft strokes for one board, keyed by owner.
#[derive(Debug, Clone, Default)]
pub struct DraftStore {
    drafts: Vec<DraftStroke>,
    /// Next order rank per owner.
    counters: HashMap<String, i64>,
}

impl DraftStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a draft. Duplicate ids are no-ops keeping the first values.
    pub fn insert(&mut self, draft: DraftStroke) -> bool {
        if self.drafts.iter().any(|d| d.id == draft.id) {
            return false;
        }
        let counter = self.counters.entry(draft.user.clone()).or_insert(0);
        *counter = (*counter).max(draft.order + 1);
        self.drafts.push(draft);
        true
    }

    /// Remove a draft, but only when the caller is its owner.
    pub fn remove(&mut self, id: &str, owner: &str) -> bool {
        let Some(idx) = self.drafts.iter().position(|d| d.id == id && d.user == owner) else {
            return false;
        };
        self.drafts.remove(idx);
        true
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&DraftStroke> {
        self.drafts.iter().find(|d| d.id == id)
    }

    /// All drafts belonging to one owner, ordered by rank.
    #[must_use]
    pub fn list_for(&self, owner: &str) -> Vec<DraftStroke> {
        let mut out: Vec<DraftStroke> =
            self.drafts.iter().filter(|d| d.user == owner).cloned().collect();
        out.sort_by_key(|d| d.order);
        out
    }

    /// Replace one owner's drafts wholesale (used when hydrating from
    /// persistence). Other owners' drafts are untouched.
    pub fn replace_for(&mut self, owner: &str, drafts: Vec<DraftStroke>) {
        self.drafts.retain(|d| d.user != owner);
        self.counters.remove(owner);
        for draft in drafts {
            if draft.user == owner {
                self.insert(draft);
            }
        }
    }

    /// Allocate the next order rank for one owner's new draft.
    pub fn next_order_for(&mut self, owner: &str) -> i64 {
        let counter = self.counters.entry(owner.to_owned()).or_insert(0);
        let order = *counter;
        *counter += 1;
        order
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }
}

#[cfg(test)]
#[path = "draft_test.rs"]
mod tests;
