//! Attention pointers — the shared "laser pointer" cursor.
//!
//! Pointers are purely ephemeral: never persisted, never in the item store.
//! A pointer that stops updating is swept after a fixed idle window even if
//! its `attention:end` was lost with a dropped connection; that sweep is the
//! one mandatory timeout in the whole protocol. Callers inject the clock so
//! expiry is deterministic under test.

#[cfg(test)]
#[path = "attention_test.rs"]
mod attention_test;

use std::collections::HashMap;

/// Idle window after which a peer's pointer disappears without an explicit
/// end event.
pub const ATTENTION_TIMEOUT_MS: i64 = 10_000;

/// One peer's live pointer position.
#[derive(Debug, Clone, PartialEq)]
pub struct Pointer {
    pub x: f64,
    pub y: f64,
    pub color: String,
    /// Millisecond timestamp of the last start/update.
    pub updated_at: i64,
}

/// Live pointers keyed by user name.
#[derive(Debug, Clone, Default)]
pub struct AttentionPointers {
    pointers: HashMap<String, Pointer>,
}

impl AttentionPointers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an `attention:start` or `attention:update` for a user.
    pub fn apply_update(&mut self, user: &str, x: f64, y: f64, color: &str, now_ms: i64) {
        self.pointers.insert(
            user.to_owned(),
            Pointer { x, y, color: color.to_owned(), updated_at: now_ms },
        );
    }

    /// Apply an explicit `attention:end`.
    pub fn apply_end(&mut self, user: &str) {
        self.pointers.remove(user);
    }

    /// Drop pointers idle past the timeout window. Returns how many expired.
    pub fn sweep(&mut self, now_ms: i64) -> usize {
        let before = self.pointers.len();
        self.pointers.retain(|_, p| now_ms - p.updated_at <= ATTENTION_TIMEOUT_MS);
        before - self.pointers.len()
    }

    /// Pointers a render pass at `now_ms` should display.
    #[must_use]
    pub fn visible(&mut self, now_ms: i64) -> Vec<(&str, &Pointer)> {
        self.sweep(now_ms);
        self.pointers.iter().map(|(user, p)| (user.as_str(), p)).collect()
    }

    #[must_use]
    pub fn get(&self, user: &str) -> Option<&Pointer> {
        self.pointers.get(user)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }
}
