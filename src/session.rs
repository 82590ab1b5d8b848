//! Handshake tracking for stateless HTTP serving
//!
//! There is no per-connection session: one `SessionState` is shared by every
//! request a server instance handles. It starts locked, meaning only the
//! handshake methods may be called, and the first successful `initialize`
//! unlocks the full method surface for all subsequent requests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared handshake flag, cloned across requests.
#[derive(Clone, Default)]
pub struct SessionState {
    unlocked: Arc<AtomicBool>,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("unlocked", &self.is_unlocked())
            .finish()
    }
}

impl SessionState {
    /// Create a locked session
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `initialize` has been answered
    pub fn is_unlocked(&self) -> bool {
        self.unlocked.load(Ordering::Acquire)
    }

    /// Unlock the session after answering `initialize`.
    /// Returns false if it was already unlocked.
    pub fn unlock(&self) -> bool {
        !self.unlocked.swap(true, Ordering::AcqRel)
    }

    /// Whether `method` may be dispatched right now. While locked, only the
    /// handshake itself and keepalives go through.
    pub fn allows(&self, method: &str) -> bool {
        self.is_unlocked() || matches!(method, "initialize" | "ping")
    }
}
