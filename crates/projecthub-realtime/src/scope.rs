//! Scope tokens for stale-result suppression.
//!
//! Every scope switch issues a new token. A reconciliation pass captures
//! the token when it starts; if a newer one exists by the time its result
//! arrives, the result is discarded.

use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque token identifying one scope generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeToken(u64);

/// Issues and validates scope tokens.
#[derive(Debug, Default)]
pub struct ScopeTracker {
    current: AtomicU64,
}

impl ScopeTracker {
    /// Create a tracker at generation zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate all earlier tokens and return the new current one.
    pub fn issue(&self) -> ScopeToken {
        ScopeToken(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// The token of the current generation.
    pub fn current(&self) -> ScopeToken {
        ScopeToken(self.current.load(Ordering::SeqCst))
    }

    /// Whether the token still belongs to the current generation.
    pub fn is_current(&self, token: ScopeToken) -> bool {
        self.current.load(Ordering::SeqCst) == token.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_invalidates_older_tokens() {
        let tracker = ScopeTracker::new();
        let first = tracker.issue();
        assert!(tracker.is_current(first));

        let second = tracker.issue();
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
        assert_eq!(tracker.current(), second);
    }
}
