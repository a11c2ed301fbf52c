//! Suppression of rapid duplicate push deliveries.
//!
//! The change feed is at-least-once: the same event can arrive more than
//! once in quick succession (retries, overlapping subscriptions). A
//! repeat of the same subject-identity key inside the window is dropped;
//! anything the window misjudges is corrected by the next reconciliation
//! pass.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Per-key duplicate suppressor.
#[derive(Debug)]
pub struct EventDeduplicator {
    /// Window duration
    window: Duration,
    /// Last seen time per key
    last_seen: Mutex<HashMap<String, Instant>>,
}

impl EventDeduplicator {
    /// Create a new deduplicator with the given window.
    pub fn new(window_ms: u64) -> Self {
        Self {
            window: Duration::from_millis(window_ms),
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    /// Whether an event with this key should be applied now.
    ///
    /// Returns `false` if the same key was seen inside the window.
    pub fn should_apply(&self, key: &str) -> bool {
        let mut map = self.last_seen.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();

        if let Some(last) = map.get(key) {
            if now.duration_since(*last) < self.window {
                return false;
            }
        }

        map.insert(key.to_string(), now);
        true
    }

    /// Drop entries older than ten windows.
    pub fn cleanup(&self) {
        let mut map = self.last_seen.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let cutoff = self.window * 10;
        map.retain(|_, v| now.duration_since(*v) < cutoff);
    }
}
