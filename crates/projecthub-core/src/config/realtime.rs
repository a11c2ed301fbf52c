//! Live change-feed and reconciliation configuration.

use serde::{Deserialize, Serialize};

/// Live reconciliation layer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Internal broadcast buffer size for the change feed.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Interval between authoritative full reconciliation passes, in seconds.
    #[serde(default = "default_reconcile_interval")]
    pub reconcile_interval_seconds: u64,
    /// Window within which a repeated push event for the same subject
    /// identity is suppressed, in milliseconds.
    #[serde(default = "default_dedup_window")]
    pub dedup_window_ms: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
            reconcile_interval_seconds: default_reconcile_interval(),
            dedup_window_ms: default_dedup_window(),
        }
    }
}

fn default_channel_buffer() -> usize {
    256
}

fn default_reconcile_interval() -> u64 {
    30
}

fn default_dedup_window() -> u64 {
    500
}
