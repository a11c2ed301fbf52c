//! Notification aggregation and completion-threshold configuration.

use serde::{Deserialize, Serialize};

/// How the "all members have seen/downloaded" threshold is derived.
///
/// The historical deployment ran with a fixed six-person roster, so five
/// distinct non-uploader actors meant completion. Whether the threshold
/// should instead track live project membership is a deployment choice,
/// hence a configuration knob rather than a hardcoded rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionMode {
    /// A fixed number of distinct non-uploader actors completes a subject.
    FixedThreshold,
    /// Every roster member except the uploader must act.
    AllOtherMembers,
}

/// Notification aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Completion threshold derivation mode.
    #[serde(default = "default_mode")]
    pub completion_mode: CompletionMode,
    /// Threshold used by [`CompletionMode::FixedThreshold`].
    #[serde(default = "default_fixed_threshold")]
    pub fixed_threshold: usize,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            completion_mode: default_mode(),
            fixed_threshold: default_fixed_threshold(),
        }
    }
}

fn default_mode() -> CompletionMode {
    CompletionMode::FixedThreshold
}

fn default_fixed_threshold() -> usize {
    5
}
