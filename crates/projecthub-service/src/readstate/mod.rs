//! Pure read-state resolution over audit record snapshots.

mod resolver;

pub use resolver::{Completion, CompletionPolicy, acted_files, completion, unread_uploads};
