//! # projecthub-realtime
//!
//! Live reconciliation layer: consumes the at-least-once, unordered
//! change feed, merges push events into each viewer's in-memory
//! notification feed, and periodically supersedes that state with an
//! authoritative full aggregation. Scope switches tear subscriptions
//! down first and discard any in-flight reconciliation via scope tokens.

pub mod bridge;
pub mod dedup;
pub mod live;
pub mod registry;
pub mod scope;
