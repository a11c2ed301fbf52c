//! Change-feed event types.
//!
//! Every successful store mutation is published as a [`ChangeEvent`].
//! Delivery to other sessions is at-least-once and unordered; consumers
//! deduplicate and reconcile (see the realtime crate).

mod change;

pub use change::{ChangeEvent, ChangeFilter, ChangeSource, MembershipAction};
