//! Scheduled-event entities.

mod model;

pub use model::ProjectEvent;
