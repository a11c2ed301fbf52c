//! Project chat entities.

mod model;

pub use model::ChatMessage;
