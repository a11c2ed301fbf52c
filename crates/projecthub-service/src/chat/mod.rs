//! Project chat posting and mention fan-out.

mod service;

pub use service::{ChatService, extract_mentions};
