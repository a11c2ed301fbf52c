//! # projecthub-api
//!
//! HTTP surface for ProjectHub: audit recording endpoints, the grouped
//! notification feed and unread counter, acknowledgement endpoints, chat
//! posting, roster lookup, and the live-feed WebSocket.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
