//! # projecthub-service
//!
//! Business logic for ProjectHub: the audit ledger, the pure read-state
//! resolver, the notification aggregator with its acknowledgement
//! overlay, and the chat/event fan-out that feeds it.

pub mod audit;
pub mod chat;
pub mod notification;
pub mod readstate;
