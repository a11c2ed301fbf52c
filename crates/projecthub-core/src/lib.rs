//! # projecthub-core
//!
//! Core crate for ProjectHub. Contains configuration schemas, the unified
//! error system, change-feed event types and contracts, and viewer-scope
//! types shared by every other crate.
//!
//! This crate has **no** internal dependencies on other ProjectHub crates.

pub mod config;
pub mod error;
pub mod events;
pub mod feed;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
