//! Change-feed transports.

mod memory_feed;

pub use memory_feed::MemoryChangeFeed;
