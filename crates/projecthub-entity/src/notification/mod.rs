//! Notification entities: per-kind items, identity keys, and the grouped
//! per-viewer feed.

mod model;

pub use model::{
    ChatMention, EventNotice, FileUploadNotice, NotificationFeed, NotificationItem,
    NotificationKey, NotificationKind,
};
