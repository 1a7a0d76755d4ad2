pub mod service;
pub mod types;

pub use service::{schedule_expiry, SharedNotifications};
pub use types::{Notice, NoticeKind, NotificationCenter, DEFAULT_NOTICE_TTL};
