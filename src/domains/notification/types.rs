use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// How long a transient notice stays up
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
}

/// A transient user-facing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
    /// Identifies this posting; expiries for older generations are ignored.
    pub generation: u64,
    #[serde(skip)]
    pub expires_at: Instant,
}

/// Holds at most one notice.
///
/// Every post bumps a generation counter. An expiry only clears the notice
/// it was armed for, so a stale timer never blanks a newer message. Notices
/// also lapse on their own once their deadline passes.
#[derive(Debug)]
pub struct NotificationCenter {
    current: Option<Notice>,
    generation: u64,
    ttl: Duration,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_NOTICE_TTL)
    }
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            current: None,
            generation: 0,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Replaces whatever is showing. Returns the new generation.
    pub fn post(&mut self, text: impl Into<String>, kind: NoticeKind) -> u64 {
        self.post_at(text, kind, Instant::now())
    }

    pub fn post_at(&mut self, text: impl Into<String>, kind: NoticeKind, now: Instant) -> u64 {
        self.generation += 1;
        self.current = Some(Notice {
            text: text.into(),
            kind,
            generation: self.generation,
            expires_at: now + self.ttl,
        });
        self.generation
    }

    /// Clears the notice if it is still the one posted as `generation`.
    pub fn expire(&mut self, generation: u64) -> bool {
        match &self.current {
            Some(notice) if notice.generation == generation => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    pub fn current(&self) -> Option<&Notice> {
        self.current_at(Instant::now())
    }

    pub fn current_at(&self, now: Instant) -> Option<&Notice> {
        self.current.as_ref().filter(|n| now < n.expires_at)
    }
}
