use std::time::{Duration, Instant};

pub const ERROR_DISPLAY_DURATION: Duration = Duration::from_secs(5);
pub const SUCCESS_DISPLAY_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub expires_at: Instant,
}

/// The single user-visible message slot. Showing a message replaces whatever
/// was there; each message hides itself once its deadline passes.
#[derive(Debug, Clone, Default)]
pub struct NoticeSlot {
    current: Option<Notice>,
}

impl NoticeSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display_error(&mut self, message: impl Into<String>) {
        self.show(NoticeLevel::Error, message.into(), ERROR_DISPLAY_DURATION);
    }

    pub fn display_success(&mut self, message: impl Into<String>) {
        self.show(NoticeLevel::Success, message.into(), SUCCESS_DISPLAY_DURATION);
    }

    /// Hide an error immediately. Success messages are left to expire.
    pub fn hide_error(&mut self) {
        if matches!(&self.current, Some(n) if n.level == NoticeLevel::Error) {
            self.current = None;
        }
    }

    pub fn visible(&self) -> Option<&Notice> {
        self.visible_at(Instant::now())
    }

    pub fn visible_at(&self, now: Instant) -> Option<&Notice> {
        self.current.as_ref().filter(|n| now < n.expires_at)
    }

    /// Take the visible notice so it is shown exactly once.
    pub fn take_visible(&mut self) -> Option<Notice> {
        let now = Instant::now();
        self.current.take().filter(|n| now < n.expires_at)
    }

    fn show(&mut self, level: NoticeLevel, message: String, ttl: Duration) {
        self.current = Some(Notice {
            level,
            message,
            expires_at: Instant::now() + ttl,
        });
    }
}
