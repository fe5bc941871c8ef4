//! Transient toast notifications. Each one disappears after a fixed interval.

use std::time::{Duration, Instant};

pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    pub shown_at: Instant,
}

impl Notification {
    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }
}

#[derive(Debug, Clone)]
pub struct NotificationCenter {
    ttl: Duration,
    queue: Vec<Notification>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_TTL)
    }
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, queue: Vec::new() }
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(message.into(), NotificationKind::Success, Instant::now());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(message.into(), NotificationKind::Error, Instant::now());
    }

    pub fn push(&mut self, message: String, kind: NotificationKind, shown_at: Instant) {
        self.queue.push(Notification { message, kind, shown_at });
    }

    /// Notifications still on screen at `now`; expired ones are dropped.
    pub fn visible(&mut self, now: Instant) -> &[Notification] {
        let ttl = self.ttl;
        self.queue
            .retain(|n| now.saturating_duration_since(n.shown_at) < ttl);
        &self.queue
    }

    /// Hands every pending notification to the caller, e.g. a CLI printing them once.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.queue)
    }

    pub fn last(&self) -> Option<&Notification> {
        self.queue.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notifications_expire_after_ttl() {
        let mut center = NotificationCenter::new(Duration::from_secs(3));
        let start = Instant::now();
        center.push("saved".into(), NotificationKind::Success, start);
        center.push("failed".into(), NotificationKind::Error, start + Duration::from_secs(2));

        assert_eq!(center.visible(start + Duration::from_secs(1)).len(), 2);
        let visible = center.visible(start + Duration::from_secs(4));
        assert_eq!(visible.len(), 1);
        assert!(visible[0].is_error());
        assert!(center.visible(start + Duration::from_secs(6)).is_empty());
    }

    #[test]
    fn test_drain_empties_queue() {
        let mut center = NotificationCenter::default();
        center.success("ok");
        assert_eq!(center.last().map(|n| n.message.as_str()), Some("ok"));
        assert_eq!(center.drain().len(), 1);
        assert!(center.last().is_none());
    }
}
