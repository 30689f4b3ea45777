//! Transient user notices and delayed session events.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A message shown to the user until it expires.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    expires_at: Instant,
}

impl Notice {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Events the host must act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Navigate away from the editor.
    LeaveEditor,
}

/// Active notices plus events scheduled for later release.
#[derive(Debug)]
pub struct NoticeBoard {
    ttl: Duration,
    notices: Vec<Notice>,
    scheduled: Vec<(Instant, SessionEvent)>,
}

impl NoticeBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            notices: Vec::new(),
            scheduled: Vec::new(),
        }
    }

    pub fn post(&mut self, level: NoticeLevel, message: impl Into<String>, now: Instant) {
        let message = message.into();
        match level {
            NoticeLevel::Error => log::error!("{}", message),
            _ => log::info!("{}", message),
        }
        self.notices.push(Notice {
            level,
            message,
            expires_at: now + self.ttl,
        });
    }

    pub fn schedule(&mut self, event: SessionEvent, at: Instant) {
        self.scheduled.push((at, event));
    }

    pub fn active(&self) -> &[Notice] {
        &self.notices
    }

    pub fn has_pending(&self) -> bool {
        !self.scheduled.is_empty()
    }

    /// Drop expired notices and return the events that came due.
    pub fn tick(&mut self, now: Instant) -> Vec<SessionEvent> {
        self.notices.retain(|n| !n.is_expired(now));
        let mut due = Vec::new();
        self.scheduled.retain(|(at, event)| {
            if *at <= now {
                due.push(*event);
                false
            } else {
                true
            }
        });
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_expiry() {
        let now = Instant::now();
        let mut board = NoticeBoard::new(Duration::from_millis(3000));
        board.post(NoticeLevel::Success, "Saved", now);
        board.tick(now + Duration::from_millis(2999));
        assert_eq!(board.active().len(), 1);
        board.tick(now + Duration::from_millis(3000));
        assert!(board.active().is_empty());
    }

    #[test]
    fn test_scheduled_event_released_once() {
        let now = Instant::now();
        let mut board = NoticeBoard::new(Duration::from_secs(3));
        board.schedule(SessionEvent::LeaveEditor, now + Duration::from_millis(900));
        assert!(board.tick(now + Duration::from_millis(500)).is_empty());
        assert_eq!(board.tick(now + Duration::from_millis(900)), vec![SessionEvent::LeaveEditor]);
        assert!(board.tick(now + Duration::from_secs(5)).is_empty());
        assert!(!board.has_pending());
    }
}
