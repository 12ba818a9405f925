//! Transient notifications
//!
//! The workflow reports every outcome to a [`Notifier`]. Notifications carry
//! their own lifetime and are expected to disappear on their own; nothing
//! here needs acknowledging.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    /// Neutral information
    Info,
    /// Operation succeeded
    Success,
    /// Recoverable oddity
    Warning,
    /// Operation failed
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// A transient, auto-dismissing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Severity
    pub level: NotificationLevel,
    /// Text shown to the user
    pub message: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Lifetime
    pub ttl: Duration,
}

impl Notification {
    /// Create notification stamped now
    #[must_use]
    pub fn new(level: NotificationLevel, message: impl Into<String>, ttl: Duration) -> Self {
        Self {
            level,
            message: message.into(),
            created_at: Utc::now(),
            ttl,
        }
    }

    /// Whether the notification has outlived its ttl at `now`
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        (now - self.created_at)
            .to_std()
            .is_ok_and(|elapsed| elapsed >= self.ttl)
    }

    /// Whether the notification has expired
    #[inline]
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Presentation sink for notifications
pub trait Notifier: Send + Sync + fmt::Debug {
    /// Show a notification
    fn notify(&self, notification: Notification);
}

/// Notifier that forwards to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let message = notification.message.as_str();
        match notification.level {
            NotificationLevel::Info | NotificationLevel::Success => {
                tracing::info!(level = %notification.level, "{message}");
            }
            NotificationLevel::Warning => tracing::warn!("{message}"),
            NotificationLevel::Error => tracing::error!("{message}"),
        }
    }
}

/// Notifier that keeps notifications in memory
///
/// Used by front ends that render a notification area, and by tests.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    entries: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    /// Create empty notifier
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification received, including expired ones
    #[must_use]
    pub fn all(&self) -> Vec<Notification> {
        self.entries.lock().clone()
    }

    /// Notifications still within their ttl
    #[must_use]
    pub fn active(&self) -> Vec<Notification> {
        let now = Utc::now();
        self.entries
            .lock()
            .iter()
            .filter(|n| !n.is_expired_at(now))
            .cloned()
            .collect()
    }

    /// Most recent notification
    #[must_use]
    pub fn last(&self) -> Option<Notification> {
        self.entries.lock().last().cloned()
    }

    /// Messages of a given level, oldest first
    #[must_use]
    pub fn messages(&self, level: NotificationLevel) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|n| n.level == level)
            .map(|n| n.message.clone())
            .collect()
    }

    /// Drop expired notifications, returning how many were removed
    pub fn dismiss_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|n| !n.is_expired_at(now));
        before - entries.len()
    }

    /// Drop everything
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        self.entries.lock().push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_follows_ttl() {
        let n = Notification::new(NotificationLevel::Error, "boom", Duration::from_millis(3000));
        assert!(!n.is_expired_at(n.created_at));
        assert!(!n.is_expired_at(n.created_at + chrono::Duration::milliseconds(2999)));
        assert!(n.is_expired_at(n.created_at + chrono::Duration::milliseconds(3000)));
        // Clock skew backwards never expires
        assert!(!n.is_expired_at(n.created_at - chrono::Duration::seconds(1)));
    }

    #[test]
    fn memory_notifier_dismisses_expired() {
        let notifier = MemoryNotifier::new();
        notifier.notify(Notification::new(NotificationLevel::Info, "old", Duration::ZERO));
        notifier.notify(Notification::new(NotificationLevel::Error, "fresh", Duration::from_secs(60)));

        assert_eq!(notifier.all().len(), 2);
        assert_eq!(notifier.active().len(), 1);
        assert_eq!(notifier.messages(NotificationLevel::Error), vec!["fresh"]);

        assert_eq!(notifier.dismiss_expired(), 1);
        assert_eq!(notifier.last().map(|n| n.message), Some("fresh".to_string()));

        notifier.clear();
        assert!(notifier.all().is_empty());
    }
}
