//! Transient user feedback. The pipeline only calls [`Notifier::notify`];
//! display and dismissal belong to whoever implements it.

use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
            NotificationKind::Warning => "warning",
            NotificationKind::Info => "info",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl Notification {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) >= self.ttl
    }
}

/// Fire-and-forget sink for user-facing messages.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, kind: NotificationKind);
}

/// Writes notifications to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, kind: NotificationKind) {
        match kind {
            NotificationKind::Error => error!(kind = kind.as_str(), "{message}"),
            NotificationKind::Warning => warn!(kind = kind.as_str(), "{message}"),
            NotificationKind::Success | NotificationKind::Info => {
                info!(kind = kind.as_str(), "{message}")
            }
        }
    }
}

/// Forwards notifications, stamped with a TTL, over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
    ttl: Duration,
}

impl ChannelNotifier {
    pub fn new(ttl: Duration) -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, ttl }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, message: &str, kind: NotificationKind) {
        let notification = Notification {
            kind,
            message: message.to_string(),
            created_at: Instant::now(),
            ttl: self.ttl,
        };
        if self.tx.send(notification).is_err() {
            warn!(dropped = message, "notification receiver closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_notifier_forwards_with_ttl() {
        let (notifier, mut rx) = ChannelNotifier::new(Duration::from_secs(3));
        notifier.notify("Draft saved successfully!", NotificationKind::Success);

        let received = rx.try_recv().unwrap();
        assert_eq!(received.kind, NotificationKind::Success);
        assert_eq!(received.message, "Draft saved successfully!");
        assert!(!received.is_expired(received.created_at));
        assert!(received.is_expired(received.created_at + Duration::from_secs(3)));
    }

    #[test]
    fn closed_receiver_does_not_panic() {
        let (notifier, rx) = ChannelNotifier::new(Duration::from_secs(1));
        drop(rx);
        notifier.notify("gone", NotificationKind::Info);
    }
}
