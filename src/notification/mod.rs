//! Notification Dispatch
//!
//! Fire-and-forget publisher. Services call [`Notifier::notify`] after their
//! persistence transaction commits; the call enqueues onto a bounded channel
//! and returns immediately. A [`NotificationDispatcher`] task drains the
//! channel into a [`NotificationSink`] (in-app inbox, push, email).
//!
//! Delivery is best-effort: a full queue, a closed channel or a sink error is
//! logged and never reaches the triggering operation.

pub mod sinks;

pub use sinks::{FanoutSink, LogSink};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::core_types::{NotificationId, UserId, new_id};

/// Notification event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    BookingCreated,
    BookingCanceled,
    BookingReminder,
    PaymentReceived,
    PaymentFailed,
    MessageReceived,
    SecurityAlert,
    PlatformUpdate,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::BookingCreated => "booking_created",
            EventType::BookingCanceled => "booking_canceled",
            EventType::BookingReminder => "booking_reminder",
            EventType::PaymentReceived => "payment_received",
            EventType::PaymentFailed => "payment_failed",
            EventType::MessageReceived => "message_received",
            EventType::SecurityAlert => "security_alert",
            EventType::PlatformUpdate => "platform_update",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub event_type: EventType,
    pub payload: serde_json::Value,
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// External delivery collaborator (push, email, in-app inbox)
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Sink name for logging
    fn name(&self) -> &'static str;

    async fn deliver(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// Publisher handle shared by the services
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<Notification>,
}

impl Notifier {
    /// Enqueue a notification. Never blocks, never fails the caller.
    pub fn notify(
        &self,
        user_id: UserId,
        event_type: EventType,
        payload: serde_json::Value,
        link: Option<String>,
    ) {
        let notification = Notification {
            id: new_id(),
            user_id,
            event_type,
            payload,
            link,
            created_at: Utc::now(),
        };

        match self.tx.try_send(notification) {
            Ok(()) => debug!(user_id = %user_id, event = %event_type, "Notification queued"),
            Err(mpsc::error::TrySendError::Full(n)) => {
                warn!(user_id = %n.user_id, event = %n.event_type, "Notification queue full, dropping")
            }
            Err(mpsc::error::TrySendError::Closed(n)) => {
                warn!(user_id = %n.user_id, event = %n.event_type, "Notification dispatcher stopped, dropping")
            }
        }
    }
}

/// Consumer side, run as a background task
pub struct NotificationDispatcher {
    rx: mpsc::Receiver<Notification>,
}

impl NotificationDispatcher {
    /// Deliver until every [`Notifier`] is dropped.
    ///
    /// Returns the number of notifications delivered successfully.
    pub async fn run(mut self, sink: Arc<dyn NotificationSink>) -> usize {
        info!(sink = sink.name(), "Starting notification dispatcher");
        let mut delivered = 0;

        while let Some(notification) = self.rx.recv().await {
            match sink.deliver(&notification).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!(
                    sink = sink.name(),
                    user_id = %notification.user_id,
                    event = %notification.event_type,
                    error = %e,
                    "Notification delivery failed"
                ),
            }
        }

        info!(delivered, "Notification dispatcher stopped");
        delivered
    }
}

/// Create a new notifier/dispatcher pair
pub fn notification_channel(buffer: usize) -> (Notifier, NotificationDispatcher) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    (Notifier { tx }, NotificationDispatcher { rx })
}

/// Recording sink for testing
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    pub struct RecordingSink {
        delivered: Mutex<Vec<Notification>>,
        fail: AtomicBool,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_fail(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        pub fn delivered(&self) -> Vec<Notification> {
            self.delivered.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn deliver(&self, notification: &Notification) -> anyhow::Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("mock delivery failure");
            }
            self.delivered.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    /// Drain everything queued so far into a `Vec` without a background task
    pub fn drain(dispatcher: &mut NotificationDispatcher) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(n) = dispatcher.rx.try_recv() {
            out.push(n);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{RecordingSink, drain};
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_event_type_names() {
        assert_eq!(EventType::BookingCreated.as_str(), "booking_created");
        assert_eq!(
            serde_json::to_string(&EventType::PaymentFailed).unwrap(),
            "\"payment_failed\""
        );
    }

    #[test]
    fn test_notify_never_blocks_when_full() {
        let (notifier, mut dispatcher) = notification_channel(1);
        let user = Uuid::new_v4();

        notifier.notify(user, EventType::PlatformUpdate, serde_json::json!({}), None);
        // Queue is full; this must return immediately
        notifier.notify(user, EventType::SecurityAlert, serde_json::json!({}), None);

        let queued = drain(&mut dispatcher);
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].event_type, EventType::PlatformUpdate);
    }

    #[test]
    fn test_notify_after_dispatcher_dropped() {
        let (notifier, dispatcher) = notification_channel(4);
        drop(dispatcher);
        notifier.notify(
            Uuid::new_v4(),
            EventType::MessageReceived,
            serde_json::json!({"from": "x"}),
            Some("/messages".into()),
        );
    }

    #[tokio::test]
    async fn test_dispatcher_delivers_and_survives_failures() {
        let (notifier, dispatcher) = notification_channel(8);
        let sink = Arc::new(RecordingSink::new());
        let user = Uuid::new_v4();

        sink.set_fail(true);
        notifier.notify(user, EventType::PaymentFailed, serde_json::json!({}), None);
        let handle = tokio::spawn(dispatcher.run(sink.clone()));

        // Let the failing delivery happen before switching the sink back
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        sink.set_fail(false);
        notifier.notify(user, EventType::PaymentReceived, serde_json::json!({}), None);
        drop(notifier);

        let delivered = handle.await.unwrap();
        assert_eq!(delivered, 1);
        let got = sink.delivered();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].event_type, EventType::PaymentReceived);
    }
}
