//! Delivery sinks
//!
//! The persistent in-app inbox is implemented by the stores themselves
//! (`PgStore`, `MemoryStore`); push and email providers plug in through
//! the same [`NotificationSink`] trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::{Notification, NotificationSink};

/// Writes notifications to the log only
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn deliver(&self, notification: &Notification) -> anyhow::Result<()> {
        info!(
            notification_id = %notification.id,
            user_id = %notification.user_id,
            event = %notification.event_type,
            link = notification.link.as_deref().unwrap_or(""),
            payload = %notification.payload,
            "Notification"
        );
        Ok(())
    }
}

/// Delivers to every inner sink; fails if any of them failed
pub struct FanoutSink {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn NotificationSink>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl NotificationSink for FanoutSink {
    fn name(&self) -> &'static str {
        "fanout"
    }

    async fn deliver(&self, notification: &Notification) -> anyhow::Result<()> {
        let mut failed = Vec::new();
        for sink in &self.sinks {
            if let Err(e) = sink.deliver(notification).await {
                failed.push(format!("{}: {}", sink.name(), e));
            }
        }
        if failed.is_empty() {
            Ok(())
        } else {
            anyhow::bail!("{}", failed.join("; "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::EventType;
    use crate::notification::mock::RecordingSink;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample() -> Notification {
        Notification {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            event_type: EventType::BookingReminder,
            payload: serde_json::json!({"booking_id": "b"}),
            link: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_fanout_delivers_to_all_even_if_one_fails() {
        let ok = Arc::new(RecordingSink::new());
        let bad = Arc::new(RecordingSink::new());
        bad.set_fail(true);

        let fanout = FanoutSink::new(vec![bad.clone(), ok.clone(), Arc::new(LogSink)]);
        let result = fanout.deliver(&sample()).await;

        assert!(result.is_err());
        assert_eq!(ok.delivered().len(), 1);
        assert!(bad.delivered().is_empty());
    }
}
