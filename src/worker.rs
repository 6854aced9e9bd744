//! Maintenance Worker
//!
//! Background loop for the periodic jobs: settling pending earnings,
//! sending booking reminders and recomputing expert rankings.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info};

use crate::booking::BookingService;
use crate::config::{BookingConfig, WorkerConfig};
use crate::error::CoreResult;
use crate::ranking::RankingEngine;
use crate::wallet::LedgerService;

pub struct MaintenanceWorker {
    bookings: Arc<BookingService>,
    ledger: Arc<LedgerService>,
    ranking: RankingEngine,
    config: WorkerConfig,
    reminder_lead: chrono::Duration,
}

impl MaintenanceWorker {
    pub fn new(
        bookings: Arc<BookingService>,
        ledger: Arc<LedgerService>,
        ranking: RankingEngine,
        config: WorkerConfig,
        booking: &BookingConfig,
    ) -> Self {
        Self {
            bookings,
            ledger,
            ranking,
            config,
            reminder_lead: chrono::Duration::seconds(booking.reminder_lead_secs as i64),
        }
    }

    /// Run the worker loop forever
    pub async fn run(&self) -> ! {
        info!(
            settlement_interval_secs = self.config.settlement_interval_secs,
            reminder_interval_secs = self.config.reminder_interval_secs,
            ranking_interval_secs = self.config.ranking_interval_secs,
            "Starting maintenance worker"
        );

        let mut settlement = ticker(self.config.settlement_interval_secs);
        let mut reminders = ticker(self.config.reminder_interval_secs);
        let mut ranking = ticker(self.config.ranking_interval_secs);

        loop {
            tokio::select! {
                _ = settlement.tick() => {
                    if let Err(e) = self.settle().await {
                        error!(error = %e, "Settlement run failed");
                    }
                }
                _ = reminders.tick() => {
                    if let Err(e) = self.remind().await {
                        error!(error = %e, "Reminder run failed");
                    }
                }
                _ = ranking.tick() => {
                    if let Err(e) = self.ranking.recompute_all().await {
                        error!(error = %e, "Ranking recompute run failed");
                    }
                }
            }
        }
    }

    /// Settle due ledger entries once
    pub async fn settle(&self) -> CoreResult<usize> {
        let settled = self.ledger.settle_due(Utc::now()).await?;
        debug!(count = settled.len(), "Settlement run finished");
        Ok(settled.len())
    }

    /// Send due booking reminders once
    pub async fn remind(&self) -> CoreResult<usize> {
        self.bookings
            .send_reminders(Utc::now(), self.reminder_lead)
            .await
    }
}

fn ticker(secs: u64) -> tokio::time::Interval {
    let mut ticker = interval(Duration::from_secs(secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Actor;
    use crate::booking::NewBooking;
    use crate::config::{RankingConfig, WalletConfig};
    use crate::notification::notification_channel;
    use crate::store::MemoryStore;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_single_runs() {
        let store = Arc::new(MemoryStore::default());
        let (notifier, _dispatcher) = notification_channel(16);
        let ledger = Arc::new(LedgerService::new(store.clone(), WalletConfig::default()));
        let ranking = RankingEngine::new(store.clone(), RankingConfig::default());
        let bookings = Arc::new(BookingService::new(
            store.clone(),
            ledger.clone(),
            ranking.clone(),
            notifier,
        ));
        let worker = MaintenanceWorker::new(
            bookings.clone(),
            ledger,
            ranking,
            WorkerConfig::default(),
            &BookingConfig::default(),
        );

        let client = Actor::client(Uuid::new_v4());
        let expert = Actor::expert(Uuid::new_v4());
        let start = Utc::now() + chrono::Duration::minutes(20);
        let booking = bookings
            .create(
                &client,
                NewBooking {
                    expert_id: expert.user_id,
                    scheduled_start: start,
                    scheduled_end: start + chrono::Duration::hours(1),
                    price: Some(Decimal::from(10)),
                },
            )
            .await
            .unwrap();
        bookings.confirm(booking.id, &expert).await.unwrap();

        assert_eq!(worker.settle().await.unwrap(), 0);
        assert_eq!(worker.remind().await.unwrap(), 1);
        assert_eq!(worker.remind().await.unwrap(), 0);
    }

    #[test]
    fn test_ticker_never_zero() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        rt.block_on(async {
            let t = ticker(0);
            assert_eq!(t.period(), Duration::from_secs(1));
        });
    }
}
