//! Ledger Service
//!
//! Append-only expert ledger. The wallet balance only ever moves together
//! with a completed ledger row, inside the same store transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

use super::types::{LedgerEntry, TransactionType, WalletAccount, WalletTransaction};
use crate::auth::Actor;
use crate::booking::Booking;
use crate::config::WalletConfig;
use crate::core_types::UserId;
use crate::error::{CoreError, CoreResult};
use crate::store::WalletStore;

/// Upper bound of rows returned by one history query
pub const MAX_HISTORY_LIMIT: usize = 200;

/// Pending entries settled per settlement run
const SETTLE_BATCH: usize = 500;

pub struct LedgerService {
    store: Arc<dyn WalletStore>,
    config: WalletConfig,
}

impl LedgerService {
    pub fn new(store: Arc<dyn WalletStore>, config: WalletConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    /// Ledger entries produced by completing `booking`: the earning and,
    /// with a positive fee rate, the withheld platform fee.
    ///
    /// Entries are deferred when a settlement delay is configured.
    pub fn booking_entries(&self, booking: &Booking) -> Vec<LedgerEntry> {
        let Some(amount) = booking.billable_amount() else {
            return Vec::new();
        };
        let reference = booking.ledger_reference();
        let deferred = self.config.settlement_delay_secs > 0;

        let mut entries = vec![LedgerEntry::new(
            booking.expert_id,
            amount,
            TransactionType::Earning,
            reference.clone(),
        )];

        let fee = (amount * self.config.platform_fee_rate).round_dp(2);
        if fee > Decimal::ZERO {
            entries.push(LedgerEntry::new(
                booking.expert_id,
                -fee,
                TransactionType::Fee,
                reference,
            ));
        }

        if deferred {
            entries.into_iter().map(LedgerEntry::deferred).collect()
        } else {
            entries
        }
    }

    /// Record a settled earning for `expert_id`.
    ///
    /// Idempotent per reference: a repeat fails with `DuplicateCredit`
    /// without touching the balance.
    pub async fn credit(
        &self,
        expert_id: UserId,
        amount: Decimal,
        reference: &str,
    ) -> CoreResult<WalletTransaction> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::InvalidInput(
                "Credit amount must be positive".to_string(),
            ));
        }
        let reference = validate_reference(reference)?;

        let entry = LedgerEntry::new(expert_id, amount, TransactionType::Earning, reference);
        match self.store.append_entry(&entry, Utc::now()).await {
            Ok(tx) => {
                info!(
                    expert_id = %expert_id,
                    amount = %amount,
                    reference = %reference,
                    tx_id = %tx.id,
                    "Wallet credited"
                );
                Ok(tx)
            }
            Err(CoreError::DuplicateCredit) => {
                warn!(expert_id = %expert_id, reference = %reference, "Duplicate credit rejected");
                Err(CoreError::DuplicateCredit)
            }
            Err(e) => Err(e),
        }
    }

    /// Signed admin correction. Never takes the balance below zero.
    pub async fn adjust(
        &self,
        actor: &Actor,
        expert_id: UserId,
        amount: Decimal,
        reference: &str,
    ) -> CoreResult<WalletTransaction> {
        actor.require_admin()?;
        if amount.is_zero() {
            return Err(CoreError::InvalidInput(
                "Adjustment amount must be non-zero".to_string(),
            ));
        }
        let reference = validate_reference(reference)?;

        let entry = LedgerEntry::new(expert_id, amount, TransactionType::Adjustment, reference);
        let tx = self.store.append_entry(&entry, Utc::now()).await?;
        info!(
            expert_id = %expert_id,
            amount = %amount,
            reference = %reference,
            admin_id = %actor.user_id,
            "Wallet adjusted"
        );
        Ok(tx)
    }

    /// Settle pending entries older than the configured delay
    pub async fn settle_due(&self, now: DateTime<Utc>) -> CoreResult<Vec<WalletTransaction>> {
        let delay = chrono::Duration::seconds(self.config.settlement_delay_secs as i64);
        let settled = self
            .store
            .settle_due(now - delay, now, SETTLE_BATCH)
            .await?;
        if !settled.is_empty() {
            info!(count = settled.len(), "Pending ledger entries settled");
        }
        Ok(settled)
    }

    /// Wallet of an expert; an empty one if nothing was ever recorded
    pub async fn wallet(&self, expert_id: UserId) -> CoreResult<WalletAccount> {
        Ok(self
            .store
            .get_wallet(expert_id)
            .await?
            .unwrap_or_else(|| WalletAccount::empty(expert_id, &self.config.currency, Utc::now())))
    }

    /// Newest first, at most [`MAX_HISTORY_LIMIT`] rows
    pub async fn transactions(
        &self,
        expert_id: UserId,
        limit: usize,
    ) -> CoreResult<Vec<WalletTransaction>> {
        self.store
            .list_transactions(expert_id, limit.clamp(1, MAX_HISTORY_LIMIT))
            .await
    }
}

fn validate_reference(reference: &str) -> CoreResult<&str> {
    let reference = reference.trim();
    if reference.is_empty() || reference.len() > 128 {
        return Err(CoreError::InvalidInput(
            "Reference must be 1-128 characters".to_string(),
        ));
    }
    Ok(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::wallet::TransactionStatus;
    use chrono::Duration;
    use uuid::Uuid;

    fn service(config: WalletConfig) -> (Arc<MemoryStore>, LedgerService) {
        let store = Arc::new(MemoryStore::new(config.currency.clone()));
        (store.clone(), LedgerService::new(store, config))
    }

    fn priced_booking(price: i64) -> Booking {
        let now = Utc::now();
        Booking::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            now,
            now + Duration::hours(1),
            Some(Decimal::from(price)),
            "USD",
            now,
        )
    }

    #[tokio::test]
    async fn test_credit_is_idempotent_per_reference() {
        let (store, ledger) = service(WalletConfig::default());
        let expert = Uuid::new_v4();

        ledger
            .credit(expert, Decimal::from(40), "booking:abc")
            .await
            .unwrap();
        let err = ledger
            .credit(expert, Decimal::from(40), "booking:abc")
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::DuplicateCredit);

        assert_eq!(ledger.wallet(expert).await.unwrap().balance, Decimal::from(40));
        assert_eq!(store.all_transactions(expert).await.len(), 1);
    }

    #[tokio::test]
    async fn test_credit_validation() {
        let (_, ledger) = service(WalletConfig::default());
        let expert = Uuid::new_v4();
        assert!(matches!(
            ledger.credit(expert, Decimal::ZERO, "x").await,
            Err(CoreError::InvalidInput(_))
        ));
        assert!(matches!(
            ledger.credit(expert, Decimal::ONE, "  ").await,
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_adjust_requires_admin_and_funds() {
        let (_, ledger) = service(WalletConfig::default());
        let expert = Uuid::new_v4();
        let admin = Actor::admin(Uuid::new_v4());

        let err = ledger
            .adjust(&Actor::expert(expert), expert, Decimal::ONE, "adj:1")
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::Forbidden);

        let err = ledger
            .adjust(&admin, expert, Decimal::from(-5), "adj:2")
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::InsufficientBalance);

        ledger
            .adjust(&admin, expert, Decimal::from(15), "adj:3")
            .await
            .unwrap();
        ledger
            .adjust(&admin, expert, Decimal::from(-5), "adj:4")
            .await
            .unwrap();
        assert_eq!(ledger.wallet(expert).await.unwrap().balance, Decimal::from(10));
    }

    #[test]
    fn test_booking_entries_with_fee_and_delay() {
        let config = WalletConfig {
            settlement_delay_secs: 3600,
            platform_fee_rate: Decimal::new(1, 1),
            ..WalletConfig::default()
        };
        let (_, ledger) = service(config);
        let booking = priced_booking(40);

        let entries = ledger.booking_entries(&booking);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].tx_type, TransactionType::Earning);
        assert_eq!(entries[0].amount, Decimal::from(40));
        assert_eq!(entries[1].tx_type, TransactionType::Fee);
        assert_eq!(entries[1].amount, Decimal::from(-4));
        assert!(entries.iter().all(|e| !e.settle_now));
        assert!(entries.iter().all(|e| e.reference == booking.ledger_reference()));
    }

    #[test]
    fn test_free_booking_has_no_entries() {
        let (_, ledger) = service(WalletConfig::default());
        let mut booking = priced_booking(0);
        assert!(ledger.booking_entries(&booking).is_empty());
        booking.price = None;
        assert!(ledger.booking_entries(&booking).is_empty());
    }

    #[tokio::test]
    async fn test_settle_due_moves_pending_to_balance() {
        let config = WalletConfig {
            settlement_delay_secs: 3600,
            ..WalletConfig::default()
        };
        let (store, ledger) = service(config);
        let booking = priced_booking(40);
        let created = Utc::now();

        for entry in ledger.booking_entries(&booking) {
            store.append_entry(&entry, created).await.unwrap();
        }
        assert!(ledger.wallet(booking.expert_id).await.unwrap().balance.is_zero());

        // Too early
        assert!(ledger.settle_due(created).await.unwrap().is_empty());

        let settled = ledger
            .settle_due(created + Duration::hours(2))
            .await
            .unwrap();
        assert_eq!(settled.len(), 1);
        assert_eq!(settled[0].status, TransactionStatus::Completed);
        assert_eq!(
            ledger.wallet(booking.expert_id).await.unwrap().balance,
            Decimal::from(40)
        );
    }
}
