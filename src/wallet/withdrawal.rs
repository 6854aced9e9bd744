//! Withdrawal Workflow
//!
//! ```text
//! PENDING ──approve──▶ APPROVED ──paid──▶ PAID
//!    │
//!    └──reject──▶ REJECTED
//! ```
//!
//! Requesting moves no funds. Approval debits the wallet, re-validating the
//! balance under lock. Rejection has no ledger effect.

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use super::types::{WithdrawalRequest, WithdrawalStatus};
use crate::auth::Actor;
use crate::core_types::{UserId, WithdrawalId};
use crate::error::{CoreError, CoreResult};
use crate::notification::{EventType, Notifier};
use crate::store::WalletStore;

pub struct WithdrawalService {
    store: Arc<dyn WalletStore>,
    notifier: Notifier,
}

impl WithdrawalService {
    pub fn new(store: Arc<dyn WalletStore>, notifier: Notifier) -> Self {
        Self { store, notifier }
    }

    /// Create a PENDING request if the balance covers it
    pub async fn request_withdrawal(
        &self,
        expert_id: UserId,
        amount: Decimal,
    ) -> CoreResult<WithdrawalRequest> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::InvalidInput(
                "Withdrawal amount must be positive".to_string(),
            ));
        }

        let request = WithdrawalRequest::new(expert_id, amount, Utc::now());
        if let Err(e) = self.store.insert_withdrawal_if_funded(&request).await {
            if e == CoreError::InsufficientBalance {
                warn!(expert_id = %expert_id, amount = %amount, "Withdrawal exceeds balance");
            }
            return Err(e);
        }

        info!(
            withdrawal_id = %request.id,
            expert_id = %expert_id,
            amount = %amount,
            "Withdrawal requested"
        );
        Ok(request)
    }

    /// PENDING → APPROVED with the wallet debit, admin only
    pub async fn approve_withdrawal(
        &self,
        id: WithdrawalId,
        actor: &Actor,
    ) -> CoreResult<WithdrawalRequest> {
        actor.require_admin()?;

        let (request, debit) = self
            .store
            .approve_withdrawal(id, actor.user_id, Utc::now())
            .await?;

        info!(
            withdrawal_id = %id,
            expert_id = %request.expert_id,
            amount = %request.amount,
            tx_id = %debit.id,
            admin_id = %actor.user_id,
            "Withdrawal approved"
        );
        self.notify(&request, EventType::PaymentReceived);
        Ok(request)
    }

    /// PENDING → REJECTED, admin only
    pub async fn reject_withdrawal(
        &self,
        id: WithdrawalId,
        actor: &Actor,
        reason: &str,
    ) -> CoreResult<WithdrawalRequest> {
        actor.require_admin()?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(CoreError::InvalidInput(
                "Rejection reason is required".to_string(),
            ));
        }

        if !self
            .store
            .reject_withdrawal(id, actor.user_id, reason, Utc::now())
            .await?
        {
            return Err(self.not_in_state(id, WithdrawalStatus::Pending).await);
        }

        let request = self.load(id).await?;
        info!(withdrawal_id = %id, admin_id = %actor.user_id, reason, "Withdrawal rejected");
        self.notify(&request, EventType::PaymentFailed);
        Ok(request)
    }

    /// APPROVED → PAID once the payout provider confirmed the transfer
    pub async fn mark_withdrawal_paid(
        &self,
        id: WithdrawalId,
        actor: &Actor,
        payout_reference: &str,
    ) -> CoreResult<WithdrawalRequest> {
        actor.require_admin()?;
        let payout_reference = payout_reference.trim();
        if payout_reference.is_empty() {
            return Err(CoreError::InvalidInput(
                "Payout reference is required".to_string(),
            ));
        }

        if !self
            .store
            .mark_withdrawal_paid(id, payout_reference, Utc::now())
            .await?
        {
            return Err(self.not_in_state(id, WithdrawalStatus::Approved).await);
        }

        let request = self.load(id).await?;
        info!(withdrawal_id = %id, payout_reference, "Withdrawal paid");
        self.notify(&request, EventType::PaymentReceived);
        Ok(request)
    }

    /// Requests of one expert, newest first
    pub async fn withdrawals(&self, expert_id: UserId) -> CoreResult<Vec<WithdrawalRequest>> {
        self.store.list_withdrawals(expert_id).await
    }

    /// Review queue for admins, oldest first
    pub async fn pending_withdrawals(
        &self,
        actor: &Actor,
        limit: usize,
    ) -> CoreResult<Vec<WithdrawalRequest>> {
        actor.require_admin()?;
        self.store.pending_withdrawals(limit.clamp(1, 500)).await
    }

    async fn load(&self, id: WithdrawalId) -> CoreResult<WithdrawalRequest> {
        self.store
            .get_withdrawal(id)
            .await?
            .ok_or_else(|| CoreError::withdrawal_not_found(id))
    }

    /// Error for a failed conditional update: missing or in another state
    async fn not_in_state(&self, id: WithdrawalId, expected: WithdrawalStatus) -> CoreError {
        match self.load(id).await {
            Ok(current) => CoreError::InvalidState(format!(
                "Withdrawal request is {}, expected {}",
                current.status, expected
            )),
            Err(e) => e,
        }
    }

    fn notify(&self, request: &WithdrawalRequest, event: EventType) {
        self.notifier.notify(
            request.expert_id,
            event,
            json!({
                "withdrawal_id": request.id,
                "amount": request.amount.to_string(),
                "status": request.status,
                "reason": request.rejection_reason,
            }),
            Some(format!("/wallet/withdrawals/{}", request.id)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::mock::drain;
    use crate::notification::{NotificationDispatcher, notification_channel};
    use crate::store::MemoryStore;
    use crate::wallet::{LedgerEntry, TransactionType};
    use uuid::Uuid;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: WithdrawalService,
        dispatcher: NotificationDispatcher,
        expert: UserId,
        admin: Actor,
    }

    async fn fixture(balance: i64) -> Fixture {
        let store = Arc::new(MemoryStore::default());
        let (notifier, dispatcher) = notification_channel(16);
        let expert = Uuid::new_v4();
        if balance > 0 {
            store
                .append_entry(
                    &LedgerEntry::new(
                        expert,
                        Decimal::from(balance),
                        TransactionType::Earning,
                        "booking:seed",
                    ),
                    Utc::now(),
                )
                .await
                .unwrap();
        }
        Fixture {
            service: WithdrawalService::new(store.clone(), notifier),
            store,
            dispatcher,
            expert,
            admin: Actor::admin(Uuid::new_v4()),
        }
    }

    async fn balance(f: &Fixture) -> Decimal {
        f.store
            .get_wallet(f.expert)
            .await
            .unwrap()
            .map(|w| w.balance)
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_request_exceeding_balance() {
        let f = fixture(30).await;
        let err = f
            .service
            .request_withdrawal(f.expert, Decimal::from(31))
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::InsufficientBalance);
        assert!(f.service.withdrawals(f.expert).await.unwrap().is_empty());
        assert_eq!(balance(&f).await, Decimal::from(30));
    }

    #[tokio::test]
    async fn test_request_rejects_non_positive() {
        let f = fixture(30).await;
        assert!(matches!(
            f.service.request_withdrawal(f.expert, Decimal::ZERO).await,
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_request_moves_no_funds_and_approve_debits() {
        let mut f = fixture(100).await;
        let req = f
            .service
            .request_withdrawal(f.expert, Decimal::from(60))
            .await
            .unwrap();
        assert_eq!(req.status, WithdrawalStatus::Pending);
        assert_eq!(balance(&f).await, Decimal::from(100));

        let approved = f.service.approve_withdrawal(req.id, &f.admin).await.unwrap();
        assert_eq!(approved.status, WithdrawalStatus::Approved);
        assert_eq!(approved.processed_by, Some(f.admin.user_id));
        assert_eq!(balance(&f).await, Decimal::from(40));

        let debits: Vec<_> = f
            .store
            .all_transactions(f.expert)
            .await
            .into_iter()
            .filter(|t| t.tx_type == TransactionType::Withdrawal)
            .collect();
        assert_eq!(debits.len(), 1);
        assert_eq!(debits[0].amount, Decimal::from(-60));
        assert_eq!(debits[0].reference, format!("withdrawal:{}", req.id));

        let sent = drain(&mut f.dispatcher);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].user_id, f.expert);
        assert_eq!(sent[0].event_type, EventType::PaymentReceived);
    }

    #[tokio::test]
    async fn test_approve_revalidates_balance() {
        let f = fixture(100).await;
        let first = f
            .service
            .request_withdrawal(f.expert, Decimal::from(70))
            .await
            .unwrap();
        let second = f
            .service
            .request_withdrawal(f.expert, Decimal::from(70))
            .await
            .unwrap();

        f.service
            .approve_withdrawal(first.id, &f.admin)
            .await
            .unwrap();
        let err = f
            .service
            .approve_withdrawal(second.id, &f.admin)
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::InsufficientBalance);

        let still = f.store.get_withdrawal(second.id).await.unwrap().unwrap();
        assert_eq!(still.status, WithdrawalStatus::Pending);
        assert_eq!(balance(&f).await, Decimal::from(30));
    }

    #[tokio::test]
    async fn test_admin_only() {
        let f = fixture(100).await;
        let req = f
            .service
            .request_withdrawal(f.expert, Decimal::from(10))
            .await
            .unwrap();
        let expert = Actor::expert(f.expert);

        assert_eq!(
            f.service.approve_withdrawal(req.id, &expert).await.unwrap_err(),
            CoreError::Forbidden
        );
        assert_eq!(
            f.service
                .reject_withdrawal(req.id, &expert, "no")
                .await
                .unwrap_err(),
            CoreError::Forbidden
        );
        assert_eq!(
            f.service.pending_withdrawals(&expert, 10).await.unwrap_err(),
            CoreError::Forbidden
        );
    }

    #[tokio::test]
    async fn test_reject_then_approve_is_invalid_state() {
        let mut f = fixture(100).await;
        let req = f
            .service
            .request_withdrawal(f.expert, Decimal::from(10))
            .await
            .unwrap();

        let rejected = f
            .service
            .reject_withdrawal(req.id, &f.admin, "bank details missing")
            .await
            .unwrap();
        assert_eq!(rejected.status, WithdrawalStatus::Rejected);
        assert_eq!(
            rejected.rejection_reason.as_deref(),
            Some("bank details missing")
        );

        let err = f
            .service
            .approve_withdrawal(req.id, &f.admin)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));
        let err = f
            .service
            .reject_withdrawal(req.id, &f.admin, "again")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));
        assert_eq!(balance(&f).await, Decimal::from(100));

        let sent = drain(&mut f.dispatcher);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].event_type, EventType::PaymentFailed);
    }

    #[tokio::test]
    async fn test_mark_paid_requires_approved() {
        let f = fixture(100).await;
        let req = f
            .service
            .request_withdrawal(f.expert, Decimal::from(10))
            .await
            .unwrap();

        let err = f
            .service
            .mark_withdrawal_paid(req.id, &f.admin, "payout-1")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));

        f.service.approve_withdrawal(req.id, &f.admin).await.unwrap();
        let paid = f
            .service
            .mark_withdrawal_paid(req.id, &f.admin, "payout-1")
            .await
            .unwrap();
        assert_eq!(paid.status, WithdrawalStatus::Paid);
        assert_eq!(paid.payout_reference.as_deref(), Some("payout-1"));
        assert!(paid.paid_at.is_some());
    }

    #[tokio::test]
    async fn test_unknown_withdrawal() {
        let f = fixture(0).await;
        let err = f
            .service
            .approve_withdrawal(Uuid::new_v4(), &f.admin)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
        let err = f
            .service
            .reject_withdrawal(Uuid::new_v4(), &f.admin, "x")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
