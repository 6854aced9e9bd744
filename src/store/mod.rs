//! Persistence collaborator
//!
//! The core holds no mutable shared state; every invariant that must survive
//! concurrent, stateless request handlers is delegated to the store through
//! conditional updates and uniqueness constraints:
//!
//! - booking transitions are compare-and-swap on the current status
//! - ledger entries are unique per (expert_id, reference, tx_type)
//! - balance changes never take a wallet below zero
//! - multi-row effects (status + ledger, approval + debit) are one transaction
//!
//! Implementations:
//! - [`PgStore`]: PostgreSQL via `sqlx`
//! - [`MemoryStore`]: single-mutex store for development and tests

pub mod memory;
pub mod postgres;
pub mod schema;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::booking::{Booking, Review, Transition};
use crate::core_types::{BookingId, UserId, WithdrawalId};
use crate::error::CoreResult;
use crate::ranking::{RankingScore, RankingSignals};
use crate::wallet::{LedgerEntry, WalletAccount, WalletTransaction, WithdrawalRequest};

/// Booking and review persistence
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert_booking(&self, booking: &Booking) -> CoreResult<()>;

    async fn get_booking(&self, id: BookingId) -> CoreResult<Option<Booking>>;

    /// Atomic CAS: apply `transition` only if the current status equals
    /// `transition.from`.
    ///
    /// Returns true if applied, false if the status didn't match.
    async fn transition_booking(&self, id: BookingId, transition: &Transition)
    -> CoreResult<bool>;

    /// Atomic CAS IN_PROGRESS → COMPLETED together with the booking's ledger
    /// entries, in one transaction.
    ///
    /// Entries already recorded for the same (expert, reference, type) are
    /// skipped, so replays never double-credit. Returns `None` when the CAS
    /// did not match, otherwise the newly written ledger rows.
    async fn complete_booking(
        &self,
        id: BookingId,
        transition: &Transition,
        entries: &[LedgerEntry],
    ) -> CoreResult<Option<Vec<WalletTransaction>>>;

    /// Insert a review. Fails with `DuplicateReview` when the booking
    /// already has one.
    async fn insert_review(&self, review: &Review) -> CoreResult<()>;

    async fn review_for_booking(&self, booking_id: BookingId) -> CoreResult<Option<Review>>;

    /// Confirmed bookings starting in `[from, until)` that were not reminded yet
    async fn bookings_due_reminder(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
        limit: usize,
    ) -> CoreResult<Vec<Booking>>;

    /// Conditional update on `reminder_sent_at IS NULL`
    async fn mark_reminded(&self, id: BookingId, at: DateTime<Utc>) -> CoreResult<bool>;
}

/// Wallet ledger and withdrawal persistence
#[async_trait]
pub trait WalletStore: Send + Sync {
    async fn get_wallet(&self, expert_id: UserId) -> CoreResult<Option<WalletAccount>>;

    /// Append one ledger entry (and move the balance when `settle_now`).
    ///
    /// Fails with `DuplicateCredit` on a repeated (expert, reference, type)
    /// and with `InsufficientBalance` if the balance would go negative.
    async fn append_entry(
        &self,
        entry: &LedgerEntry,
        at: DateTime<Utc>,
    ) -> CoreResult<WalletTransaction>;

    /// Settle pending entries created at or before `cutoff`
    async fn settle_due(
        &self,
        cutoff: DateTime<Utc>,
        at: DateTime<Utc>,
        limit: usize,
    ) -> CoreResult<Vec<WalletTransaction>>;

    /// Newest first
    async fn list_transactions(
        &self,
        expert_id: UserId,
        limit: usize,
    ) -> CoreResult<Vec<WalletTransaction>>;

    /// Insert a PENDING request only if the current balance covers it,
    /// otherwise `InsufficientBalance`.
    async fn insert_withdrawal_if_funded(&self, request: &WithdrawalRequest) -> CoreResult<()>;

    async fn get_withdrawal(&self, id: WithdrawalId) -> CoreResult<Option<WithdrawalRequest>>;

    /// PENDING → APPROVED, debit ledger entry and balance decrement in one
    /// transaction, with the balance re-validated under lock.
    ///
    /// Errors: `NotFound`, `InvalidState` (not pending), `InsufficientBalance`.
    async fn approve_withdrawal(
        &self,
        id: WithdrawalId,
        admin_id: UserId,
        at: DateTime<Utc>,
    ) -> CoreResult<(WithdrawalRequest, WalletTransaction)>;

    /// CAS PENDING → REJECTED. Returns false if not pending.
    async fn reject_withdrawal(
        &self,
        id: WithdrawalId,
        admin_id: UserId,
        reason: &str,
        at: DateTime<Utc>,
    ) -> CoreResult<bool>;

    /// CAS APPROVED → PAID. Returns false if not approved.
    async fn mark_withdrawal_paid(
        &self,
        id: WithdrawalId,
        payout_reference: &str,
        at: DateTime<Utc>,
    ) -> CoreResult<bool>;

    /// Newest first
    async fn list_withdrawals(&self, expert_id: UserId) -> CoreResult<Vec<WithdrawalRequest>>;

    /// Oldest first
    async fn pending_withdrawals(&self, limit: usize) -> CoreResult<Vec<WithdrawalRequest>>;
}

/// Ranking signals and the materialized score view
#[async_trait]
pub trait RankingStore: Send + Sync {
    async fn ranking_signals(&self, expert_id: UserId) -> CoreResult<RankingSignals>;

    /// Upsert the materialized score
    async fn save_ranking(&self, score: &RankingScore) -> CoreResult<()>;

    async fn get_ranking(&self, expert_id: UserId) -> CoreResult<Option<RankingScore>>;

    /// Every expert with at least one booking
    async fn ranked_expert_ids(&self) -> CoreResult<Vec<UserId>>;
}
