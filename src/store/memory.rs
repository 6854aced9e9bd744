//! In-memory store
//!
//! All state sits behind one async mutex, so every trait method is a single
//! critical section: validate first, then mutate. That gives the same
//! all-or-nothing behaviour as the PostgreSQL transactions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use super::{BookingStore, RankingStore, WalletStore};
use crate::booking::{Booking, BookingStatus, Review, Transition};
use crate::core_types::{BookingId, UserId, WithdrawalId};
use crate::error::{CoreError, CoreResult};
use crate::notification::{Notification, NotificationSink};
use crate::ranking::{RankingScore, RankingSignals};
use crate::wallet::{
    LedgerEntry, TransactionStatus, WalletAccount, WalletTransaction, WithdrawalRequest,
    WithdrawalStatus,
};

#[derive(Default)]
struct MemoryState {
    bookings: HashMap<BookingId, Booking>,
    reviews: HashMap<BookingId, Review>,
    wallets: HashMap<UserId, WalletAccount>,
    transactions: Vec<WalletTransaction>,
    withdrawals: HashMap<WithdrawalId, WithdrawalRequest>,
    rankings: HashMap<UserId, RankingScore>,
    inbox: Vec<Notification>,
}

impl MemoryState {
    fn balance(&self, expert_id: UserId) -> Decimal {
        self.wallets
            .get(&expert_id)
            .map(|w| w.balance)
            .unwrap_or(Decimal::ZERO)
    }

    fn has_entry(&self, entry: &LedgerEntry) -> bool {
        self.transactions.iter().any(|t| {
            t.expert_id == entry.expert_id
                && t.tx_type == entry.tx_type
                && t.reference == entry.reference
        })
    }

    /// Check a batch of entries without touching state.
    ///
    /// Returns the entries that would be written (duplicates dropped when
    /// `skip_duplicates`), or the error the batch would fail with.
    fn plan<'a>(
        &self,
        entries: &'a [LedgerEntry],
        skip_duplicates: bool,
    ) -> CoreResult<Vec<&'a LedgerEntry>> {
        let mut planned: Vec<&LedgerEntry> = Vec::with_capacity(entries.len());
        let mut projected: HashMap<UserId, Decimal> = HashMap::new();

        for entry in entries {
            let repeated = planned.iter().any(|p| {
                p.expert_id == entry.expert_id
                    && p.tx_type == entry.tx_type
                    && p.reference == entry.reference
            });
            if repeated || self.has_entry(entry) {
                if skip_duplicates {
                    continue;
                }
                return Err(CoreError::DuplicateCredit);
            }

            if entry.settle_now {
                let balance = projected
                    .entry(entry.expert_id)
                    .or_insert_with(|| self.balance(entry.expert_id));
                *balance += entry.amount;
                if *balance < Decimal::ZERO {
                    return Err(CoreError::InsufficientBalance);
                }
            }
            planned.push(entry);
        }

        Ok(planned)
    }

    fn wallet_mut(
        &mut self,
        expert_id: UserId,
        currency: &str,
        now: DateTime<Utc>,
    ) -> &mut WalletAccount {
        self.wallets
            .entry(expert_id)
            .or_insert_with(|| WalletAccount::empty(expert_id, currency, now))
    }

    /// Write already validated entries
    fn write(
        &mut self,
        entries: &[&LedgerEntry],
        currency: &str,
        now: DateTime<Utc>,
    ) -> Vec<WalletTransaction> {
        let mut written = Vec::with_capacity(entries.len());
        for entry in entries {
            let tx = entry.to_transaction(now);
            let wallet = self.wallet_mut(entry.expert_id, currency, now);
            if entry.settle_now {
                wallet.balance += entry.amount;
                wallet.updated_at = now;
            }
            self.transactions.push(tx.clone());
            written.push(tx);
        }
        written
    }
}

/// Single-process store for development and tests
pub struct MemoryStore {
    currency: String,
    state: Mutex<MemoryState>,
    fail_ledger_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            state: Mutex::new(MemoryState::default()),
            fail_ledger_writes: AtomicBool::new(false),
        }
    }

    /// Make every write that touches the ledger fail with a database error
    pub fn set_fail_ledger_writes(&self, fail: bool) {
        self.fail_ledger_writes.store(fail, Ordering::SeqCst);
    }

    fn check_ledger_writable(&self) -> CoreResult<()> {
        if self.fail_ledger_writes.load(Ordering::SeqCst) {
            return Err(CoreError::Database("ledger write failed".to_string()));
        }
        Ok(())
    }

    /// In-app inbox of one user, newest first
    pub async fn inbox(&self, user_id: UserId) -> Vec<Notification> {
        let state = self.state.lock().await;
        let mut items: Vec<Notification> = state
            .inbox
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        items.reverse();
        items
    }

    /// Every ledger row of an expert, oldest first
    pub async fn all_transactions(&self, expert_id: UserId) -> Vec<WalletTransaction> {
        let state = self.state.lock().await;
        state
            .transactions
            .iter()
            .filter(|t| t.expert_id == expert_id)
            .cloned()
            .collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("USD")
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn insert_booking(&self, booking: &Booking) -> CoreResult<()> {
        let mut state = self.state.lock().await;
        if state.bookings.contains_key(&booking.id) {
            return Err(CoreError::InvalidState(format!(
                "Booking {} already exists",
                booking.id
            )));
        }
        state.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get_booking(&self, id: BookingId) -> CoreResult<Option<Booking>> {
        Ok(self.state.lock().await.bookings.get(&id).cloned())
    }

    async fn transition_booking(
        &self,
        id: BookingId,
        transition: &Transition,
    ) -> CoreResult<bool> {
        let mut state = self.state.lock().await;
        match state.bookings.get_mut(&id) {
            Some(booking) if booking.status == transition.from => {
                booking.apply(transition);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn complete_booking(
        &self,
        id: BookingId,
        transition: &Transition,
        entries: &[LedgerEntry],
    ) -> CoreResult<Option<Vec<WalletTransaction>>> {
        let mut state = self.state.lock().await;

        match state.bookings.get(&id) {
            Some(booking) if booking.status == transition.from => {}
            _ => return Ok(None),
        }
        if !entries.is_empty() {
            self.check_ledger_writable()?;
        }
        let planned = state.plan(entries, true)?;

        if let Some(booking) = state.bookings.get_mut(&id) {
            booking.apply(transition);
        }
        Ok(Some(state.write(&planned, &self.currency, transition.at)))
    }

    async fn insert_review(&self, review: &Review) -> CoreResult<()> {
        let mut state = self.state.lock().await;
        if state.reviews.contains_key(&review.booking_id) {
            return Err(CoreError::DuplicateReview);
        }
        state.reviews.insert(review.booking_id, review.clone());
        Ok(())
    }

    async fn review_for_booking(&self, booking_id: BookingId) -> CoreResult<Option<Review>> {
        Ok(self.state.lock().await.reviews.get(&booking_id).cloned())
    }

    async fn bookings_due_reminder(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
        limit: usize,
    ) -> CoreResult<Vec<Booking>> {
        let state = self.state.lock().await;
        let mut due: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| {
                b.status == BookingStatus::Confirmed
                    && b.reminder_sent_at.is_none()
                    && b.scheduled_start >= from
                    && b.scheduled_start < until
            })
            .cloned()
            .collect();
        due.sort_by_key(|b| b.scheduled_start);
        due.truncate(limit);
        Ok(due)
    }

    async fn mark_reminded(&self, id: BookingId, at: DateTime<Utc>) -> CoreResult<bool> {
        let mut state = self.state.lock().await;
        match state.bookings.get_mut(&id) {
            Some(booking) if booking.reminder_sent_at.is_none() => {
                booking.reminder_sent_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl WalletStore for MemoryStore {
    async fn get_wallet(&self, expert_id: UserId) -> CoreResult<Option<WalletAccount>> {
        Ok(self.state.lock().await.wallets.get(&expert_id).cloned())
    }

    async fn append_entry(
        &self,
        entry: &LedgerEntry,
        at: DateTime<Utc>,
    ) -> CoreResult<WalletTransaction> {
        let mut state = self.state.lock().await;
        self.check_ledger_writable()?;
        let entries = std::slice::from_ref(entry);
        let planned = state.plan(entries, false)?;
        state
            .write(&planned, &self.currency, at)
            .pop()
            .ok_or_else(|| CoreError::System("ledger entry not written".to_string()))
    }

    async fn settle_due(
        &self,
        cutoff: DateTime<Utc>,
        at: DateTime<Utc>,
        limit: usize,
    ) -> CoreResult<Vec<WalletTransaction>> {
        let mut state = self.state.lock().await;
        self.check_ledger_writable()?;

        let mut due: Vec<usize> = state
            .transactions
            .iter()
            .enumerate()
            .filter(|(_, t)| t.status == TransactionStatus::Pending && t.created_at <= cutoff)
            .map(|(i, _)| i)
            .collect();
        // Credits before debits of the same instant
        due.sort_by(|a, b| {
            let (ta, tb) = (&state.transactions[*a], &state.transactions[*b]);
            ta.created_at
                .cmp(&tb.created_at)
                .then(tb.amount.cmp(&ta.amount))
        });
        due.truncate(limit);

        let mut settled = Vec::with_capacity(due.len());
        for idx in due {
            let (expert_id, amount) = {
                let t = &state.transactions[idx];
                (t.expert_id, t.amount)
            };
            if state.balance(expert_id) + amount < Decimal::ZERO {
                tracing::warn!(
                    tx_id = %state.transactions[idx].id,
                    expert_id = %expert_id,
                    "Pending entry would overdraw wallet, leaving it pending"
                );
                continue;
            }
            let currency = self.currency.clone();
            let wallet = state.wallet_mut(expert_id, &currency, at);
            wallet.balance += amount;
            wallet.updated_at = at;

            let tx = &mut state.transactions[idx];
            tx.status = TransactionStatus::Completed;
            tx.settled_at = Some(at);
            settled.push(tx.clone());
        }
        Ok(settled)
    }

    async fn list_transactions(
        &self,
        expert_id: UserId,
        limit: usize,
    ) -> CoreResult<Vec<WalletTransaction>> {
        let state = self.state.lock().await;
        Ok(state
            .transactions
            .iter()
            .rev()
            .filter(|t| t.expert_id == expert_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn insert_withdrawal_if_funded(&self, request: &WithdrawalRequest) -> CoreResult<()> {
        let mut state = self.state.lock().await;
        if state.balance(request.expert_id) < request.amount {
            return Err(CoreError::InsufficientBalance);
        }
        state.withdrawals.insert(request.id, request.clone());
        Ok(())
    }

    async fn get_withdrawal(&self, id: WithdrawalId) -> CoreResult<Option<WithdrawalRequest>> {
        Ok(self.state.lock().await.withdrawals.get(&id).cloned())
    }

    async fn approve_withdrawal(
        &self,
        id: WithdrawalId,
        admin_id: UserId,
        at: DateTime<Utc>,
    ) -> CoreResult<(WithdrawalRequest, WalletTransaction)> {
        let mut state = self.state.lock().await;

        let request = state
            .withdrawals
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::withdrawal_not_found(id))?;
        if request.status != WithdrawalStatus::Pending {
            return Err(CoreError::InvalidState(format!(
                "Withdrawal request is {}",
                request.status
            )));
        }
        self.check_ledger_writable()?;

        let debit = request.debit_entry();
        let entries = std::slice::from_ref(&debit);
        let planned = state.plan(entries, false)?;
        let tx = state
            .write(&planned, &self.currency, at)
            .pop()
            .ok_or_else(|| CoreError::System("withdrawal debit not written".to_string()))?;

        let stored = state
            .withdrawals
            .get_mut(&id)
            .ok_or_else(|| CoreError::withdrawal_not_found(id))?;
        stored.status = WithdrawalStatus::Approved;
        stored.processed_at = Some(at);
        stored.processed_by = Some(admin_id);
        Ok((stored.clone(), tx))
    }

    async fn reject_withdrawal(
        &self,
        id: WithdrawalId,
        admin_id: UserId,
        reason: &str,
        at: DateTime<Utc>,
    ) -> CoreResult<bool> {
        let mut state = self.state.lock().await;
        match state.withdrawals.get_mut(&id) {
            Some(request) if request.status == WithdrawalStatus::Pending => {
                request.status = WithdrawalStatus::Rejected;
                request.processed_at = Some(at);
                request.processed_by = Some(admin_id);
                request.rejection_reason = Some(reason.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_withdrawal_paid(
        &self,
        id: WithdrawalId,
        payout_reference: &str,
        at: DateTime<Utc>,
    ) -> CoreResult<bool> {
        let mut state = self.state.lock().await;
        match state.withdrawals.get_mut(&id) {
            Some(request) if request.status == WithdrawalStatus::Approved => {
                request.status = WithdrawalStatus::Paid;
                request.payout_reference = Some(payout_reference.to_string());
                request.paid_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_withdrawals(&self, expert_id: UserId) -> CoreResult<Vec<WithdrawalRequest>> {
        let state = self.state.lock().await;
        let mut items: Vec<WithdrawalRequest> = state
            .withdrawals
            .values()
            .filter(|w| w.expert_id == expert_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        Ok(items)
    }

    async fn pending_withdrawals(&self, limit: usize) -> CoreResult<Vec<WithdrawalRequest>> {
        let state = self.state.lock().await;
        let mut items: Vec<WithdrawalRequest> = state
            .withdrawals
            .values()
            .filter(|w| w.status == WithdrawalStatus::Pending)
            .cloned()
            .collect();
        items.sort_by_key(|w| w.requested_at);
        items.truncate(limit);
        Ok(items)
    }
}

#[async_trait]
impl RankingStore for MemoryStore {
    async fn ranking_signals(&self, expert_id: UserId) -> CoreResult<RankingSignals> {
        let state = self.state.lock().await;
        let mut signals = RankingSignals::default();

        for review in state.reviews.values().filter(|r| r.expert_id == expert_id) {
            signals.review_count += 1;
            signals.rating_sum += i64::from(review.rating);
        }
        for booking in state.bookings.values().filter(|b| b.expert_id == expert_id) {
            match booking.status {
                BookingStatus::Completed => signals.completed_count += 1,
                BookingStatus::Canceled => signals.canceled_count += 1,
                _ => {}
            }
            if let Some(secs) = booking.response_time_secs() {
                signals.response_times_secs.push(secs);
            }
        }
        signals.response_times_secs.sort_unstable();
        Ok(signals)
    }

    async fn save_ranking(&self, score: &RankingScore) -> CoreResult<()> {
        let mut state = self.state.lock().await;
        state.rankings.insert(score.expert_id, score.clone());
        Ok(())
    }

    async fn get_ranking(&self, expert_id: UserId) -> CoreResult<Option<RankingScore>> {
        Ok(self.state.lock().await.rankings.get(&expert_id).cloned())
    }

    async fn ranked_expert_ids(&self) -> CoreResult<Vec<UserId>> {
        let state = self.state.lock().await;
        let ids: BTreeSet<UserId> = state.bookings.values().map(|b| b.expert_id).collect();
        Ok(ids.into_iter().collect())
    }
}

/// In-app inbox
#[async_trait]
impl NotificationSink for MemoryStore {
    fn name(&self) -> &'static str {
        "memory_inbox"
    }

    async fn deliver(&self, notification: &Notification) -> anyhow::Result<()> {
        self.state.lock().await.inbox.push(notification.clone());
        Ok(())
    }
}
