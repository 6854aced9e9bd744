//! PostgreSQL store
//!
//! Every status change is a conditional `UPDATE ... WHERE status = $expected`.
//! Composite effects run inside one `sqlx` transaction; returning early with
//! an error drops the transaction, which rolls it back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::time::Duration;

use super::{BookingStore, RankingStore, WalletStore, schema};
use crate::booking::{Booking, BookingStatus, Review, Transition};
use crate::core_types::{BookingId, UserId, WithdrawalId};
use crate::error::{CoreError, CoreResult};
use crate::notification::{Notification, NotificationSink};
use crate::ranking::{RankingFactors, RankingScore, RankingSignals};
use crate::wallet::{
    LedgerEntry, TransactionStatus, TransactionType, WalletAccount, WalletTransaction,
    WithdrawalRequest, WithdrawalStatus,
};

const BOOKING_COLUMNS: &str = r#"
    id, client_id, expert_id, scheduled_start, scheduled_end, status, price, currency,
    cancellation_reason, canceled_by, confirmed_at, started_at, completed_at,
    reminder_sent_at, created_at, updated_at
"#;

const TRANSACTION_COLUMNS: &str =
    "id, expert_id, amount, tx_type, status, reference, created_at, settled_at";

const WITHDRAWAL_COLUMNS: &str = r#"
    id, expert_id, amount, status, requested_at, processed_at, processed_by,
    rejection_reason, payout_reference, paid_at
"#;

/// PostgreSQL-backed implementation of every store trait
pub struct PgStore {
    pool: PgPool,
    currency: String,
}

impl PgStore {
    /// Connect a pool. `currency` is used for lazily created wallets.
    pub async fn connect(database_url: &str, currency: impl Into<String>) -> CoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        tracing::info!("PostgreSQL connection pool established");
        Ok(Self::new(pool, currency))
    }

    pub fn new(pool: PgPool, currency: impl Into<String>) -> Self {
        Self {
            pool,
            currency: currency.into(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_check(&self) -> CoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn init_schema(&self) -> anyhow::Result<()> {
        schema::init_schema(&self.pool).await
    }

    /// Insert one ledger row and apply it to the wallet when settled.
    ///
    /// Returns `None` if the (expert, reference, type) row already exists.
    /// A settled debit that would take the balance below zero fails with
    /// `InsufficientBalance`; the caller's transaction must then be dropped.
    async fn insert_entry(
        &self,
        conn: &mut PgConnection,
        entry: &LedgerEntry,
        at: DateTime<Utc>,
    ) -> CoreResult<Option<WalletTransaction>> {
        let tx = entry.to_transaction(at);

        let inserted = sqlx::query(
            r#"
            INSERT INTO wallet_transactions
                (id, expert_id, amount, tx_type, status, reference, created_at, settled_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (expert_id, reference, tx_type) DO NOTHING
            "#,
        )
        .bind(tx.id)
        .bind(tx.expert_id)
        .bind(tx.amount)
        .bind(tx.tx_type.id())
        .bind(tx.status.id())
        .bind(&tx.reference)
        .bind(tx.created_at)
        .bind(tx.settled_at)
        .execute(&mut *conn)
        .await?;

        if inserted.rows_affected() == 0 {
            return Ok(None);
        }

        sqlx::query(
            r#"
            INSERT INTO wallet_accounts (expert_id, balance, currency, updated_at)
            VALUES ($1, 0, $2, $3)
            ON CONFLICT (expert_id) DO NOTHING
            "#,
        )
        .bind(entry.expert_id)
        .bind(&self.currency)
        .bind(at)
        .execute(&mut *conn)
        .await?;

        if entry.settle_now && !apply_to_balance(conn, entry.expert_id, entry.amount, at).await? {
            return Err(CoreError::InsufficientBalance);
        }

        Ok(Some(tx))
    }
}

/// Conditional balance move; false if it would go below zero
async fn apply_to_balance(
    conn: &mut PgConnection,
    expert_id: UserId,
    amount: Decimal,
    at: DateTime<Utc>,
) -> CoreResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE wallet_accounts
        SET balance = balance + $1, updated_at = $2
        WHERE expert_id = $3 AND balance + $1 >= 0
        "#,
    )
    .bind(amount)
    .bind(at)
    .bind(expert_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

#[async_trait]
impl BookingStore for PgStore {
    async fn insert_booking(&self, booking: &Booking) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings
                (id, client_id, expert_id, scheduled_start, scheduled_end, status, price,
                 currency, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(booking.id)
        .bind(booking.client_id)
        .bind(booking.expert_id)
        .bind(booking.scheduled_start)
        .bind(booking.scheduled_end)
        .bind(booking.status.id())
        .bind(booking.price)
        .bind(&booking.currency)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_booking(&self, id: BookingId) -> CoreResult<Option<Booking>> {
        let sql = format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_booking).transpose()
    }

    async fn transition_booking(
        &self,
        id: BookingId,
        transition: &Transition,
    ) -> CoreResult<bool> {
        let result = update_booking_status(&self.pool, id, transition).await?;
        Ok(result)
    }

    async fn complete_booking(
        &self,
        id: BookingId,
        transition: &Transition,
        entries: &[LedgerEntry],
    ) -> CoreResult<Option<Vec<WalletTransaction>>> {
        let mut tx = self.pool.begin().await?;

        if !update_booking_status(&mut *tx, id, transition).await? {
            return Ok(None);
        }

        let mut written = Vec::with_capacity(entries.len());
        for entry in entries {
            match self.insert_entry(&mut *tx, entry, transition.at).await? {
                Some(row) => written.push(row),
                None => tracing::info!(
                    booking_id = %id,
                    reference = %entry.reference,
                    tx_type = %entry.tx_type,
                    "Ledger entry already recorded, skipping"
                ),
            }
        }

        tx.commit().await?;
        Ok(Some(written))
    }

    async fn insert_review(&self, review: &Review) -> CoreResult<()> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO reviews
                (id, booking_id, client_id, expert_id, rating, comment, is_public, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (booking_id) DO NOTHING
            "#,
        )
        .bind(review.id)
        .bind(review.booking_id)
        .bind(review.client_id)
        .bind(review.expert_id)
        .bind(review.rating)
        .bind(&review.comment)
        .bind(review.is_public)
        .bind(review.created_at)
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(CoreError::DuplicateReview);
        }
        Ok(())
    }

    async fn review_for_booking(&self, booking_id: BookingId) -> CoreResult<Option<Review>> {
        let row = sqlx::query(
            r#"
            SELECT id, booking_id, client_id, expert_id, rating, comment, is_public, created_at
            FROM reviews
            WHERE booking_id = $1
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> CoreResult<_> {
            Ok(Review {
                id: row.try_get("id")?,
                booking_id: row.try_get("booking_id")?,
                client_id: row.try_get("client_id")?,
                expert_id: row.try_get("expert_id")?,
                rating: row.try_get("rating")?,
                comment: row.try_get("comment")?,
                is_public: row.try_get("is_public")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .transpose()
    }

    async fn bookings_due_reminder(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
        limit: usize,
    ) -> CoreResult<Vec<Booking>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM bookings
            WHERE status = $1
              AND reminder_sent_at IS NULL
              AND scheduled_start >= $2
              AND scheduled_start < $3
            ORDER BY scheduled_start ASC
            LIMIT $4
            "#,
            BOOKING_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(BookingStatus::Confirmed.id())
            .bind(from)
            .bind(until)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_booking).collect()
    }

    async fn mark_reminded(&self, id: BookingId, at: DateTime<Utc>) -> CoreResult<bool> {
        let result = sqlx::query(
            "UPDATE bookings SET reminder_sent_at = $1 WHERE id = $2 AND reminder_sent_at IS NULL",
        )
        .bind(at)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// CAS on `bookings.status`, stamping the column that belongs to the target
async fn update_booking_status<'e, E>(
    executor: E,
    id: BookingId,
    transition: &Transition,
) -> CoreResult<bool>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    let result = sqlx::query(
        r#"
        UPDATE bookings
        SET status = $1,
            updated_at = $2,
            confirmed_at = CASE WHEN $1 = 10 THEN $2 ELSE confirmed_at END,
            started_at = CASE WHEN $1 = 20 THEN $2 ELSE started_at END,
            completed_at = CASE WHEN $1 = 40 THEN $2 ELSE completed_at END,
            cancellation_reason = CASE WHEN $1 = -10 THEN $5 ELSE cancellation_reason END,
            canceled_by = CASE WHEN $1 = -10 THEN $6 ELSE canceled_by END
        WHERE id = $3 AND status = $4
        "#,
    )
    .bind(transition.to.id())
    .bind(transition.at)
    .bind(id)
    .bind(transition.from.id())
    .bind(transition.reason.as_deref())
    .bind(transition.actor)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

#[async_trait]
impl WalletStore for PgStore {
    async fn get_wallet(&self, expert_id: UserId) -> CoreResult<Option<WalletAccount>> {
        let row = sqlx::query(
            "SELECT expert_id, balance, currency, updated_at FROM wallet_accounts WHERE expert_id = $1",
        )
        .bind(expert_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> CoreResult<_> {
            Ok(WalletAccount {
                expert_id: row.try_get("expert_id")?,
                balance: row.try_get("balance")?,
                currency: row.try_get("currency")?,
                updated_at: row.try_get("updated_at")?,
            })
        })
        .transpose()
    }

    async fn append_entry(
        &self,
        entry: &LedgerEntry,
        at: DateTime<Utc>,
    ) -> CoreResult<WalletTransaction> {
        let mut tx = self.pool.begin().await?;
        let row = self
            .insert_entry(&mut *tx, entry, at)
            .await?
            .ok_or(CoreError::DuplicateCredit)?;
        tx.commit().await?;
        Ok(row)
    }

    async fn settle_due(
        &self,
        cutoff: DateTime<Utc>,
        at: DateTime<Utc>,
        limit: usize,
    ) -> CoreResult<Vec<WalletTransaction>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            SELECT {}
            FROM wallet_transactions
            WHERE status = $1 AND created_at <= $2
            ORDER BY created_at ASC, amount DESC
            LIMIT $3
            FOR UPDATE SKIP LOCKED
            "#,
            TRANSACTION_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(TransactionStatus::Pending.id())
            .bind(cutoff)
            .bind(limit as i64)
            .fetch_all(&mut *tx)
            .await?;
        let due: Vec<WalletTransaction> =
            rows.iter().map(row_to_transaction).collect::<CoreResult<_>>()?;

        let mut settled = Vec::with_capacity(due.len());
        for mut entry in due {
            if !apply_to_balance(&mut *tx, entry.expert_id, entry.amount, at).await? {
                tracing::warn!(
                    tx_id = %entry.id,
                    expert_id = %entry.expert_id,
                    "Pending entry would overdraw wallet, leaving it pending"
                );
                continue;
            }
            sqlx::query("UPDATE wallet_transactions SET status = $1, settled_at = $2 WHERE id = $3")
                .bind(TransactionStatus::Completed.id())
                .bind(at)
                .bind(entry.id)
                .execute(&mut *tx)
                .await?;

            entry.status = TransactionStatus::Completed;
            entry.settled_at = Some(at);
            settled.push(entry);
        }

        tx.commit().await?;
        Ok(settled)
    }

    async fn list_transactions(
        &self,
        expert_id: UserId,
        limit: usize,
    ) -> CoreResult<Vec<WalletTransaction>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM wallet_transactions
            WHERE expert_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
            TRANSACTION_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(expert_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_transaction).collect()
    }

    async fn insert_withdrawal_if_funded(&self, request: &WithdrawalRequest) -> CoreResult<()> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO withdrawal_requests (id, expert_id, amount, status, requested_at)
            SELECT $1, $2, $3, $4, $5
            WHERE EXISTS (
                SELECT 1 FROM wallet_accounts WHERE expert_id = $2 AND balance >= $3
            )
            "#,
        )
        .bind(request.id)
        .bind(request.expert_id)
        .bind(request.amount)
        .bind(request.status.id())
        .bind(request.requested_at)
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(CoreError::InsufficientBalance);
        }
        Ok(())
    }

    async fn get_withdrawal(&self, id: WithdrawalId) -> CoreResult<Option<WithdrawalRequest>> {
        let sql = format!(
            "SELECT {} FROM withdrawal_requests WHERE id = $1",
            WITHDRAWAL_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_withdrawal).transpose()
    }

    async fn approve_withdrawal(
        &self,
        id: WithdrawalId,
        admin_id: UserId,
        at: DateTime<Utc>,
    ) -> CoreResult<(WithdrawalRequest, WalletTransaction)> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {} FROM withdrawal_requests WHERE id = $1 FOR UPDATE",
            WITHDRAWAL_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::withdrawal_not_found(id))?;
        let mut request = row_to_withdrawal(&row)?;

        if request.status != WithdrawalStatus::Pending {
            return Err(CoreError::InvalidState(format!(
                "Withdrawal request is {}",
                request.status
            )));
        }

        // Lock the wallet so the balance check and the debit see the same row
        sqlx::query("SELECT balance FROM wallet_accounts WHERE expert_id = $1 FOR UPDATE")
            .bind(request.expert_id)
            .fetch_optional(&mut *tx)
            .await?;

        let debit = self
            .insert_entry(&mut *tx, &request.debit_entry(), at)
            .await?
            .ok_or(CoreError::DuplicateCredit)?;

        sqlx::query(
            r#"
            UPDATE withdrawal_requests
            SET status = $1, processed_at = $2, processed_by = $3
            WHERE id = $4
            "#,
        )
        .bind(WithdrawalStatus::Approved.id())
        .bind(at)
        .bind(admin_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        request.status = WithdrawalStatus::Approved;
        request.processed_at = Some(at);
        request.processed_by = Some(admin_id);
        Ok((request, debit))
    }

    async fn reject_withdrawal(
        &self,
        id: WithdrawalId,
        admin_id: UserId,
        reason: &str,
        at: DateTime<Utc>,
    ) -> CoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE withdrawal_requests
            SET status = $1, processed_at = $2, processed_by = $3, rejection_reason = $4
            WHERE id = $5 AND status = $6
            "#,
        )
        .bind(WithdrawalStatus::Rejected.id())
        .bind(at)
        .bind(admin_id)
        .bind(reason)
        .bind(id)
        .bind(WithdrawalStatus::Pending.id())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_withdrawal_paid(
        &self,
        id: WithdrawalId,
        payout_reference: &str,
        at: DateTime<Utc>,
    ) -> CoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE withdrawal_requests
            SET status = $1, payout_reference = $2, paid_at = $3
            WHERE id = $4 AND status = $5
            "#,
        )
        .bind(WithdrawalStatus::Paid.id())
        .bind(payout_reference)
        .bind(at)
        .bind(id)
        .bind(WithdrawalStatus::Approved.id())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_withdrawals(&self, expert_id: UserId) -> CoreResult<Vec<WithdrawalRequest>> {
        let sql = format!(
            "SELECT {} FROM withdrawal_requests WHERE expert_id = $1 ORDER BY requested_at DESC",
            WITHDRAWAL_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(expert_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_withdrawal).collect()
    }

    async fn pending_withdrawals(&self, limit: usize) -> CoreResult<Vec<WithdrawalRequest>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM withdrawal_requests
            WHERE status = $1
            ORDER BY requested_at ASC
            LIMIT $2
            "#,
            WITHDRAWAL_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(WithdrawalStatus::Pending.id())
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_withdrawal).collect()
    }
}

#[async_trait]
impl RankingStore for PgStore {
    async fn ranking_signals(&self, expert_id: UserId) -> CoreResult<RankingSignals> {
        let reviews = sqlx::query(
            r#"
            SELECT COUNT(*) AS review_count, COALESCE(SUM(rating), 0)::BIGINT AS rating_sum
            FROM reviews
            WHERE expert_id = $1
            "#,
        )
        .bind(expert_id)
        .fetch_one(&self.pool)
        .await?;

        let bookings = sqlx::query(
            r#"
            SELECT COUNT(*) FILTER (WHERE status = $2) AS completed_count,
                   COUNT(*) FILTER (WHERE status = $3) AS canceled_count
            FROM bookings
            WHERE expert_id = $1
            "#,
        )
        .bind(expert_id)
        .bind(BookingStatus::Completed.id())
        .bind(BookingStatus::Canceled.id())
        .fetch_one(&self.pool)
        .await?;

        let response_times: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT GREATEST(EXTRACT(EPOCH FROM (confirmed_at - created_at)), 0)::BIGINT AS secs
            FROM bookings
            WHERE expert_id = $1 AND confirmed_at IS NOT NULL
            ORDER BY secs ASC
            "#,
        )
        .bind(expert_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(RankingSignals {
            review_count: reviews.try_get("review_count")?,
            rating_sum: reviews.try_get("rating_sum")?,
            completed_count: bookings.try_get("completed_count")?,
            canceled_count: bookings.try_get("canceled_count")?,
            response_times_secs: response_times,
        })
    }

    async fn save_ranking(&self, score: &RankingScore) -> CoreResult<()> {
        let factors = serde_json::to_string(&score.factors)
            .map_err(|e| CoreError::System(format!("Failed to encode ranking factors: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO ranking_scores (expert_id, score, factors, computed_at)
            VALUES ($1, $2, $3::jsonb, $4)
            ON CONFLICT (expert_id) DO UPDATE
            SET score = EXCLUDED.score,
                factors = EXCLUDED.factors,
                computed_at = EXCLUDED.computed_at
            "#,
        )
        .bind(score.expert_id)
        .bind(score.score)
        .bind(factors)
        .bind(score.computed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_ranking(&self, expert_id: UserId) -> CoreResult<Option<RankingScore>> {
        let row = sqlx::query(
            r#"
            SELECT expert_id, score, factors::TEXT AS factors, computed_at
            FROM ranking_scores
            WHERE expert_id = $1
            "#,
        )
        .bind(expert_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> CoreResult<_> {
            let factors: String = row.try_get("factors")?;
            let factors: RankingFactors = serde_json::from_str(&factors).map_err(|e| {
                CoreError::System(format!("Invalid ranking factors for {}: {}", expert_id, e))
            })?;
            Ok(RankingScore {
                expert_id: row.try_get("expert_id")?,
                score: row.try_get("score")?,
                factors,
                computed_at: row.try_get("computed_at")?,
            })
        })
        .transpose()
    }

    async fn ranked_expert_ids(&self) -> CoreResult<Vec<UserId>> {
        let ids: Vec<UserId> = sqlx::query_scalar("SELECT DISTINCT expert_id FROM bookings ORDER BY expert_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }
}

/// In-app inbox backed by the `notifications` table
#[async_trait]
impl NotificationSink for PgStore {
    fn name(&self) -> &'static str {
        "postgres_inbox"
    }

    async fn deliver(&self, notification: &Notification) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, event_type, payload, link, created_at)
            VALUES ($1, $2, $3, $4::jsonb, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(notification.event_type.as_str())
        .bind(notification.payload.to_string())
        .bind(notification.link.as_deref())
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn row_to_booking(row: &PgRow) -> CoreResult<Booking> {
    let status_id: i16 = row.try_get("status")?;
    let status = BookingStatus::from_id(status_id)
        .ok_or_else(|| CoreError::System(format!("Invalid booking status ID: {}", status_id)))?;

    Ok(Booking {
        id: row.try_get("id")?,
        client_id: row.try_get("client_id")?,
        expert_id: row.try_get("expert_id")?,
        scheduled_start: row.try_get("scheduled_start")?,
        scheduled_end: row.try_get("scheduled_end")?,
        status,
        price: row.try_get("price")?,
        currency: row.try_get("currency")?,
        cancellation_reason: row.try_get("cancellation_reason")?,
        canceled_by: row.try_get("canceled_by")?,
        confirmed_at: row.try_get("confirmed_at")?,
        started_at: row.try_get("started_at")?,
        completed_at: row.try_get("completed_at")?,
        reminder_sent_at: row.try_get("reminder_sent_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_transaction(row: &PgRow) -> CoreResult<WalletTransaction> {
    let type_id: i16 = row.try_get("tx_type")?;
    let tx_type = TransactionType::from_id(type_id)
        .ok_or_else(|| CoreError::System(format!("Invalid tx_type: {}", type_id)))?;
    let status_id: i16 = row.try_get("status")?;
    let status = TransactionStatus::from_id(status_id)
        .ok_or_else(|| CoreError::System(format!("Invalid transaction status: {}", status_id)))?;

    Ok(WalletTransaction {
        id: row.try_get("id")?,
        expert_id: row.try_get("expert_id")?,
        amount: row.try_get("amount")?,
        tx_type,
        status,
        reference: row.try_get("reference")?,
        created_at: row.try_get("created_at")?,
        settled_at: row.try_get("settled_at")?,
    })
}

fn row_to_withdrawal(row: &PgRow) -> CoreResult<WithdrawalRequest> {
    let status_id: i16 = row.try_get("status")?;
    let status = WithdrawalStatus::from_id(status_id)
        .ok_or_else(|| CoreError::System(format!("Invalid withdrawal status: {}", status_id)))?;

    Ok(WithdrawalRequest {
        id: row.try_get("id")?,
        expert_id: row.try_get("expert_id")?,
        amount: row.try_get("amount")?,
        status,
        requested_at: row.try_get("requested_at")?,
        processed_at: row.try_get("processed_at")?,
        processed_by: row.try_get("processed_by")?,
        rejection_reason: row.try_get("rejection_reason")?,
        payout_reference: row.try_get("payout_reference")?,
        paid_at: row.try_get("paid_at")?,
    })
}
