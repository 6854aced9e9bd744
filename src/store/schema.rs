//! PostgreSQL schema
//!
//! Statuses and ledger types are stored as SMALLINT ids (see the `id()` /
//! `from_id()` pairs on the enums). Uniqueness constraints here back the
//! idempotency guarantees of the services.

use anyhow::Result;
use sqlx::PgPool;

/// Create all tables and indexes if they do not exist yet
pub async fn init_schema(pool: &PgPool) -> Result<()> {
    tracing::info!("Initializing PostgreSQL schema...");

    for (name, ddl) in TABLES {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create {}: {}", name, e))?;
    }

    tracing::info!("PostgreSQL schema initialized successfully");
    Ok(())
}

const TABLES: &[(&str, &str)] = &[
    ("bookings", CREATE_BOOKINGS_TABLE),
    ("bookings index", CREATE_BOOKINGS_EXPERT_INDEX),
    ("bookings reminder index", CREATE_BOOKINGS_START_INDEX),
    ("reviews", CREATE_REVIEWS_TABLE),
    ("wallet_accounts", CREATE_WALLET_ACCOUNTS_TABLE),
    ("wallet_transactions", CREATE_WALLET_TRANSACTIONS_TABLE),
    ("wallet_transactions index", CREATE_WALLET_TRANSACTIONS_INDEX),
    ("withdrawal_requests", CREATE_WITHDRAWAL_REQUESTS_TABLE),
    ("ranking_scores", CREATE_RANKING_SCORES_TABLE),
    ("notifications", CREATE_NOTIFICATIONS_TABLE),
];

const CREATE_BOOKINGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS bookings (
    id                  UUID PRIMARY KEY,
    client_id           UUID NOT NULL,
    expert_id           UUID NOT NULL,
    scheduled_start     TIMESTAMPTZ NOT NULL,
    scheduled_end       TIMESTAMPTZ NOT NULL,
    status              SMALLINT NOT NULL,      -- 0=pending 10=confirmed 20=in_progress 40=completed -10=canceled
    price               NUMERIC(20, 8),
    currency            VARCHAR(8) NOT NULL,
    cancellation_reason TEXT,
    canceled_by         UUID,
    confirmed_at        TIMESTAMPTZ,
    started_at          TIMESTAMPTZ,
    completed_at        TIMESTAMPTZ,
    reminder_sent_at    TIMESTAMPTZ,
    created_at          TIMESTAMPTZ NOT NULL,
    updated_at          TIMESTAMPTZ NOT NULL,
    CHECK (scheduled_end > scheduled_start)
)
"#;

const CREATE_BOOKINGS_EXPERT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_bookings_expert ON bookings (expert_id, status)";

const CREATE_BOOKINGS_START_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_bookings_start ON bookings (status, scheduled_start)";

const CREATE_REVIEWS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS reviews (
    id          UUID PRIMARY KEY,
    booking_id  UUID NOT NULL UNIQUE REFERENCES bookings (id),
    client_id   UUID NOT NULL,
    expert_id   UUID NOT NULL,
    rating      SMALLINT NOT NULL CHECK (rating BETWEEN 1 AND 5),
    comment     TEXT NOT NULL DEFAULT '',
    is_public   BOOLEAN NOT NULL DEFAULT TRUE,
    created_at  TIMESTAMPTZ NOT NULL
)
"#;

const CREATE_WALLET_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS wallet_accounts (
    expert_id   UUID PRIMARY KEY,
    balance     NUMERIC(20, 8) NOT NULL DEFAULT 0 CHECK (balance >= 0),
    currency    VARCHAR(8) NOT NULL,
    updated_at  TIMESTAMPTZ NOT NULL
)
"#;

const CREATE_WALLET_TRANSACTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS wallet_transactions (
    id          UUID PRIMARY KEY,
    expert_id   UUID NOT NULL,
    amount      NUMERIC(20, 8) NOT NULL,
    tx_type     SMALLINT NOT NULL,              -- 1=earning 2=withdrawal 3=adjustment 4=fee
    status      SMALLINT NOT NULL,              -- 0=pending 1=completed -1=failed
    reference   VARCHAR(128) NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL,
    settled_at  TIMESTAMPTZ,
    UNIQUE (expert_id, reference, tx_type)
)
"#;

const CREATE_WALLET_TRANSACTIONS_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_wallet_transactions_pending
    ON wallet_transactions (status, created_at)
"#;

const CREATE_WITHDRAWAL_REQUESTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS withdrawal_requests (
    id                  UUID PRIMARY KEY,
    expert_id           UUID NOT NULL,
    amount              NUMERIC(20, 8) NOT NULL CHECK (amount > 0),
    status              SMALLINT NOT NULL,      -- 0=pending 10=approved 20=paid -10=rejected
    requested_at        TIMESTAMPTZ NOT NULL,
    processed_at        TIMESTAMPTZ,
    processed_by        UUID,
    rejection_reason    TEXT,
    payout_reference    VARCHAR(128),
    paid_at             TIMESTAMPTZ
)
"#;

const CREATE_RANKING_SCORES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS ranking_scores (
    expert_id       UUID PRIMARY KEY,
    score           DOUBLE PRECISION NOT NULL,
    factors         JSONB NOT NULL,
    computed_at     TIMESTAMPTZ NOT NULL
)
"#;

const CREATE_NOTIFICATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS notifications (
    id          UUID PRIMARY KEY,
    user_id     UUID NOT NULL,
    event_type  VARCHAR(32) NOT NULL,
    payload     JSONB NOT NULL,
    link        TEXT,
    is_read     BOOLEAN NOT NULL DEFAULT FALSE,
    created_at  TIMESTAMPTZ NOT NULL
)
"#;
