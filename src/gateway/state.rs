use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::booking::BookingService;
use crate::ranking::RankingEngine;
use crate::store::PgStore;
use crate::wallet::{LedgerService, WithdrawalService};

/// Gateway application state (shared)
#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<BookingService>,
    pub ledger: Arc<LedgerService>,
    pub withdrawals: Arc<WithdrawalService>,
    pub ranking: RankingEngine,
    /// Bearer token verification
    pub verifier: Arc<TokenVerifier>,
    /// PostgreSQL store, pinged by the health check; `None` in memory mode
    pub pg_store: Option<Arc<PgStore>>,
}

impl AppState {
    pub fn new(
        bookings: Arc<BookingService>,
        ledger: Arc<LedgerService>,
        withdrawals: Arc<WithdrawalService>,
        ranking: RankingEngine,
        verifier: Arc<TokenVerifier>,
        pg_store: Option<Arc<PgStore>>,
    ) -> Self {
        Self {
            bookings,
            ledger,
            withdrawals,
            ranking,
            verifier,
            pg_store,
        }
    }
}
