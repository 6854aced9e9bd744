//! HTTP handlers, one module per resource

pub mod admin;
pub mod bookings;
pub mod health;
pub mod ranking;
pub mod wallet;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use uuid::Uuid;

    use crate::auth::{Actor, TokenVerifier};
    use crate::booking::BookingService;
    use crate::config::{RankingConfig, WalletConfig};
    use crate::gateway::state::AppState;
    use crate::notification::{NotificationDispatcher, notification_channel};
    use crate::ranking::RankingEngine;
    use crate::store::MemoryStore;
    use crate::wallet::{LedgerService, WithdrawalService};

    pub const TEST_SECRET: &str = "test-secret";

    /// Gateway state over a fresh in-memory store
    pub struct TestApp {
        pub state: Arc<AppState>,
        pub store: Arc<MemoryStore>,
        pub client: Actor,
        pub expert: Actor,
        pub admin: Actor,
        pub dispatcher: NotificationDispatcher,
    }

    impl TestApp {
        pub fn new() -> Self {
            let store = Arc::new(MemoryStore::default());
            let (notifier, dispatcher) = notification_channel(64);
            let ledger = Arc::new(LedgerService::new(store.clone(), WalletConfig::default()));
            let ranking = RankingEngine::new(store.clone(), RankingConfig::default());
            let bookings = Arc::new(BookingService::new(
                store.clone(),
                ledger.clone(),
                ranking.clone(),
                notifier.clone(),
            ));
            let withdrawals = Arc::new(WithdrawalService::new(store.clone(), notifier));
            let state = Arc::new(AppState::new(
                bookings,
                ledger,
                withdrawals,
                ranking,
                Arc::new(TokenVerifier::new(TEST_SECRET)),
                None,
            ));

            Self {
                state,
                store,
                client: Actor::client(Uuid::new_v4()),
                expert: Actor::expert(Uuid::new_v4()),
                admin: Actor::admin(Uuid::new_v4()),
                dispatcher,
            }
        }
    }
}
