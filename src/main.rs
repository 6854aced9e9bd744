//! Cunslt Core service
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────┐    ┌──────────────┐
//! │ Gateway  │───▶│ Services │───▶│  Store   │    │ Notification │
//! │  (axum)  │    │ (core)   │───────────────────▶│  dispatcher  │
//! └──────────┘    └──────────┘    └──────────┘    └──────────────┘
//!                       ▲
//!                 ┌──────────┐
//!                 │  Worker  │ settlement / reminders / ranking
//!                 └──────────┘
//! ```
//!
//! Usage: `cunslt [--env dev] [--port 8080]`

use std::sync::Arc;

use cunslt::auth::TokenVerifier;
use cunslt::config::AppConfig;
use cunslt::gateway::{self, state::AppState};
use cunslt::notification::{FanoutSink, LogSink, NotificationSink, notification_channel};
use cunslt::store::{BookingStore, MemoryStore, PgStore, RankingStore, WalletStore};
use cunslt::{BookingService, LedgerService, MaintenanceWorker, RankingEngine, WithdrawalService};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

/// Wire services over one store and start the background tasks
fn start<S>(store: Arc<S>, pg_store: Option<Arc<PgStore>>, config: &AppConfig) -> Arc<AppState>
where
    S: BookingStore + WalletStore + RankingStore + NotificationSink + 'static,
{
    let (notifier, dispatcher) = notification_channel(config.notifications.queue_size);
    let sink = FanoutSink::new(vec![
        store.clone() as Arc<dyn NotificationSink>,
        Arc::new(LogSink),
    ]);
    tokio::spawn(async move {
        let delivered = dispatcher.run(Arc::new(sink)).await;
        tracing::info!(delivered, "Notification dispatcher stopped");
    });

    let ranking = RankingEngine::new(store.clone(), config.ranking.clone());
    let ledger = Arc::new(LedgerService::new(store.clone(), config.wallet.clone()));
    let bookings = Arc::new(BookingService::new(
        store.clone(),
        ledger.clone(),
        ranking.clone(),
        notifier.clone(),
    ));
    let withdrawals = Arc::new(WithdrawalService::new(store, notifier));

    let worker = MaintenanceWorker::new(
        bookings.clone(),
        ledger.clone(),
        ranking.clone(),
        config.worker.clone(),
        &config.booking,
    );
    tokio::spawn(async move {
        worker.run().await;
    });

    Arc::new(AppState::new(
        bookings,
        ledger,
        withdrawals,
        ranking,
        Arc::new(TokenVerifier::new(&config.auth.jwt_secret)),
        pg_store,
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env)?;
    let _log_guard = cunslt::logging::init_logging(&app_config);

    tracing::info!(env = %env, "Starting Cunslt core");

    let state = match app_config.postgres_url.as_deref() {
        Some(url) => {
            let store = Arc::new(PgStore::connect(url, &app_config.wallet.currency).await?);
            store.init_schema().await?;
            tracing::info!("PostgreSQL store ready");
            start(store.clone(), Some(store), &app_config)
        }
        None => {
            tracing::warn!("No postgres_url configured, using in-memory store");
            let store = Arc::new(MemoryStore::new(app_config.wallet.currency.clone()));
            start(store, None, &app_config)
        }
    };

    let port = get_port_override().unwrap_or(app_config.gateway.port);
    gateway::run_server(&app_config.gateway.host, port, state).await
}
