//! Cunslt Core - consulting marketplace backend
//!
//! Booking lifecycle, expert ranking, wallet ledger with withdrawals, and
//! notification dispatch behind an axum HTTP gateway.
//!
//! # Modules
//!
//! - [`core_types`] - Identifier aliases
//! - [`error`] - Shared error taxonomy
//! - [`auth`] - Actor identity from provider-issued bearer tokens
//! - [`booking`] - Booking state machine and reviews
//! - [`ranking`] - Expert ranking engine
//! - [`wallet`] - Ledger, settlement and withdrawal workflow
//! - [`notification`] - Fire-and-forget notification dispatch
//! - [`store`] - Persistence collaborator (PostgreSQL and in-memory)
//! - [`worker`] - Periodic settlement, reminders and ranking refresh
//! - [`gateway`] - HTTP API

// Core types - must be first!
pub mod core_types;
pub mod error;

// Ambient
pub mod config;
pub mod logging;

// Domain
pub mod auth;
pub mod booking;
pub mod notification;
pub mod ranking;
pub mod store;
pub mod wallet;
pub mod worker;

// HTTP
pub mod gateway;

// Convenient re-exports at crate root
pub use auth::{Actor, Role};
pub use booking::{Booking, BookingService, BookingStatus, NewBooking, Review};
pub use core_types::{BookingId, UserId, WithdrawalId};
pub use error::{CoreError, CoreResult};
pub use notification::{EventType, Notification, NotificationSink, Notifier};
pub use ranking::{RankingEngine, RankingScore};
pub use store::{MemoryStore, PgStore};
pub use wallet::{LedgerService, WalletAccount, WalletTransaction, WithdrawalRequest, WithdrawalService};
pub use worker::MaintenanceWorker;
