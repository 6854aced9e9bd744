//! Expert Wallet
//!
//! Append-only ledger plus the withdrawal approval workflow.
//!
//! # Invariants
//!
//! 1. The balance equals the sum of completed ledger rows and is never negative
//! 2. At most one row per (expert_id, reference, tx_type)
//! 3. Funds leave the wallet only when an admin approves a withdrawal
//!    (or through an explicit admin adjustment)

pub mod ledger;
pub mod types;
pub mod withdrawal;

pub use ledger::LedgerService;
pub use types::{
    LedgerEntry, TransactionStatus, TransactionType, WalletAccount, WalletTransaction,
    WithdrawalRequest, WithdrawalStatus,
};
pub use withdrawal::WithdrawalService;
