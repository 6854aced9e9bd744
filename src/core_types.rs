//! Core types used throughout the system
//!
//! Identifier aliases shared by every module. All entity ids are UUID v4,
//! matching the UUID primary keys of the persistence schema.

use uuid::Uuid;

/// User ID - client, expert or admin account issued by the auth provider.
pub type UserId = Uuid;

/// Booking ID - one consultation engagement
pub type BookingId = Uuid;

/// Review ID
pub type ReviewId = Uuid;

/// Wallet transaction ID (ledger row)
pub type TransactionId = Uuid;

/// Withdrawal request ID
pub type WithdrawalId = Uuid;

/// Notification ID
pub type NotificationId = Uuid;

/// Generate a fresh entity identifier
#[inline]
pub fn new_id() -> Uuid {
    Uuid::new_v4()
}
