//! Wallet & Ledger Types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::core_types::{TransactionId, UserId, WithdrawalId, new_id};

/// Ledger entry kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum TransactionType {
    /// Booking payout credited to the expert
    Earning = 1,
    /// Approved withdrawal (negative)
    Withdrawal = 2,
    /// Admin correction (either sign)
    Adjustment = 3,
    /// Platform fee withheld from an earning (negative)
    Fee = 4,
}

impl TransactionType {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(TransactionType::Earning),
            2 => Some(TransactionType::Withdrawal),
            3 => Some(TransactionType::Adjustment),
            4 => Some(TransactionType::Fee),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Earning => "earning",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Adjustment => "adjustment",
            TransactionType::Fee => "fee",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ledger entry settlement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum TransactionStatus {
    /// Recorded, not yet part of the balance
    Pending = 0,
    /// Applied to the balance
    Completed = 1,
    /// Never applied
    Failed = -1,
}

impl TransactionStatus {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(TransactionStatus::Pending),
            1 => Some(TransactionStatus::Completed),
            -1 => Some(TransactionStatus::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Expert wallet. `balance` always equals the sum of completed transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WalletAccount {
    #[schema(value_type = uuid::Uuid)]
    pub expert_id: UserId,
    #[schema(value_type = String, example = "120.00")]
    pub balance: Decimal,
    pub currency: String,
    pub updated_at: DateTime<Utc>,
}

impl WalletAccount {
    /// Empty wallet, as returned for experts without any ledger entry
    pub fn empty(expert_id: UserId, currency: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            expert_id,
            balance: Decimal::ZERO,
            currency: currency.into(),
            updated_at: now,
        }
    }
}

/// Immutable ledger row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WalletTransaction {
    #[schema(value_type = uuid::Uuid)]
    pub id: TransactionId,
    #[schema(value_type = uuid::Uuid)]
    pub expert_id: UserId,
    /// Signed amount: credits positive, debits negative
    #[schema(value_type = String, example = "-50.00")]
    pub amount: Decimal,
    pub tx_type: TransactionType,
    pub status: TransactionStatus,
    /// `booking:<id>`, `withdrawal:<id>` or an admin-supplied key
    pub reference: String,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

/// A ledger write requested by a service
///
/// Unique per (expert_id, reference, tx_type); replays are rejected by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub expert_id: UserId,
    pub amount: Decimal,
    pub tx_type: TransactionType,
    pub reference: String,
    /// Apply to the balance immediately instead of waiting for settlement
    pub settle_now: bool,
}

impl LedgerEntry {
    pub fn new(
        expert_id: UserId,
        amount: Decimal,
        tx_type: TransactionType,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            expert_id,
            amount,
            tx_type,
            reference: reference.into(),
            settle_now: true,
        }
    }

    pub fn deferred(mut self) -> Self {
        self.settle_now = false;
        self
    }

    /// Materialize the ledger row this entry produces
    pub fn to_transaction(&self, now: DateTime<Utc>) -> WalletTransaction {
        let (status, settled_at) = if self.settle_now {
            (TransactionStatus::Completed, Some(now))
        } else {
            (TransactionStatus::Pending, None)
        };
        WalletTransaction {
            id: new_id(),
            expert_id: self.expert_id,
            amount: self.amount,
            tx_type: self.tx_type,
            status,
            reference: self.reference.clone(),
            created_at: now,
            settled_at,
        }
    }
}

/// Withdrawal request lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum WithdrawalStatus {
    Pending = 0,
    Approved = 10,
    Paid = 20,
    Rejected = -10,
}

impl WithdrawalStatus {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(WithdrawalStatus::Pending),
            10 => Some(WithdrawalStatus::Approved),
            20 => Some(WithdrawalStatus::Paid),
            -10 => Some(WithdrawalStatus::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Approved => "approved",
            WithdrawalStatus::Paid => "paid",
            WithdrawalStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Expert-initiated payout request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WithdrawalRequest {
    #[schema(value_type = uuid::Uuid)]
    pub id: WithdrawalId,
    #[schema(value_type = uuid::Uuid)]
    pub expert_id: UserId,
    #[schema(value_type = String, example = "50.00")]
    pub amount: Decimal,
    pub status: WithdrawalStatus,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    #[schema(value_type = Option<uuid::Uuid>)]
    pub processed_by: Option<UserId>,
    pub rejection_reason: Option<String>,
    pub payout_reference: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl WithdrawalRequest {
    pub fn new(expert_id: UserId, amount: Decimal, now: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            expert_id,
            amount,
            status: WithdrawalStatus::Pending,
            requested_at: now,
            processed_at: None,
            processed_by: None,
            rejection_reason: None,
            payout_reference: None,
            paid_at: None,
        }
    }

    /// Ledger reference of the debit produced by approval
    pub fn ledger_reference(&self) -> String {
        format!("withdrawal:{}", self.id)
    }

    /// The negative ledger entry written on approval
    pub fn debit_entry(&self) -> LedgerEntry {
        LedgerEntry::new(
            self.expert_id,
            -self.amount,
            TransactionType::Withdrawal,
            self.ledger_reference(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_type_ids_roundtrip() {
        for t in [
            TransactionType::Earning,
            TransactionType::Withdrawal,
            TransactionType::Adjustment,
            TransactionType::Fee,
        ] {
            assert_eq!(TransactionType::from_id(t.id()), Some(t));
        }
        assert!(TransactionType::from_id(0).is_none());
        assert!(WithdrawalStatus::from_id(5).is_none());
    }

    #[test]
    fn test_entry_settlement_mode() {
        let now = Utc::now();
        let entry = LedgerEntry::new(
            Uuid::new_v4(),
            Decimal::from(40),
            TransactionType::Earning,
            "booking:1",
        );
        let tx = entry.to_transaction(now);
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert_eq!(tx.settled_at, Some(now));

        let tx = entry.deferred().to_transaction(now);
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert!(tx.settled_at.is_none());
    }

    #[test]
    fn test_withdrawal_debit_entry() {
        let req = WithdrawalRequest::new(Uuid::new_v4(), Decimal::from(50), Utc::now());
        let entry = req.debit_entry();
        assert_eq!(entry.amount, Decimal::from(-50));
        assert_eq!(entry.tx_type, TransactionType::Withdrawal);
        assert_eq!(entry.reference, format!("withdrawal:{}", req.id));
        assert!(entry.settle_now);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&TransactionType::Fee).unwrap(),
            "\"fee\""
        );
        assert_eq!(
            serde_json::to_string(&WithdrawalStatus::Approved).unwrap(),
            "\"approved\""
        );
    }
}
