//! Booking Core Types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::state::BookingStatus;
use crate::core_types::{BookingId, ReviewId, UserId, new_id};

/// One consultation engagement between a client and an expert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Booking {
    #[schema(value_type = uuid::Uuid)]
    pub id: BookingId,
    #[schema(value_type = uuid::Uuid)]
    pub client_id: UserId,
    #[schema(value_type = uuid::Uuid)]
    pub expert_id: UserId,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub status: BookingStatus,
    /// Session price; `None` for free sessions
    #[schema(value_type = Option<String>, example = "40.00")]
    pub price: Option<Decimal>,
    pub currency: String,
    pub cancellation_reason: Option<String>,
    #[schema(value_type = Option<uuid::Uuid>)]
    pub canceled_by: Option<UserId>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Create a new booking in PENDING state
    pub fn new(
        client_id: UserId,
        expert_id: UserId,
        scheduled_start: DateTime<Utc>,
        scheduled_end: DateTime<Utc>,
        price: Option<Decimal>,
        currency: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: new_id(),
            client_id,
            expert_id,
            scheduled_start,
            scheduled_end,
            status: BookingStatus::Pending,
            price,
            currency: currency.into(),
            cancellation_reason: None,
            canceled_by: None,
            confirmed_at: None,
            started_at: None,
            completed_at: None,
            reminder_sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Client or expert of this booking
    #[inline]
    pub fn is_participant(&self, user_id: UserId) -> bool {
        self.client_id == user_id || self.expert_id == user_id
    }

    /// The other party of the booking, from `user_id`'s point of view
    pub fn counterparty(&self, user_id: UserId) -> Option<UserId> {
        if user_id == self.client_id {
            Some(self.expert_id)
        } else if user_id == self.expert_id {
            Some(self.client_id)
        } else {
            None
        }
    }

    /// Price that should be credited on completion
    pub fn billable_amount(&self) -> Option<Decimal> {
        self.price.filter(|p| *p > Decimal::ZERO)
    }

    /// Ledger reference of the earning produced by this booking
    pub fn ledger_reference(&self) -> String {
        format!("booking:{}", self.id)
    }

    /// Seconds between the request and the expert's confirmation
    pub fn response_time_secs(&self) -> Option<i64> {
        self.confirmed_at
            .map(|at| (at - self.created_at).num_seconds().max(0))
    }

    /// Apply a persisted transition to the in-memory row
    pub fn apply(&mut self, transition: &Transition) {
        self.status = transition.to;
        self.updated_at = transition.at;
        match transition.to {
            BookingStatus::Confirmed => self.confirmed_at = Some(transition.at),
            BookingStatus::InProgress => self.started_at = Some(transition.at),
            BookingStatus::Completed => self.completed_at = Some(transition.at),
            BookingStatus::Canceled => {
                self.cancellation_reason = transition.reason.clone();
                self.canceled_by = transition.actor;
            }
            BookingStatus::Pending => {}
        }
    }
}

/// A status change to persist with compare-and-swap semantics
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub at: DateTime<Utc>,
    pub reason: Option<String>,
    pub actor: Option<UserId>,
}

impl Transition {
    pub fn new(from: BookingStatus, to: BookingStatus, at: DateTime<Utc>) -> Self {
        Self {
            from,
            to,
            at,
            reason: None,
            actor: None,
        }
    }

    pub fn by(mut self, actor: UserId) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Client review of a completed booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Review {
    #[schema(value_type = uuid::Uuid)]
    pub id: ReviewId,
    #[schema(value_type = uuid::Uuid)]
    pub booking_id: BookingId,
    #[schema(value_type = uuid::Uuid)]
    pub client_id: UserId,
    #[schema(value_type = uuid::Uuid)]
    pub expert_id: UserId,
    #[schema(minimum = 1, maximum = 5)]
    pub rating: i16,
    pub comment: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub const MIN_RATING: i16 = 1;
    pub const MAX_RATING: i16 = 5;

    pub fn new(
        booking: &Booking,
        rating: i16,
        comment: impl Into<String>,
        is_public: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: new_id(),
            booking_id: booking.id,
            client_id: booking.client_id,
            expert_id: booking.expert_id,
            rating,
            comment: comment.into(),
            is_public,
            created_at: now,
        }
    }

    #[inline]
    pub fn is_valid_rating(rating: i16) -> bool {
        (Self::MIN_RATING..=Self::MAX_RATING).contains(&rating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn booking(price: Option<Decimal>) -> Booking {
        let now = Utc::now();
        Booking::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            now + Duration::hours(1),
            now + Duration::hours(2),
            price,
            "USD",
            now,
        )
    }

    #[test]
    fn test_new_booking_is_pending() {
        let b = booking(None);
        assert_eq!(b.status, BookingStatus::Pending);
        assert_eq!(b.created_at, b.updated_at);
        assert!(b.confirmed_at.is_none());
    }

    #[test]
    fn test_counterparty() {
        let b = booking(None);
        assert_eq!(b.counterparty(b.client_id), Some(b.expert_id));
        assert_eq!(b.counterparty(b.expert_id), Some(b.client_id));
        assert_eq!(b.counterparty(Uuid::new_v4()), None);
        assert!(!b.is_participant(Uuid::new_v4()));
    }

    #[test]
    fn test_billable_amount() {
        assert_eq!(booking(None).billable_amount(), None);
        assert_eq!(booking(Some(Decimal::ZERO)).billable_amount(), None);
        assert_eq!(
            booking(Some(Decimal::from(40))).billable_amount(),
            Some(Decimal::from(40))
        );
    }

    #[test]
    fn test_apply_transitions() {
        let mut b = booking(None);
        let confirmed_at = b.created_at + Duration::minutes(30);
        b.apply(&Transition::new(
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            confirmed_at,
        ));
        assert_eq!(b.status, BookingStatus::Confirmed);
        assert_eq!(b.response_time_secs(), Some(1800));

        let canceler = b.expert_id;
        b.apply(
            &Transition::new(BookingStatus::Confirmed, BookingStatus::Canceled, Utc::now())
                .by(canceler)
                .with_reason("sick"),
        );
        assert_eq!(b.cancellation_reason.as_deref(), Some("sick"));
        assert_eq!(b.canceled_by, Some(canceler));
    }

    #[test]
    fn test_rating_bounds() {
        assert!(!Review::is_valid_rating(0));
        assert!(Review::is_valid_rating(1));
        assert!(Review::is_valid_rating(5));
        assert!(!Review::is_valid_rating(6));
    }
}
