//! Booking Service
//!
//! Drives the booking lifecycle. Every transition is a compare-and-swap on
//! the stored status; when the swap loses a race the booking is reloaded
//! and the request re-evaluated against the new state.
//!
//! Side effects run strictly after the store commits: ranking recompute,
//! then notifications.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::state::BookingStatus;
use super::types::{Booking, Review, Transition};
use crate::auth::{Actor, Role};
use crate::core_types::{BookingId, UserId};
use crate::error::{CoreError, CoreResult};
use crate::notification::{EventType, Notifier};
use crate::ranking::RankingEngine;
use crate::store::BookingStore;
use crate::wallet::{LedgerService, TransactionType};

/// Reload-and-retry attempts after a lost compare-and-swap
const MAX_CAS_ATTEMPTS: usize = 5;

/// Bookings reminded per run
const REMINDER_BATCH: usize = 200;

pub const MAX_COMMENT_LEN: usize = 2000;

/// Parameters of a new booking request
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub expert_id: UserId,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub price: Option<Decimal>,
}

pub struct BookingService {
    store: Arc<dyn BookingStore>,
    ledger: Arc<LedgerService>,
    ranking: RankingEngine,
    notifier: Notifier,
}

impl BookingService {
    pub fn new(
        store: Arc<dyn BookingStore>,
        ledger: Arc<LedgerService>,
        ranking: RankingEngine,
        notifier: Notifier,
    ) -> Self {
        Self {
            store,
            ledger,
            ranking,
            notifier,
        }
    }

    /// Client requests a session with an expert
    pub async fn create(&self, actor: &Actor, req: NewBooking) -> CoreResult<Booking> {
        if actor.role != Role::Client {
            return Err(CoreError::Forbidden);
        }
        if actor.user_id == req.expert_id {
            return Err(CoreError::InvalidInput(
                "Client and expert must differ".to_string(),
            ));
        }
        if req.scheduled_end <= req.scheduled_start {
            return Err(CoreError::InvalidInput(
                "scheduled_end must be after scheduled_start".to_string(),
            ));
        }
        let now = Utc::now();
        if req.scheduled_start <= now {
            return Err(CoreError::InvalidInput(
                "scheduled_start must be in the future".to_string(),
            ));
        }
        if req.price.is_some_and(|p| p < Decimal::ZERO) {
            return Err(CoreError::InvalidInput(
                "Price must not be negative".to_string(),
            ));
        }

        let booking = Booking::new(
            actor.user_id,
            req.expert_id,
            req.scheduled_start,
            req.scheduled_end,
            req.price,
            &self.ledger.config().currency,
            now,
        );
        self.store.insert_booking(&booking).await?;

        info!(
            booking_id = %booking.id,
            client_id = %booking.client_id,
            expert_id = %booking.expert_id,
            "Booking created"
        );
        self.notifier.notify(
            booking.expert_id,
            EventType::BookingCreated,
            json!({
                "booking_id": booking.id,
                "client_id": booking.client_id,
                "scheduled_start": booking.scheduled_start,
                "scheduled_end": booking.scheduled_end,
            }),
            Some(booking_link(booking.id)),
        );
        Ok(booking)
    }

    /// Read a booking; parties and admins only
    pub async fn get(&self, id: BookingId, actor: &Actor) -> CoreResult<Booking> {
        let booking = self.load(id).await?;
        if !actor.is_admin() && !booking.is_participant(actor.user_id) {
            return Err(CoreError::Forbidden);
        }
        Ok(booking)
    }

    /// PENDING → CONFIRMED by the booking's expert
    pub async fn confirm(&self, id: BookingId, actor: &Actor) -> CoreResult<Booking> {
        let (booking, changed) = self
            .transition(id, |booking, now| {
                if actor.user_id != booking.expert_id {
                    return Err(CoreError::Forbidden);
                }
                match booking.status {
                    BookingStatus::Pending => Ok(Some(
                        Transition::new(booking.status, BookingStatus::Confirmed, now)
                            .by(actor.user_id),
                    )),
                    BookingStatus::Confirmed => Ok(None),
                    _ => Err(invalid("confirm", booking)),
                }
            })
            .await?;

        if changed {
            info!(booking_id = %id, expert_id = %booking.expert_id, "Booking confirmed");
        }
        Ok(booking)
    }

    /// CONFIRMED → IN_PROGRESS by either party. No-op when already running.
    pub async fn start(&self, id: BookingId, actor: &Actor) -> CoreResult<Booking> {
        let (booking, changed) = self
            .transition(id, |booking, now| {
                ensure_participant(booking, actor)?;
                match booking.status {
                    BookingStatus::Confirmed => Ok(Some(
                        Transition::new(booking.status, BookingStatus::InProgress, now)
                            .by(actor.user_id),
                    )),
                    BookingStatus::InProgress => Ok(None),
                    _ => Err(invalid("start", booking)),
                }
            })
            .await?;

        if changed {
            info!(booking_id = %id, actor_id = %actor.user_id, "Booking started");
        } else {
            debug!(booking_id = %id, "Booking already in progress");
        }
        Ok(booking)
    }

    /// IN_PROGRESS → COMPLETED by either party, crediting the expert in the
    /// same store transaction.
    ///
    /// Retrying on a completed booking writes nothing and only re-runs the
    /// ranking recompute. Ranking failures never fail a committed completion.
    pub async fn complete(&self, id: BookingId, actor: &Actor) -> CoreResult<Booking> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let mut booking = self.load(id).await?;
            ensure_participant(&booking, actor)?;

            match booking.status {
                BookingStatus::InProgress => {}
                BookingStatus::Completed => {
                    debug!(booking_id = %id, "Booking already completed, refreshing ranking");
                    self.refresh_ranking(booking.expert_id).await;
                    return Ok(booking);
                }
                _ => return Err(invalid("complete", &booking)),
            }

            let transition =
                Transition::new(booking.status, BookingStatus::Completed, Utc::now())
                    .by(actor.user_id);
            let entries = self.ledger.booking_entries(&booking);

            let Some(written) = self
                .store
                .complete_booking(id, &transition, &entries)
                .await?
            else {
                debug!(booking_id = %id, "Lost completion race, reloading");
                continue;
            };
            booking.apply(&transition);

            info!(
                booking_id = %id,
                expert_id = %booking.expert_id,
                ledger_rows = written.len(),
                "Booking completed"
            );

            if let Some(earning) = written
                .iter()
                .find(|tx| tx.tx_type == TransactionType::Earning)
            {
                self.notifier.notify(
                    booking.expert_id,
                    EventType::PaymentReceived,
                    json!({
                        "booking_id": booking.id,
                        "amount": earning.amount.to_string(),
                        "currency": booking.currency,
                        "status": earning.status,
                        "reference": earning.reference,
                    }),
                    Some("/wallet".to_string()),
                );
            }

            self.refresh_ranking(booking.expert_id).await;
            return Ok(booking);
        }

        Err(contended(id))
    }

    /// PENDING/CONFIRMED → CANCELED by either party or an admin
    pub async fn cancel(&self, id: BookingId, actor: &Actor, reason: &str) -> CoreResult<Booking> {
        let reason = reason.trim();
        let (booking, _) = self
            .transition(id, |booking, now| {
                if !actor.is_admin() && !booking.is_participant(actor.user_id) {
                    return Err(CoreError::Forbidden);
                }
                if !booking.status.is_cancelable() {
                    return Err(invalid("cancel", booking));
                }
                let mut t = Transition::new(booking.status, BookingStatus::Canceled, now)
                    .by(actor.user_id);
                if !reason.is_empty() {
                    t = t.with_reason(reason);
                }
                Ok(Some(t))
            })
            .await?;

        info!(
            booking_id = %id,
            canceled_by = %actor.user_id,
            role = %actor.role,
            reason,
            "Booking canceled"
        );

        let recipients = match booking.counterparty(actor.user_id) {
            Some(other) => vec![other],
            None => vec![booking.client_id, booking.expert_id],
        };
        for user_id in recipients {
            self.notifier.notify(
                user_id,
                EventType::BookingCanceled,
                json!({
                    "booking_id": booking.id,
                    "canceled_by": actor.user_id,
                    "reason": booking.cancellation_reason,
                }),
                Some(booking_link(booking.id)),
            );
        }

        self.refresh_ranking(booking.expert_id).await;
        Ok(booking)
    }

    /// Client reviews a completed booking, once
    pub async fn review(
        &self,
        id: BookingId,
        actor: &Actor,
        rating: i16,
        comment: &str,
        is_public: bool,
    ) -> CoreResult<Review> {
        let booking = self.load(id).await?;
        if actor.user_id != booking.client_id {
            return Err(CoreError::Forbidden);
        }
        if booking.status != BookingStatus::Completed {
            return Err(invalid("review", &booking));
        }
        if !Review::is_valid_rating(rating) {
            return Err(CoreError::InvalidInput(format!(
                "Rating must be between {} and {}",
                Review::MIN_RATING,
                Review::MAX_RATING
            )));
        }
        let comment = comment.trim();
        if comment.chars().count() > MAX_COMMENT_LEN {
            return Err(CoreError::InvalidInput(format!(
                "Comment exceeds {} characters",
                MAX_COMMENT_LEN
            )));
        }

        let review = Review::new(&booking, rating, comment, is_public, Utc::now());
        self.store.insert_review(&review).await?;
        info!(
            booking_id = %id,
            expert_id = %booking.expert_id,
            rating,
            "Review recorded"
        );

        self.refresh_ranking(booking.expert_id).await;
        Ok(review)
    }

    /// Remind both parties of confirmed bookings starting within `lead`.
    ///
    /// Each booking is reminded at most once. Returns the number reminded.
    pub async fn send_reminders(&self, now: DateTime<Utc>, lead: Duration) -> CoreResult<usize> {
        let due = self
            .store
            .bookings_due_reminder(now, now + lead, REMINDER_BATCH)
            .await?;

        let mut sent = 0;
        for booking in due {
            if !self.store.mark_reminded(booking.id, now).await? {
                continue;
            }
            for user_id in [booking.client_id, booking.expert_id] {
                self.notifier.notify(
                    user_id,
                    EventType::BookingReminder,
                    json!({
                        "booking_id": booking.id,
                        "scheduled_start": booking.scheduled_start,
                    }),
                    Some(booking_link(booking.id)),
                );
            }
            sent += 1;
        }

        if sent > 0 {
            info!(count = sent, "Booking reminders sent");
        }
        Ok(sent)
    }

    async fn load(&self, id: BookingId) -> CoreResult<Booking> {
        self.store
            .get_booking(id)
            .await?
            .ok_or_else(|| CoreError::booking_not_found(id))
    }

    /// Load, decide, compare-and-swap; reload and decide again on a lost race.
    ///
    /// `decide` returns `None` for an idempotent no-op. The flag in the result
    /// tells whether a transition was written.
    async fn transition<F>(&self, id: BookingId, decide: F) -> CoreResult<(Booking, bool)>
    where
        F: Fn(&Booking, DateTime<Utc>) -> CoreResult<Option<Transition>> + Send + Sync,
    {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let mut booking = self.load(id).await?;
            let Some(transition) = decide(&booking, Utc::now())? else {
                return Ok((booking, false));
            };

            if self.store.transition_booking(id, &transition).await? {
                booking.apply(&transition);
                return Ok((booking, true));
            }
            debug!(
                booking_id = %id,
                expected = %transition.from,
                "Booking changed concurrently, reloading"
            );
        }

        Err(contended(id))
    }

    /// Ranking refresh after an already committed change; a failure is
    /// caught up by the periodic recompute.
    async fn refresh_ranking(&self, expert_id: UserId) {
        if let Err(e) = self.ranking.compute_ranking(expert_id).await {
            warn!(expert_id = %expert_id, error = %e, "Ranking recompute failed");
        }
    }
}

fn ensure_participant(booking: &Booking, actor: &Actor) -> CoreResult<()> {
    if booking.is_participant(actor.user_id) {
        Ok(())
    } else {
        Err(CoreError::Forbidden)
    }
}

fn invalid(action: &str, booking: &Booking) -> CoreError {
    CoreError::InvalidTransition(format!("cannot {} a {} booking", action, booking.status))
}

fn contended(id: BookingId) -> CoreError {
    warn!(booking_id = %id, "Giving up after repeated concurrent modification");
    CoreError::System(format!("Booking {} is being modified concurrently", id))
}

fn booking_link(id: BookingId) -> String {
    format!("/bookings/{}", id)
}
