//! Booking lifecycle handlers

use std::sync::Arc;

use axum::{
    Extension,
    extract::{Path, State},
};

use super::super::state::AppState;
use super::super::types::{
    ApiResult, CancelBookingRequest, CreateBookingRequest, ReviewRequest, ValidJson, created, ok,
};
use crate::auth::Actor;
use crate::booking::{Booking, Review};
use crate::core_types::BookingId;

/// Request a session with an expert (clients only)
#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created in pending state", body = Booking),
        (status = 400, description = "Invalid schedule or price"),
        (status = 401, description = "Authentication failed"),
        (status = 403, description = "Only clients can book")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    ValidJson(req): ValidJson<CreateBookingRequest>,
) -> ApiResult<Booking> {
    let booking = state.bookings.create(&actor, req.into()).await?;
    created(booking)
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    params(("id" = String, Path, description = "Booking ID (UUID)")),
    responses(
        (status = 200, description = "Booking", body = Booking),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "Booking not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<BookingId>,
) -> ApiResult<Booking> {
    ok(state.bookings.get(id, &actor).await?)
}

/// Expert accepts a pending booking
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/confirm",
    params(("id" = String, Path, description = "Booking ID (UUID)")),
    responses(
        (status = 200, description = "Booking confirmed", body = Booking),
        (status = 403, description = "Not the booked expert"),
        (status = 409, description = "Booking is not pending")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<BookingId>,
) -> ApiResult<Booking> {
    ok(state.bookings.confirm(id, &actor).await?)
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/start",
    params(("id" = String, Path, description = "Booking ID (UUID)")),
    responses(
        (status = 200, description = "Session in progress", body = Booking),
        (status = 403, description = "Not a participant"),
        (status = 409, description = "Booking is not confirmed")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn start_booking(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<BookingId>,
) -> ApiResult<Booking> {
    ok(state.bookings.start(id, &actor).await?)
}

/// Finish a session; credits the expert for paid bookings
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/complete",
    params(("id" = String, Path, description = "Booking ID (UUID)")),
    responses(
        (status = 200, description = "Booking completed", body = Booking),
        (status = 403, description = "Not a participant"),
        (status = 409, description = "Booking is not in progress")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn complete_booking(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<BookingId>,
) -> ApiResult<Booking> {
    ok(state.bookings.complete(id, &actor).await?)
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/cancel",
    params(("id" = String, Path, description = "Booking ID (UUID)")),
    request_body = CancelBookingRequest,
    responses(
        (status = 200, description = "Booking canceled", body = Booking),
        (status = 403, description = "Not a participant or admin"),
        (status = 409, description = "Booking already started or finished")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<BookingId>,
    ValidJson(req): ValidJson<CancelBookingRequest>,
) -> ApiResult<Booking> {
    ok(state.bookings.cancel(id, &actor, &req.reason).await?)
}

/// Client reviews a completed booking, once
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/review",
    params(("id" = String, Path, description = "Booking ID (UUID)")),
    request_body = ReviewRequest,
    responses(
        (status = 201, description = "Review recorded", body = Review),
        (status = 400, description = "Rating out of range"),
        (status = 403, description = "Not the booking's client"),
        (status = 409, description = "Not completed or already reviewed")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn review_booking(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<BookingId>,
    ValidJson(req): ValidJson<ReviewRequest>,
) -> ApiResult<Review> {
    let review = state
        .bookings
        .review(id, &actor, req.rating, &req.comment, req.is_public)
        .await?;
    created(review)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::BookingStatus;
    use crate::gateway::handlers::test_support::TestApp;
    use crate::gateway::types::error_codes;
    use crate::notification::EventType;
    use crate::notification::mock::drain;
    use axum::http::StatusCode;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn create_request(expert_id: Uuid, price: Option<&str>) -> CreateBookingRequest {
        let start = Utc::now() + Duration::days(1);
        CreateBookingRequest {
            expert_id,
            scheduled_start: start,
            scheduled_end: start + Duration::hours(1),
            price: price.map(|p| crate::gateway::types::MoneyAmount::parse(p).unwrap()),
        }
    }

    #[tokio::test]
    async fn test_booking_flow_through_handlers() {
        let mut app = TestApp::new();
        let state = app.state.clone();

        let (status, axum::Json(body)) = create_booking(
            State(state.clone()),
            Extension(app.client),
            ValidJson(create_request(app.expert.user_id, Some("40.00"))),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        let booking = body.data.unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);

        let expert = Extension(app.expert);
        confirm_booking(State(state.clone()), expert.clone(), Path(booking.id))
            .await
            .unwrap();
        start_booking(State(state.clone()), expert.clone(), Path(booking.id))
            .await
            .unwrap();
        complete_booking(State(state.clone()), expert, Path(booking.id))
            .await
            .unwrap();

        let events: Vec<EventType> = drain(&mut app.dispatcher)
            .into_iter()
            .map(|n| n.event_type)
            .collect();
        assert_eq!(
            events,
            vec![EventType::BookingCreated, EventType::PaymentReceived]
        );
        assert_eq!(app.store.all_transactions(app.expert.user_id).await.len(), 1);

        let (_, axum::Json(body)) = get_booking(
            State(state.clone()),
            Extension(app.client),
            Path(booking.id),
        )
        .await
        .unwrap();
        assert_eq!(body.data.unwrap().status, BookingStatus::Completed);

        let (status, axum::Json(body)) = review_booking(
            State(state.clone()),
            Extension(app.client),
            Path(booking.id),
            ValidJson(ReviewRequest {
                rating: 5,
                comment: "Great".to_string(),
                is_public: true,
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.data.unwrap().rating, 5);
    }

    #[tokio::test]
    async fn test_errors_render_with_codes() {
        let app = TestApp::new();
        let state = app.state.clone();

        let err = get_booking(
            State(state.clone()),
            Extension(app.client),
            Path(Uuid::new_v4()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, error_codes::NOT_FOUND);

        // Experts cannot book
        let err = create_booking(
            State(state.clone()),
            Extension(app.expert),
            ValidJson(create_request(Uuid::new_v4(), None)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let (_, axum::Json(body)) = create_booking(
            State(state.clone()),
            Extension(app.client),
            ValidJson(create_request(app.expert.user_id, None)),
        )
        .await
        .unwrap();
        let booking = body.data.unwrap();

        let err = complete_booking(
            State(state.clone()),
            Extension(app.expert),
            Path(booking.id),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, error_codes::INVALID_TRANSITION);

        let (_, axum::Json(body)) = cancel_booking(
            State(state),
            Extension(app.client),
            Path(booking.id),
            ValidJson(CancelBookingRequest {
                reason: "Conflict".to_string(),
            }),
        )
        .await
        .unwrap();
        let canceled = body.data.unwrap();
        assert_eq!(canceled.status, BookingStatus::Canceled);
        assert_eq!(canceled.canceled_by, Some(app.client.user_id));
    }
}
