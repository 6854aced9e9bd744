//! Request bodies and the validating JSON extractor
//!
//! Shape checks (lengths, ranges) run in the extractor via `validator`;
//! business rules stay in the services.

use axum::{
    Json,
    extract::{FromRequest, Request},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::error::ApiError;
use super::money::MoneyAmount;
use crate::booking::NewBooking;
use crate::booking::service::MAX_COMMENT_LEN;
use crate::core_types::UserId;

/// `MAX_COMMENT_LEN` as the `u64` the `validator` length check expects
const MAX_COMMENT_LEN_U64: u64 = MAX_COMMENT_LEN as u64;

// ============================================================================
// Extractor
// ============================================================================

/// `Json<T>` that also runs `T::validate()`; both failures answer 400
/// in the unified envelope.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value): Json<T> = Json::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e.body_text())))?;

        value
            .validate()
            .map_err(|e| ApiError::bad_request(e.to_string()))?;

        Ok(ValidJson(value))
    }
}

// ============================================================================
// Bookings
// ============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookingRequest {
    #[schema(value_type = uuid::Uuid)]
    pub expert_id: UserId,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    /// Omit for a free session
    #[serde(default)]
    pub price: Option<MoneyAmount>,
}

impl From<CreateBookingRequest> for NewBooking {
    fn from(req: CreateBookingRequest) -> Self {
        NewBooking {
            expert_id: req.expert_id,
            scheduled_start: req.scheduled_start,
            scheduled_end: req.scheduled_end,
            price: req.price.map(MoneyAmount::inner),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct CancelBookingRequest {
    #[serde(default)]
    #[validate(length(max = 500))]
    #[schema(example = "Schedule conflict")]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReviewRequest {
    #[validate(range(min = 1, max = 5))]
    #[schema(minimum = 1, maximum = 5, example = 5)]
    pub rating: i16,
    #[serde(default)]
    #[validate(length(max = MAX_COMMENT_LEN_U64))]
    pub comment: String,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

// ============================================================================
// Wallet
// ============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct WithdrawalBody {
    pub amount: MoneyAmount,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreditRequest {
    pub amount: MoneyAmount,
    #[validate(length(min = 1, max = 128))]
    #[schema(example = "booking:6f1c2b0e-0d7e-4b8e-9a55-1f3c8f0b2a11")]
    pub reference: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdjustRequest {
    /// Signed; negative amounts debit the wallet
    pub amount: MoneyAmount,
    #[validate(length(min = 1, max = 128))]
    pub reference: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RejectWithdrawalRequest {
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct MarkPaidRequest {
    #[validate(length(min = 1, max = 128))]
    pub payout_reference: String,
}

// ============================================================================
// Query strings
// ============================================================================

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitQuery {
    /// Maximum rows returned
    pub limit: Option<usize>,
}

impl LimitQuery {
    pub fn or(&self, default: usize) -> usize {
        self.limit.unwrap_or(default)
    }
}
