//! Ranking Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core_types::UserId;

/// Raw per-expert aggregates read from reviews and bookings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankingSignals {
    pub review_count: i64,
    pub rating_sum: i64,
    pub completed_count: i64,
    pub canceled_count: i64,
    /// Request-to-confirmation delay of every confirmed booking
    pub response_times_secs: Vec<i64>,
}

/// Inputs that produced a score, kept for transparency and badging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RankingFactors {
    /// Plain mean of ratings; `None` without reviews
    pub average_rating: Option<f64>,
    /// Mean damped toward the configured prior
    pub bayesian_rating: f64,
    /// completed / (completed + canceled); `None` without finished bookings
    pub completion_rate: Option<f64>,
    /// Share of confirmations within the response target; `None` without confirmations
    pub response_score: Option<f64>,
    pub review_count: i64,
    pub completed_count: i64,
    pub canceled_count: i64,
}

/// Derived expert score in [0, 5]. Recomputed, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RankingScore {
    #[schema(value_type = uuid::Uuid)]
    pub expert_id: UserId,
    #[schema(minimum = 0.0, maximum = 5.0, example = 4.5321)]
    pub score: f64,
    pub factors: RankingFactors,
    pub computed_at: DateTime<Utc>,
}

impl RankingScore {
    /// Same score and factors, ignoring when it was computed
    pub fn same_result(&self, other: &RankingScore) -> bool {
        self.expert_id == other.expert_id
            && self.score == other.score
            && self.factors == other.factors
    }
}
