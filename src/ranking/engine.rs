//! Ranking Engine
//!
//! Score = weighted mean of the factors that have data, on a 0..5 scale.
//! The rating factor is a Bayesian average damped toward a configured prior,
//! so it is always defined and few reviews cannot swing it to an extreme.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::types::{RankingFactors, RankingScore, RankingSignals};
use crate::config::RankingConfig;
use crate::core_types::UserId;
use crate::error::CoreResult;
use crate::store::RankingStore;

const MAX_SCORE: f64 = 5.0;

#[inline]
fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Pure scoring function: same signals and config give the same result
pub fn compute_score(
    expert_id: UserId,
    signals: &RankingSignals,
    config: &RankingConfig,
    now: DateTime<Utc>,
) -> RankingScore {
    let n = signals.review_count.max(0) as f64;
    let rating_sum = signals.rating_sum as f64;

    let average_rating = (signals.review_count > 0).then(|| round4(rating_sum / n));

    let damping = config.prior_weight + n;
    let bayesian_rating = if damping > 0.0 {
        (config.prior_weight * config.prior_rating + rating_sum) / damping
    } else {
        config.prior_rating
    };

    let finished = signals.completed_count + signals.canceled_count;
    let completion_rate =
        (finished > 0).then(|| signals.completed_count as f64 / finished as f64);

    let target = config.response_target_secs as i64;
    let response_score = (!signals.response_times_secs.is_empty()).then(|| {
        let on_time = signals
            .response_times_secs
            .iter()
            .filter(|secs| **secs <= target)
            .count();
        on_time as f64 / signals.response_times_secs.len() as f64
    });

    let mut weighted = config.rating_weight * bayesian_rating;
    let mut total_weight = config.rating_weight;
    if let Some(rate) = completion_rate {
        weighted += config.completion_weight * rate * MAX_SCORE;
        total_weight += config.completion_weight;
    }
    if let Some(share) = response_score {
        weighted += config.response_weight * share * MAX_SCORE;
        total_weight += config.response_weight;
    }

    let score = if total_weight > 0.0 {
        weighted / total_weight
    } else {
        bayesian_rating
    };

    RankingScore {
        expert_id,
        score: round4(score.clamp(0.0, MAX_SCORE)),
        factors: RankingFactors {
            average_rating,
            bayesian_rating: round4(bayesian_rating),
            completion_rate: completion_rate.map(round4),
            response_score: response_score.map(round4),
            review_count: signals.review_count,
            completed_count: signals.completed_count,
            canceled_count: signals.canceled_count,
        },
        computed_at: now,
    }
}

/// Loads signals, scores them and stores the materialized result
#[derive(Clone)]
pub struct RankingEngine {
    store: Arc<dyn RankingStore>,
    config: RankingConfig,
}

impl RankingEngine {
    pub fn new(store: Arc<dyn RankingStore>, config: RankingConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// Recompute and persist the score of one expert
    pub async fn compute_ranking(&self, expert_id: UserId) -> CoreResult<RankingScore> {
        let signals = self.store.ranking_signals(expert_id).await?;
        let score = compute_score(expert_id, &signals, &self.config, Utc::now());
        self.store.save_ranking(&score).await?;

        debug!(
            expert_id = %expert_id,
            score = score.score,
            reviews = signals.review_count,
            "Ranking recomputed"
        );
        Ok(score)
    }

    /// Stored score, computed on demand when missing
    pub async fn get_ranking(&self, expert_id: UserId) -> CoreResult<RankingScore> {
        match self.store.get_ranking(expert_id).await? {
            Some(score) => Ok(score),
            None => self.compute_ranking(expert_id).await,
        }
    }

    /// Recompute every ranked expert. Individual failures are logged and skipped.
    ///
    /// Returns the number of experts recomputed.
    pub async fn recompute_all(&self) -> CoreResult<usize> {
        let experts = self.store.ranked_expert_ids().await?;
        let mut done = 0;
        for expert_id in experts {
            match self.compute_ranking(expert_id).await {
                Ok(_) => done += 1,
                Err(e) => warn!(expert_id = %expert_id, error = %e, "Ranking recompute failed"),
            }
        }
        info!(experts = done, "Rankings recomputed");
        Ok(done)
    }
}
