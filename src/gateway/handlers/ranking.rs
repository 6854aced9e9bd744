//! Expert ranking handler

use std::sync::Arc;

use axum::extract::{Path, State};

use super::super::state::AppState;
use super::super::types::{ApiResult, ok};
use crate::core_types::UserId;
use crate::ranking::RankingScore;

/// Current score of an expert; computed on first request
#[utoipa::path(
    get,
    path = "/api/v1/experts/{id}/ranking",
    params(("id" = String, Path, description = "Expert user ID (UUID)")),
    responses(
        (status = 200, description = "Ranking score in [0, 5]", body = RankingScore)
    ),
    tag = "Ranking"
)]
pub async fn get_ranking(
    State(state): State<Arc<AppState>>,
    Path(expert_id): Path<UserId>,
) -> ApiResult<RankingScore> {
    ok(state.ranking.get_ranking(expert_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::handlers::test_support::TestApp;
    use axum::Json;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_unknown_expert_gets_prior_score() {
        let app = TestApp::new();
        let (_, Json(resp)) = get_ranking(State(app.state.clone()), Path(Uuid::new_v4()))
            .await
            .unwrap();
        let score = resp.data.unwrap();
        assert_eq!(score.factors.review_count, 0);
        assert!((0.0..=5.0).contains(&score.score));
    }
}
