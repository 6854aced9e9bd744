//! Expert wallet handlers
//!
//! Every route acts on the caller's own wallet; only experts have one.

use std::sync::Arc;

use axum::{
    Extension,
    extract::{Query, State},
};

use super::super::state::AppState;
use super::super::types::{
    ApiError, ApiResult, LimitQuery, ValidJson, WithdrawalBody, created, ok,
};
use crate::auth::{Actor, Role};
use crate::error::CoreError;
use crate::wallet::{WalletAccount, WalletTransaction, WithdrawalRequest};

const DEFAULT_HISTORY_LIMIT: usize = 50;

fn require_expert(actor: &Actor) -> Result<(), ApiError> {
    if actor.role != Role::Expert {
        return Err(CoreError::Forbidden.into());
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/v1/wallet",
    responses(
        (status = 200, description = "Wallet balance", body = WalletAccount),
        (status = 403, description = "Not an expert")
    ),
    security(("bearer_auth" = [])),
    tag = "Wallet"
)]
pub async fn get_wallet(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<WalletAccount> {
    require_expert(&actor)?;
    ok(state.ledger.wallet(actor.user_id).await?)
}

/// Ledger history, newest first
#[utoipa::path(
    get,
    path = "/api/v1/wallet/transactions",
    params(LimitQuery),
    responses(
        (status = 200, description = "Ledger rows", body = Vec<WalletTransaction>),
        (status = 403, description = "Not an expert")
    ),
    security(("bearer_auth" = [])),
    tag = "Wallet"
)]
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Vec<WalletTransaction>> {
    require_expert(&actor)?;
    let limit = query.or(DEFAULT_HISTORY_LIMIT);
    ok(state.ledger.transactions(actor.user_id, limit).await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/wallet/withdrawals",
    responses(
        (status = 200, description = "Withdrawal requests, newest first", body = Vec<WithdrawalRequest>),
        (status = 403, description = "Not an expert")
    ),
    security(("bearer_auth" = [])),
    tag = "Wallet"
)]
pub async fn list_withdrawals(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Vec<WithdrawalRequest>> {
    require_expert(&actor)?;
    ok(state.withdrawals.withdrawals(actor.user_id).await?)
}

/// Ask for a payout; the balance is only debited on approval
#[utoipa::path(
    post,
    path = "/api/v1/wallet/withdrawals",
    request_body = WithdrawalBody,
    responses(
        (status = 201, description = "Withdrawal pending review", body = WithdrawalRequest),
        (status = 400, description = "Invalid amount"),
        (status = 403, description = "Not an expert"),
        (status = 422, description = "Insufficient balance")
    ),
    security(("bearer_auth" = [])),
    tag = "Wallet"
)]
pub async fn request_withdrawal(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    ValidJson(req): ValidJson<WithdrawalBody>,
) -> ApiResult<WithdrawalRequest> {
    require_expert(&actor)?;
    let request = state
        .withdrawals
        .request_withdrawal(actor.user_id, req.amount.inner())
        .await?;
    created(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::handlers::test_support::TestApp;
    use crate::gateway::types::{MoneyAmount, error_codes};
    use axum::{Json, http::StatusCode};
    use rust_decimal::Decimal;

    fn body(amount: &str) -> ValidJson<WithdrawalBody> {
        ValidJson(WithdrawalBody {
            amount: MoneyAmount::parse(amount).unwrap(),
        })
    }

    #[tokio::test]
    async fn test_wallet_routes_are_expert_only() {
        let app = TestApp::new();
        let err = get_wallet(State(app.state.clone()), Extension(app.client))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_withdrawal_against_balance() {
        let app = TestApp::new();
        let expert = app.expert;

        let err = request_withdrawal(State(app.state.clone()), Extension(expert), body("10"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code, error_codes::INSUFFICIENT_BALANCE);

        app.state
            .ledger
            .credit(expert.user_id, Decimal::from(25), "seed:1")
            .await
            .unwrap();

        let (status, Json(resp)) =
            request_withdrawal(State(app.state.clone()), Extension(expert), body("10"))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(resp.data.unwrap().amount, Decimal::from(10));

        let (_, Json(resp)) = list_withdrawals(State(app.state.clone()), Extension(expert))
            .await
            .unwrap();
        assert_eq!(resp.data.unwrap().len(), 1);

        // Balance untouched until approval
        let (_, Json(resp)) = get_wallet(State(app.state.clone()), Extension(expert))
            .await
            .unwrap();
        assert_eq!(resp.data.unwrap().balance, Decimal::from(25));

        let (_, Json(resp)) = list_transactions(
            State(app.state.clone()),
            Extension(expert),
            Query(LimitQuery::default()),
        )
        .await
        .unwrap();
        assert_eq!(resp.data.unwrap().len(), 1);
    }
}
