//! Admin handlers: wallet corrections, withdrawal review, ranking refresh

use std::sync::Arc;

use axum::{
    Extension,
    extract::{Path, Query, State},
};

use super::super::state::AppState;
use super::super::types::{
    AdjustRequest, ApiResult, CreditRequest, LimitQuery, MarkPaidRequest, RejectWithdrawalRequest,
    ValidJson, created, ok,
};
use crate::auth::Actor;
use crate::core_types::{UserId, WithdrawalId};
use crate::ranking::RankingScore;
use crate::wallet::{WalletTransaction, WithdrawalRequest};

const DEFAULT_QUEUE_LIMIT: usize = 100;

/// Recompute and persist an expert's score now
#[utoipa::path(
    post,
    path = "/api/v1/admin/experts/{id}/ranking",
    params(("id" = String, Path, description = "Expert user ID (UUID)")),
    responses(
        (status = 200, description = "Fresh ranking score", body = RankingScore),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn compute_ranking(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(expert_id): Path<UserId>,
) -> ApiResult<RankingScore> {
    actor.require_admin()?;
    ok(state.ranking.compute_ranking(expert_id).await?)
}

/// Record an earning by hand; a repeated reference is rejected
#[utoipa::path(
    post,
    path = "/api/v1/admin/wallets/{expert_id}/credit",
    params(("expert_id" = String, Path, description = "Expert user ID (UUID)")),
    request_body = CreditRequest,
    responses(
        (status = 201, description = "Ledger row written", body = WalletTransaction),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Reference already credited")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn credit_wallet(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(expert_id): Path<UserId>,
    ValidJson(req): ValidJson<CreditRequest>,
) -> ApiResult<WalletTransaction> {
    actor.require_admin()?;
    let tx = state
        .ledger
        .credit(expert_id, req.amount.inner(), &req.reference)
        .await?;
    created(tx)
}

/// Signed correction; never overdraws the wallet
#[utoipa::path(
    post,
    path = "/api/v1/admin/wallets/{expert_id}/adjust",
    params(("expert_id" = String, Path, description = "Expert user ID (UUID)")),
    request_body = AdjustRequest,
    responses(
        (status = 201, description = "Ledger row written", body = WalletTransaction),
        (status = 403, description = "Admin only"),
        (status = 422, description = "Would overdraw the wallet")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn adjust_wallet(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(expert_id): Path<UserId>,
    ValidJson(req): ValidJson<AdjustRequest>,
) -> ApiResult<WalletTransaction> {
    let tx = state
        .ledger
        .adjust(&actor, expert_id, req.amount.inner(), &req.reference)
        .await?;
    created(tx)
}

/// Review queue, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/admin/withdrawals",
    params(LimitQuery),
    responses(
        (status = 200, description = "Pending withdrawals", body = Vec<WithdrawalRequest>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn pending_withdrawals(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Vec<WithdrawalRequest>> {
    let limit = query.or(DEFAULT_QUEUE_LIMIT);
    ok(state.withdrawals.pending_withdrawals(&actor, limit).await?)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/withdrawals/{id}/approve",
    params(("id" = String, Path, description = "Withdrawal request ID (UUID)")),
    responses(
        (status = 200, description = "Approved and debited", body = WithdrawalRequest),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Request is not pending"),
        (status = 422, description = "Balance no longer covers the amount")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn approve_withdrawal(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<WithdrawalId>,
) -> ApiResult<WithdrawalRequest> {
    ok(state.withdrawals.approve_withdrawal(id, &actor).await?)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/withdrawals/{id}/reject",
    params(("id" = String, Path, description = "Withdrawal request ID (UUID)")),
    request_body = RejectWithdrawalRequest,
    responses(
        (status = 200, description = "Rejected", body = WithdrawalRequest),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Request is not pending")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn reject_withdrawal(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<WithdrawalId>,
    ValidJson(req): ValidJson<RejectWithdrawalRequest>,
) -> ApiResult<WithdrawalRequest> {
    ok(state
        .withdrawals
        .reject_withdrawal(id, &actor, &req.reason)
        .await?)
}

/// Record the payout provider's confirmation
#[utoipa::path(
    post,
    path = "/api/v1/admin/withdrawals/{id}/paid",
    params(("id" = String, Path, description = "Withdrawal request ID (UUID)")),
    request_body = MarkPaidRequest,
    responses(
        (status = 200, description = "Marked paid", body = WithdrawalRequest),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Request is not approved")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn mark_withdrawal_paid(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<WithdrawalId>,
    ValidJson(req): ValidJson<MarkPaidRequest>,
) -> ApiResult<WithdrawalRequest> {
    ok(state
        .withdrawals
        .mark_withdrawal_paid(id, &actor, &req.payout_reference)
        .await?)
}
