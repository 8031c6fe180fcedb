//! 奖励 API 处理器

use axum::{
    Json,
    extract::{Path, State},
};
use axum_extra::extract::WithRejection;
use validator::Validate;

use super::JsonBody;
use crate::{
    error::LoyaltyError,
    models::Reward,
    response::ApiResponse,
    service::{ClaimConfirmation, ClaimRewardRequest},
    state::AppState,
};

/// 兑换奖励
///
/// POST /api/v1/rewards/{reward_id}/claim
pub async fn claim_reward(
    State(state): State<AppState>,
    Path(reward_id): Path<i64>,
    WithRejection(Json(req), _): JsonBody<ClaimRewardRequest>,
) -> Result<Json<ApiResponse<ClaimConfirmation>>, LoyaltyError> {
    req.validate()?;

    let confirmation = state
        .claim_service
        .claim_reward(req.user_id, req.store_id, reward_id)
        .await?;
    Ok(Json(ApiResponse::success(confirmation)))
}

/// 门店兑换目录
///
/// GET /api/v1/stores/{store_id}/rewards
pub async fn list_store_rewards(
    State(state): State<AppState>,
    Path(store_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Reward>>>, LoyaltyError> {
    let rewards = state.claim_service.list_store_rewards(store_id).await?;
    Ok(Json(ApiResponse::success(rewards)))
}
