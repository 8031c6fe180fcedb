//! 活动 API 处理器

use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::WithRejection;

use super::JsonBody;
use crate::{
    error::LoyaltyError, models::Campaign, response::ApiResponse,
    service::CreateCampaignRequest, state::AppState,
};

/// 创建活动
///
/// POST /api/v1/campaigns
pub async fn create_campaign(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Campaign>>), LoyaltyError> {
    let campaign = state.campaign_service.create_campaign(req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(campaign))))
}
