//! 积分余额 API 处理器

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{error::LoyaltyError, response::ApiResponse, service::BalanceResponse, state::AppState};

/// 用户在门店的积分余额
///
/// GET /api/v1/users/{user_id}/stores/{store_id}/balance
pub async fn get_balance(
    State(state): State<AppState>,
    Path((user_id, store_id)): Path<(i64, i64)>,
) -> Result<Json<ApiResponse<BalanceResponse>>, LoyaltyError> {
    let balance = state.ledger.get_balance(user_id, store_id).await?;
    Ok(Json(ApiResponse::success(balance.into())))
}

/// 用户在所有门店的积分余额
///
/// GET /api/v1/users/{user_id}/balances
pub async fn list_balances(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<BalanceResponse>>>, LoyaltyError> {
    let balances = state.ledger.list_balances(user_id).await?;
    Ok(Json(ApiResponse::success(
        balances.into_iter().map(BalanceResponse::from).collect(),
    )))
}
