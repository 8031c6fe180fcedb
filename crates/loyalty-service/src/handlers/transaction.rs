//! 交易 API 处理器

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;

use super::{JsonBody, QueryParams};
use crate::{
    error::LoyaltyError,
    models::Transaction,
    response::ApiResponse,
    service::{CreateTransactionRequest, CreateTransactionResponse, TransactionListQuery},
    state::AppState,
};

/// 记录消费交易
///
/// POST /api/v1/transactions
pub async fn create_transaction(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreateTransactionResponse>>), LoyaltyError> {
    let response = state.transaction_service.create_transaction(req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))))
}

/// 查询交易
///
/// GET /api/v1/transactions/{id}
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Transaction>>, LoyaltyError> {
    let transaction = state.transaction_service.get_transaction(id).await?;
    Ok(Json(ApiResponse::success(transaction)))
}

/// 用户最近的交易
///
/// GET /api/v1/users/{user_id}/transactions?limit=20
pub async fn list_user_transactions(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    WithRejection(Query(query), _): QueryParams<TransactionListQuery>,
) -> Result<Json<ApiResponse<Vec<Transaction>>>, LoyaltyError> {
    let transactions = state
        .transaction_service
        .list_user_transactions(user_id, query.limit())
        .await?;
    Ok(Json(ApiResponse::success(transactions)))
}
