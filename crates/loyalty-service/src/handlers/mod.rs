//! HTTP 处理器

pub mod balance;
pub mod campaign;
pub mod reward;
pub mod transaction;

use axum::{Json, extract::Query};
use axum_extra::extract::WithRejection;

use crate::error::LoyaltyError;

/// JSON 请求体，解析失败时返回统一的 `VALIDATION_ERROR` 响应
pub type JsonBody<T> = WithRejection<Json<T>, LoyaltyError>;

/// 查询参数，解析失败时返回统一的 `VALIDATION_ERROR` 响应
pub type QueryParams<T> = WithRejection<Query<T>, LoyaltyError>;

/// 存活检查
pub async fn health_check() -> &'static str {
    "OK"
}
