//! 积分服务错误类型
//!
//! 定义服务层的业务错误和系统错误，并映射为 HTTP 响应

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;

use loyalty_shared::error::is_transient_sqlx_error;

/// 积分服务错误类型
#[derive(Debug, Error)]
pub enum LoyaltyError {
    // === 资源不存在 ===
    #[error("门店分店不存在: {0}")]
    BranchNotFound(i64),

    #[error("门店不存在: {0}")]
    StoreNotFound(i64),

    #[error("用户不存在: {0}")]
    UserNotFound(i64),

    #[error("奖励不存在: {0}")]
    RewardNotFound(i64),

    #[error("积分余额不存在: user_id={user_id}, store_id={store_id}")]
    BalanceNotFound { user_id: i64, store_id: i64 },

    #[error("交易不存在: {0}")]
    TransactionNotFound(i64),

    // === 业务冲突 ===
    #[error("积分不足: 需要 {required}, 可用 {available}")]
    InsufficientBalance {
        required: Decimal,
        available: Decimal,
    },

    #[error("活动时间与已有活动重叠: branch_id={branch_id}, campaign_id={existing_id}")]
    CampaignOverlap { branch_id: i64, existing_id: i64 },

    #[error("参数校验失败: {0}")]
    Validation(String),

    // === 系统错误 ===
    #[error("存储暂时不可用: {0}")]
    TransientStoreFailure(String),

    #[error("交易已记录但积分未入账: transaction_id={transaction_id}, reason={reason}")]
    InconsistentState { transaction_id: i64, reason: String },

    #[error("数据库错误: {0}")]
    Database(#[source] sqlx::Error),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 积分服务 Result 类型别名
pub type Result<T> = std::result::Result<T, LoyaltyError>;

/// PostgreSQL numeric_value_out_of_range
const NUMERIC_OUT_OF_RANGE: &str = "22003";

fn is_numeric_overflow(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == NUMERIC_OUT_OF_RANGE)
}

/// 连接层故障归为瞬时故障，数值越界归为校验失败，其余保留原始数据库错误
impl From<sqlx::Error> for LoyaltyError {
    fn from(err: sqlx::Error) -> Self {
        if is_transient_sqlx_error(&err) {
            Self::TransientStoreFailure(err.to_string())
        } else if is_numeric_overflow(&err) {
            Self::Validation(format!("数值超出可存储范围: {}", err))
        } else {
            Self::Database(err)
        }
    }
}

/// 请求体无法解析
impl From<JsonRejection> for LoyaltyError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// 查询参数无法解析
impl From<QueryRejection> for LoyaltyError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for LoyaltyError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl LoyaltyError {
    /// 检查是否为可重试的错误
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientStoreFailure(_))
    }

    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        !matches!(
            self,
            Self::TransientStoreFailure(_)
                | Self::InconsistentState { .. }
                | Self::Database(_)
                | Self::Internal(_)
        )
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BranchNotFound(_) => "BRANCH_NOT_FOUND",
            Self::StoreNotFound(_) => "STORE_NOT_FOUND",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::RewardNotFound(_) => "REWARD_NOT_FOUND",
            Self::BalanceNotFound { .. } => "BALANCE_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::CampaignOverlap { .. } => "CAMPAIGN_OVERLAP",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::TransientStoreFailure(_) => "STORE_UNAVAILABLE",
            Self::InconsistentState { .. } => "INCONSISTENT_STATE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BranchNotFound(_)
            | Self::StoreNotFound(_)
            | Self::UserNotFound(_)
            | Self::RewardNotFound(_)
            | Self::BalanceNotFound { .. }
            | Self::TransactionNotFound(_) => StatusCode::NOT_FOUND,

            Self::InsufficientBalance { .. } | Self::CampaignOverlap { .. } => StatusCode::CONFLICT,

            Self::Validation(_) => StatusCode::BAD_REQUEST,

            Self::TransientStoreFailure(_) => StatusCode::SERVICE_UNAVAILABLE,

            Self::InconsistentState { .. } | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for LoyaltyError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "数据库操作失败");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "内部错误");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::TransientStoreFailure(e) => {
                tracing::warn!(error = %e, "存储暂时不可用");
                "服务繁忙，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}
