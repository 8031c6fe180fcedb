//! 服务层 DTO 定义
//!
//! 服务入参与出参，同时作为 HTTP 请求体和响应体（camelCase）

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{AccumulatedReward, CampaignType, NewCampaign, Transaction};

/// 交易列表默认条数
pub const DEFAULT_TRANSACTION_LIMIT: i64 = 20;
/// 交易列表最大条数
pub const MAX_TRANSACTION_LIMIT: i64 = 100;

// ==================== 交易 ====================

/// 记录消费交易请求
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    #[validate(range(min = 1, message = "用户 ID 无效"))]
    pub user_id: i64,
    #[validate(range(min = 1, message = "分店 ID 无效"))]
    pub branch_id: i64,
    /// 消费金额，必须大于 0 且最多两位小数
    pub amount: Decimal,
}

/// 记录消费交易响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionResponse {
    pub points_earned: Decimal,
    pub transaction: Transaction,
}

/// 交易列表查询参数
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListQuery {
    pub limit: Option<i64>,
}

impl TransactionListQuery {
    /// 限定在 [1, MAX_TRANSACTION_LIMIT] 范围内
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_TRANSACTION_LIMIT)
            .clamp(1, MAX_TRANSACTION_LIMIT)
    }
}

// ==================== 余额 ====================

/// 积分余额
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub user_id: i64,
    pub store_id: i64,
    pub points_accumulated: Decimal,
    pub cashback_accumulated: Decimal,
}

impl From<AccumulatedReward> for BalanceResponse {
    fn from(row: AccumulatedReward) -> Self {
        Self {
            user_id: row.user_id,
            store_id: row.store_id,
            points_accumulated: row.points_accumulated,
            cashback_accumulated: row.cashback_accumulated,
        }
    }
}

// ==================== 奖励兑换 ====================

/// 兑换奖励请求（奖励 ID 取自路径）
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRewardRequest {
    #[validate(range(min = 1, message = "用户 ID 无效"))]
    pub user_id: i64,
    #[validate(range(min = 1, message = "门店 ID 无效"))]
    pub store_id: i64,
}

/// 兑换确认
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimConfirmation {
    pub reward_id: i64,
    pub description: String,
    pub points_redeemed: Decimal,
    pub points_remaining: Decimal,
}

// ==================== 活动 ====================

/// 创建活动请求
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignRequest {
    #[validate(length(min = 1, max = 255, message = "活动名称长度必须在1-255个字符之间"))]
    pub name: String,
    #[validate(range(min = 1, message = "分店 ID 无效"))]
    pub branch_id: i64,
    pub campaign_type: CampaignType,
    #[serde(default)]
    pub percentage: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl From<CreateCampaignRequest> for NewCampaign {
    fn from(req: CreateCampaignRequest) -> Self {
        Self {
            name: req.name,
            branch_id: req.branch_id,
            campaign_type: req.campaign_type,
            percentage: req.percentage,
            start_date: req.start_date,
            end_date: req.end_date,
        }
    }
}
