//! 消费交易实体定义

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::RewardType;

/// 消费交易
///
/// 创建后不可修改，记录交易发生时实际入账的积分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub branch_id: i64,
    /// 消费金额（两位小数）
    pub amount: Decimal,
    /// 交易时间
    pub transaction_date: DateTime<Utc>,
    pub reward_type: RewardType,
    pub points_earned: Decimal,
    pub cashback_earned: Decimal,
    pub created_at: DateTime<Utc>,
}

/// 待写入的交易
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub user_id: i64,
    pub branch_id: i64,
    pub amount: Decimal,
    pub transaction_date: DateTime<Utc>,
    pub reward_type: RewardType,
    pub points_earned: Decimal,
    pub cashback_earned: Decimal,
}
