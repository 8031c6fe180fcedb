//! 奖励目录与积分余额实体定义

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// NUMERIC(12,2) 列可存储数值的上界（不含）：10^10
pub const STORED_VALUE_LIMIT: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

/// 数值能否写入金额、积分列
pub fn fits_storage(value: Decimal) -> bool {
    value.abs() < STORED_VALUE_LIMIT
}

/// 奖励（门店兑换目录项）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: i64,
    pub store_id: i64,
    /// 奖励描述（全局唯一）
    pub description: String,
    pub points_required: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 用户在某门店的累计积分
///
/// 每个 (user_id, store_id) 唯一一行，首次入账时创建，数值始终非负
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AccumulatedReward {
    pub id: i64,
    pub user_id: i64,
    pub store_id: i64,
    pub points_accumulated: Decimal,
    pub cashback_accumulated: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
