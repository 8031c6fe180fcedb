//! 门店与分店实体定义

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 门店
///
/// 拥有分店和奖励目录，`conversion_factor` 表示每单位消费金额折算的积分
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: i64,
    pub name: String,
    /// 积分换算系数（默认 1.0）
    pub conversion_factor: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 门店分店
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: i64,
    pub store_id: i64,
    pub name: String,
    #[sqlx(default)]
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 分店及其所属门店的换算系数
///
/// 交易入账时需要同时知道分店和门店，通过显式查询一次取回
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BranchWithStore {
    pub branch_id: i64,
    pub store_id: i64,
    pub conversion_factor: Decimal,
}
