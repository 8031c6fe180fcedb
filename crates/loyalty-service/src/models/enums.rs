//! 积分服务枚举类型定义
//!
//! 所有枚举都支持数据库（sqlx）和 JSON（serde）序列化

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 追加活动的消费门槛（严格大于才生效）
pub const ADDITIONAL_THRESHOLD: Decimal = Decimal::from_parts(20_000, 0, 0, false, 0);

/// 追加活动倍数 1.30
pub const ADDITIONAL_MULTIPLIER: Decimal = Decimal::from_parts(130, 0, 0, false, 2);

/// 双倍活动倍数
pub const DOUBLE_MULTIPLIER: Decimal = Decimal::from_parts(2, 0, 0, false, 0);

/// 活动类型
///
/// 决定交易积分的倍数规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum CampaignType {
    /// 双倍积分，无消费门槛
    Double,
    /// 追加积分，消费超过门槛后按 1.30 倍计算
    Additional,
}

impl CampaignType {
    /// 返回该活动对给定消费金额适用的倍数
    pub fn multiplier(&self, amount: Decimal) -> Decimal {
        match self {
            Self::Double => DOUBLE_MULTIPLIER,
            Self::Additional if amount > ADDITIONAL_THRESHOLD => ADDITIONAL_MULTIPLIER,
            Self::Additional => Decimal::ONE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::Additional => "additional",
        }
    }
}

/// 奖励类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum RewardType {
    /// 积分
    #[default]
    Points,
    /// 返现（保留，当前不累计）
    Cashback,
}
