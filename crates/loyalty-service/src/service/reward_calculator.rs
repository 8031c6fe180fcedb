//! 积分计算
//!
//! 纯函数，不做任何 IO：消费金额 × 门店换算系数 × 活动倍数，结果保留两位小数（四舍五入，远离零）
//!
//! 乘法溢出或结果超出积分列的存储范围时返回 `Validation`

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{LoyaltyError, Result};
use crate::models::{Campaign, fits_storage};

/// 积分保留的小数位数
const POINTS_DECIMAL_PLACES: u32 = 2;

/// 计算一笔消费应得的积分
pub fn compute_points(
    amount: Decimal,
    conversion_factor: Decimal,
    campaign: Option<&Campaign>,
) -> Result<Decimal> {
    let multiplier = campaign.map_or(Decimal::ONE, |c| c.campaign_type.multiplier(amount));

    amount
        .checked_mul(conversion_factor)
        .and_then(|base| base.checked_mul(multiplier))
        .map(round_points)
        .filter(|points| fits_storage(*points))
        .ok_or_else(|| {
            LoyaltyError::Validation(format!(
                "积分超出可存储范围: amount={}, factor={}",
                amount, conversion_factor
            ))
        })
}

/// 计算返现，当前奖励模型只发放积分
pub fn compute_cashback(_amount: Decimal, _campaign: Option<&Campaign>) -> Decimal {
    Decimal::ZERO
}

#[inline]
pub fn round_points(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(POINTS_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}
