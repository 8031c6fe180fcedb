//! 促销活动实体定义

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::CampaignType;

/// 促销活动
///
/// 作用于单个分店，起止日期均为包含边界的自然日
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    pub branch_id: i64,
    pub campaign_type: CampaignType,
    /// 仅对 additional 类型有意义
    pub percentage: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// 指定日期是否落在活动区间内（两端均包含）
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// 与另一个日期区间是否存在交集
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }
}

/// 待创建的活动
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCampaign {
    pub name: String,
    pub branch_id: i64,
    pub campaign_type: CampaignType,
    pub percentage: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}
