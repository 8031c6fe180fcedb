//! 促销活动仓储

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::CampaignRepositoryTrait;
use crate::error::Result;
use crate::models::{Campaign, NewCampaign};

/// 促销活动仓储
pub struct CampaignRepository {
    pool: PgPool,
}

impl CampaignRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 列出分店的全部活动
    ///
    /// 最新创建的排在前面，活动区间重叠时以此顺序决定优先级
    pub async fn list_by_branch(&self, branch_id: i64) -> Result<Vec<Campaign>> {
        let campaigns = sqlx::query_as::<_, Campaign>(
            r#"
            SELECT id, name, branch_id, campaign_type, percentage,
                   start_date, end_date, created_at, updated_at
            FROM campaigns
            WHERE branch_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(campaigns)
    }

    pub async fn create(&self, campaign: &NewCampaign) -> Result<Campaign> {
        let created = sqlx::query_as::<_, Campaign>(
            r#"
            INSERT INTO campaigns (name, branch_id, campaign_type, percentage, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, branch_id, campaign_type, percentage,
                      start_date, end_date, created_at, updated_at
            "#,
        )
        .bind(&campaign.name)
        .bind(campaign.branch_id)
        .bind(campaign.campaign_type)
        .bind(campaign.percentage)
        .bind(campaign.start_date)
        .bind(campaign.end_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }
}

#[async_trait]
impl CampaignRepositoryTrait for CampaignRepository {
    async fn list_by_branch(&self, branch_id: i64) -> Result<Vec<Campaign>> {
        self.list_by_branch(branch_id).await
    }

    async fn create(&self, campaign: &NewCampaign) -> Result<Campaign> {
        self.create(campaign).await
    }
}
