//! 奖励目录仓储

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::RewardRepositoryTrait;
use crate::error::Result;
use crate::models::Reward;

/// 奖励目录仓储
pub struct RewardRepository {
    pool: PgPool,
}

impl RewardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_reward(&self, id: i64) -> Result<Option<Reward>> {
        let reward = sqlx::query_as::<_, Reward>(
            r#"
            SELECT id, store_id, description, points_required, created_at, updated_at
            FROM rewards
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reward)
    }

    /// 门店的兑换目录，按所需积分升序
    pub async fn list_by_store(&self, store_id: i64) -> Result<Vec<Reward>> {
        let rewards = sqlx::query_as::<_, Reward>(
            r#"
            SELECT id, store_id, description, points_required, created_at, updated_at
            FROM rewards
            WHERE store_id = $1
            ORDER BY points_required, id
            "#,
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rewards)
    }
}

#[async_trait]
impl RewardRepositoryTrait for RewardRepository {
    async fn get_reward(&self, id: i64) -> Result<Option<Reward>> {
        self.get_reward(id).await
    }

    async fn list_by_store(&self, store_id: i64) -> Result<Vec<Reward>> {
        self.list_by_store(store_id).await
    }
}
