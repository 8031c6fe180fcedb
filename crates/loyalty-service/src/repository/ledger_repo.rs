//! 积分余额仓储
//!
//! 每个 (user_id, store_id) 对应一行累计余额，累加与扣减都在单条 SQL 内完成，
//! 由行锁保证同一用户同一门店的并发操作串行化

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use super::traits::LedgerRepositoryTrait;
use crate::error::{LoyaltyError, Result};
use crate::models::AccumulatedReward;

const ACCRUE_SQL: &str = r#"
    INSERT INTO accumulated_rewards (user_id, store_id, points_accumulated, cashback_accumulated)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (user_id, store_id) DO UPDATE
    SET points_accumulated = accumulated_rewards.points_accumulated + EXCLUDED.points_accumulated,
        cashback_accumulated = accumulated_rewards.cashback_accumulated + EXCLUDED.cashback_accumulated,
        updated_at = NOW()
    RETURNING id, user_id, store_id, points_accumulated, cashback_accumulated, created_at, updated_at
"#;

/// 积分余额仓储
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 累加积分，首次入账时插入新行
    pub async fn accrue(
        &self,
        user_id: i64,
        store_id: i64,
        points: Decimal,
        cashback: Decimal,
    ) -> Result<AccumulatedReward> {
        let row = sqlx::query_as::<_, AccumulatedReward>(ACCRUE_SQL)
            .bind(user_id)
            .bind(store_id)
            .bind(points)
            .bind(cashback)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    /// 在事务中累加积分
    pub async fn accrue_in_tx(
        tx: &mut PgConnection,
        user_id: i64,
        store_id: i64,
        points: Decimal,
        cashback: Decimal,
    ) -> Result<AccumulatedReward> {
        let row = sqlx::query_as::<_, AccumulatedReward>(ACCRUE_SQL)
            .bind(user_id)
            .bind(store_id)
            .bind(points)
            .bind(cashback)
            .fetch_one(tx)
            .await?;

        Ok(row)
    }

    /// 条件扣减积分
    ///
    /// 余额判断与扣减在同一条 UPDATE 中完成；未命中时再查一次区分“不存在”和“不足”
    pub async fn redeem(
        &self,
        user_id: i64,
        store_id: i64,
        points: Decimal,
    ) -> Result<AccumulatedReward> {
        let updated = sqlx::query_as::<_, AccumulatedReward>(
            r#"
            UPDATE accumulated_rewards
            SET points_accumulated = points_accumulated - $3,
                updated_at = NOW()
            WHERE user_id = $1 AND store_id = $2 AND points_accumulated >= $3
            RETURNING id, user_id, store_id, points_accumulated, cashback_accumulated, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(store_id)
        .bind(points)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = updated {
            return Ok(row);
        }

        match self.get_balance(user_id, store_id).await? {
            Some(current) => Err(LoyaltyError::InsufficientBalance {
                required: points,
                available: current.points_accumulated,
            }),
            None => Err(LoyaltyError::BalanceNotFound { user_id, store_id }),
        }
    }

    pub async fn get_balance(
        &self,
        user_id: i64,
        store_id: i64,
    ) -> Result<Option<AccumulatedReward>> {
        let row = sqlx::query_as::<_, AccumulatedReward>(
            r#"
            SELECT id, user_id, store_id, points_accumulated, cashback_accumulated, created_at, updated_at
            FROM accumulated_rewards
            WHERE user_id = $1 AND store_id = $2
            "#,
        )
        .bind(user_id)
        .bind(store_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// 列出用户在所有门店的余额
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<AccumulatedReward>> {
        let rows = sqlx::query_as::<_, AccumulatedReward>(
            r#"
            SELECT id, user_id, store_id, points_accumulated, cashback_accumulated, created_at, updated_at
            FROM accumulated_rewards
            WHERE user_id = $1
            ORDER BY store_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[async_trait]
impl LedgerRepositoryTrait for LedgerRepository {
    async fn accrue(
        &self,
        user_id: i64,
        store_id: i64,
        points: Decimal,
        cashback: Decimal,
    ) -> Result<AccumulatedReward> {
        self.accrue(user_id, store_id, points, cashback).await
    }

    async fn redeem(
        &self,
        user_id: i64,
        store_id: i64,
        points: Decimal,
    ) -> Result<AccumulatedReward> {
        self.redeem(user_id, store_id, points).await
    }

    async fn get_balance(&self, user_id: i64, store_id: i64) -> Result<Option<AccumulatedReward>> {
        self.get_balance(user_id, store_id).await
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<AccumulatedReward>> {
        self.list_by_user(user_id).await
    }
}
