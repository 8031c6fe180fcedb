//! 交易仓储
//!
//! 交易写入与积分累加可在同一数据库事务中完成

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use super::ledger_repo::LedgerRepository;
use super::traits::TransactionRepositoryTrait;
use crate::error::Result;
use crate::models::{AccumulatedReward, NewTransaction, Transaction};

const INSERT_SQL: &str = r#"
    INSERT INTO transactions (user_id, branch_id, amount, transaction_date, reward_type,
                              points_earned, cashback_earned)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    RETURNING id, user_id, branch_id, amount, transaction_date, reward_type,
              points_earned, cashback_earned, created_at
"#;

/// 交易仓储
pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, transaction: &NewTransaction) -> Result<Transaction> {
        let row = sqlx::query_as::<_, Transaction>(INSERT_SQL)
            .bind(transaction.user_id)
            .bind(transaction.branch_id)
            .bind(transaction.amount)
            .bind(transaction.transaction_date)
            .bind(transaction.reward_type)
            .bind(transaction.points_earned)
            .bind(transaction.cashback_earned)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    /// 在事务中写入交易
    pub async fn create_in_tx(
        tx: &mut PgConnection,
        transaction: &NewTransaction,
    ) -> Result<Transaction> {
        let row = sqlx::query_as::<_, Transaction>(INSERT_SQL)
            .bind(transaction.user_id)
            .bind(transaction.branch_id)
            .bind(transaction.amount)
            .bind(transaction.transaction_date)
            .bind(transaction.reward_type)
            .bind(transaction.points_earned)
            .bind(transaction.cashback_earned)
            .fetch_one(tx)
            .await?;

        Ok(row)
    }

    /// 写入交易并累加余额
    ///
    /// 任一步失败时事务随 `tx` 析构回滚
    pub async fn create_with_accrual(
        &self,
        transaction: &NewTransaction,
        store_id: i64,
    ) -> Result<(Transaction, AccumulatedReward)> {
        let mut tx = self.pool.begin().await?;

        let created = Self::create_in_tx(&mut tx, transaction).await?;
        let balance = LedgerRepository::accrue_in_tx(
            &mut tx,
            transaction.user_id,
            store_id,
            transaction.points_earned,
            transaction.cashback_earned,
        )
        .await?;

        tx.commit().await?;

        Ok((created, balance))
    }

    pub async fn get(&self, id: i64) -> Result<Option<Transaction>> {
        let row = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, branch_id, amount, transaction_date, reward_type,
                   points_earned, cashback_earned, created_at
            FROM transactions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// 列出用户最近的交易，按时间倒序
    pub async fn list_by_user(&self, user_id: i64, limit: i64) -> Result<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, branch_id, amount, transaction_date, reward_type,
                   points_earned, cashback_earned, created_at
            FROM transactions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[async_trait]
impl TransactionRepositoryTrait for TransactionRepository {
    async fn create(&self, transaction: &NewTransaction) -> Result<Transaction> {
        self.create(transaction).await
    }

    async fn create_with_accrual(
        &self,
        transaction: &NewTransaction,
        store_id: i64,
    ) -> Result<(Transaction, AccumulatedReward)> {
        self.create_with_accrual(transaction, store_id).await
    }

    fn supports_atomic_accrual(&self) -> bool {
        true
    }

    async fn get(&self, id: i64) -> Result<Option<Transaction>> {
        self.get(id).await
    }

    async fn list_by_user(&self, user_id: i64, limit: i64) -> Result<Vec<Transaction>> {
        self.list_by_user(user_id, limit).await
    }
}
