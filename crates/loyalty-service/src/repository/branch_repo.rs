//! 门店与分店仓储

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::BranchRepositoryTrait;
use crate::error::Result;
use crate::models::{Branch, BranchWithStore, Store};

/// 门店与分店仓储
pub struct BranchRepository {
    pool: PgPool,
}

impl BranchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_store(&self, id: i64) -> Result<Option<Store>> {
        let store = sqlx::query_as::<_, Store>(
            r#"
            SELECT id, name, conversion_factor, created_at, updated_at
            FROM stores
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(store)
    }

    pub async fn get_branch(&self, id: i64) -> Result<Option<Branch>> {
        let branch = sqlx::query_as::<_, Branch>(
            r#"
            SELECT id, store_id, name, address, created_at, updated_at
            FROM branches
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(branch)
    }

    /// 查询分店及所属门店换算系数
    pub async fn get_branch_with_store(&self, branch_id: i64) -> Result<Option<BranchWithStore>> {
        let row = sqlx::query_as::<_, BranchWithStore>(
            r#"
            SELECT b.id AS branch_id, s.id AS store_id, s.conversion_factor
            FROM branches b
            JOIN stores s ON s.id = b.store_id
            WHERE b.id = $1
            "#,
        )
        .bind(branch_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

#[async_trait]
impl BranchRepositoryTrait for BranchRepository {
    async fn get_store(&self, id: i64) -> Result<Option<Store>> {
        self.get_store(id).await
    }

    async fn get_branch(&self, id: i64) -> Result<Option<Branch>> {
        self.get_branch(id).await
    }

    async fn get_branch_with_store(&self, branch_id: i64) -> Result<Option<BranchWithStore>> {
        self.get_branch_with_store(branch_id).await
    }
}
