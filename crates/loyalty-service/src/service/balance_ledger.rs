//! 积分余额账本
//!
//! 维护每个 (用户, 门店) 的累计积分与返现，提供原子累加、条件扣减和余额查询

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument};

use super::store_access::StoreAccess;
use crate::error::{LoyaltyError, Result};
use crate::models::AccumulatedReward;
use crate::repository::LedgerRepositoryTrait;

/// 积分余额账本服务
pub struct BalanceLedger {
    ledger_repo: Arc<dyn LedgerRepositoryTrait>,
    access: StoreAccess,
}

impl BalanceLedger {
    pub fn new(ledger_repo: Arc<dyn LedgerRepositoryTrait>, access: StoreAccess) -> Self {
        Self {
            ledger_repo,
            access,
        }
    }

    /// 累加积分与返现，增量必须非负
    #[instrument(skip(self), fields(user_id = user_id, store_id = store_id))]
    pub async fn accrue(
        &self,
        user_id: i64,
        store_id: i64,
        points: Decimal,
        cashback: Decimal,
    ) -> Result<AccumulatedReward> {
        if points.is_sign_negative() || cashback.is_sign_negative() {
            return Err(LoyaltyError::Validation(format!(
                "入账增量不能为负: points={}, cashback={}",
                points, cashback
            )));
        }

        self.access
            .write(
                "ledger_accrue",
                self.ledger_repo.accrue(user_id, store_id, points, cashback),
            )
            .await
    }

    /// 扣减积分
    ///
    /// 判断与扣减在存储层一次完成，并发请求不会把余额扣成负数
    #[instrument(skip(self), fields(user_id = user_id, store_id = store_id, points = %points))]
    pub async fn redeem(
        &self,
        user_id: i64,
        store_id: i64,
        points: Decimal,
    ) -> Result<AccumulatedReward> {
        if points.is_sign_negative() {
            return Err(LoyaltyError::Validation(format!(
                "扣减积分不能为负: {}",
                points
            )));
        }

        let balance = self
            .access
            .write(
                "ledger_redeem",
                self.ledger_repo.redeem(user_id, store_id, points),
            )
            .await?;

        info!(
            user_id,
            store_id,
            redeemed = %points,
            remaining = %balance.points_accumulated,
            "积分扣减成功"
        );

        Ok(balance)
    }

    /// 查询余额，不存在返回 `BalanceNotFound`
    pub async fn get_balance(&self, user_id: i64, store_id: i64) -> Result<AccumulatedReward> {
        self.access
            .read("ledger_get_balance", || {
                self.ledger_repo.get_balance(user_id, store_id)
            })
            .await?
            .ok_or(LoyaltyError::BalanceNotFound { user_id, store_id })
    }

    /// 列出用户在所有门店的余额
    pub async fn list_balances(&self, user_id: i64) -> Result<Vec<AccumulatedReward>> {
        self.access
            .read("ledger_list_balances", || self.ledger_repo.list_by_user(user_id))
            .await
    }
}
