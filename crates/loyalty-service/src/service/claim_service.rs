//! 奖励兑换服务
//!
//! 校验奖励归属和余额后原子扣减积分

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};

use loyalty_shared::observability::metrics;

use super::balance_ledger::BalanceLedger;
use super::dto::ClaimConfirmation;
use super::store_access::StoreAccess;
use crate::error::{LoyaltyError, Result};
use crate::models::Reward;
use crate::repository::{BranchRepositoryTrait, RewardRepositoryTrait};

/// 奖励兑换服务
pub struct ClaimService {
    reward_repo: Arc<dyn RewardRepositoryTrait>,
    branch_repo: Arc<dyn BranchRepositoryTrait>,
    ledger: Arc<BalanceLedger>,
    access: StoreAccess,
}

impl ClaimService {
    pub fn new(
        reward_repo: Arc<dyn RewardRepositoryTrait>,
        branch_repo: Arc<dyn BranchRepositoryTrait>,
        ledger: Arc<BalanceLedger>,
        access: StoreAccess,
    ) -> Self {
        Self {
            reward_repo,
            branch_repo,
            ledger,
            access,
        }
    }

    /// 兑换奖励
    ///
    /// 余额预检只用于给出明确的错误，真正的扣减由账本的条件更新保证不超扣
    #[instrument(skip(self), fields(user_id = user_id, store_id = store_id, reward_id = reward_id))]
    pub async fn claim_reward(
        &self,
        user_id: i64,
        store_id: i64,
        reward_id: i64,
    ) -> Result<ClaimConfirmation> {
        let start = Instant::now();
        let result = self.claim(user_id, store_id, reward_id).await;

        let status = match &result {
            Ok(_) => "success",
            Err(e) => e.error_code(),
        };
        metrics::record_claim(store_id, status, start.elapsed().as_secs_f64());

        result
    }

    async fn claim(&self, user_id: i64, store_id: i64, reward_id: i64) -> Result<ClaimConfirmation> {
        let reward = self
            .access
            .read("get_reward", || self.reward_repo.get_reward(reward_id))
            .await?
            .ok_or(LoyaltyError::RewardNotFound(reward_id))?;

        if reward.store_id != store_id {
            warn!(
                reward_store_id = reward.store_id,
                "奖励不属于请求的门店"
            );
            return Err(LoyaltyError::Validation(format!(
                "奖励 {} 不属于门店 {}",
                reward_id, store_id
            )));
        }

        let balance = self.ledger.get_balance(user_id, store_id).await?;
        if balance.points_accumulated < reward.points_required {
            return Err(LoyaltyError::InsufficientBalance {
                required: reward.points_required,
                available: balance.points_accumulated,
            });
        }

        let remaining = self
            .ledger
            .redeem(user_id, store_id, reward.points_required)
            .await?;

        info!(
            description = %reward.description,
            points_redeemed = %reward.points_required,
            points_remaining = %remaining.points_accumulated,
            "奖励兑换成功"
        );

        Ok(ClaimConfirmation {
            reward_id: reward.id,
            description: reward.description,
            points_redeemed: reward.points_required,
            points_remaining: remaining.points_accumulated,
        })
    }

    /// 门店的兑换目录，门店不存在返回 `StoreNotFound`
    pub async fn list_store_rewards(&self, store_id: i64) -> Result<Vec<Reward>> {
        let store = self
            .access
            .read("get_store", || self.branch_repo.get_store(store_id))
            .await?;
        if store.is_none() {
            return Err(LoyaltyError::StoreNotFound(store_id));
        }

        self.access
            .read("list_store_rewards", || self.reward_repo.list_by_store(store_id))
            .await
    }
}
