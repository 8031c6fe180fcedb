//! 仓储 Trait 定义
//!
//! 定义仓储接口，便于服务层依赖抽象而非具体实现，支持 mock 测试

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::{
    AccumulatedReward, Branch, BranchWithStore, Campaign, NewCampaign, NewTransaction, Reward,
    Store, Transaction, User,
};

/// 门店与分店仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BranchRepositoryTrait: Send + Sync {
    async fn get_store(&self, id: i64) -> Result<Option<Store>>;
    async fn get_branch(&self, id: i64) -> Result<Option<Branch>>;
    /// 分店连同所属门店的换算系数
    async fn get_branch_with_store(&self, branch_id: i64) -> Result<Option<BranchWithStore>>;
}

/// 促销活动仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CampaignRepositoryTrait: Send + Sync {
    /// 分店全部活动，按 created_at、id 倒序
    async fn list_by_branch(&self, branch_id: i64) -> Result<Vec<Campaign>>;
    async fn create(&self, campaign: &NewCampaign) -> Result<Campaign>;
}

/// 交易仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    async fn create(&self, transaction: &NewTransaction) -> Result<Transaction>;

    /// 写入交易并累加积分余额，二者要么同时成功要么同时失败
    async fn create_with_accrual(
        &self,
        transaction: &NewTransaction,
        store_id: i64,
    ) -> Result<(Transaction, AccumulatedReward)>;

    /// 是否支持 `create_with_accrual` 的原子语义
    fn supports_atomic_accrual(&self) -> bool;

    async fn get(&self, id: i64) -> Result<Option<Transaction>>;
    async fn list_by_user(&self, user_id: i64, limit: i64) -> Result<Vec<Transaction>>;
}

/// 积分余额仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerRepositoryTrait: Send + Sync {
    /// 累加积分与返现，余额不存在时创建
    async fn accrue(
        &self,
        user_id: i64,
        store_id: i64,
        points: Decimal,
        cashback: Decimal,
    ) -> Result<AccumulatedReward>;

    /// 条件扣减积分
    ///
    /// 余额不存在返回 `BalanceNotFound`，不足返回 `InsufficientBalance`，两种情况下余额均不变
    async fn redeem(&self, user_id: i64, store_id: i64, points: Decimal)
    -> Result<AccumulatedReward>;

    async fn get_balance(&self, user_id: i64, store_id: i64) -> Result<Option<AccumulatedReward>>;
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<AccumulatedReward>>;
}

/// 奖励目录仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RewardRepositoryTrait: Send + Sync {
    async fn get_reward(&self, id: i64) -> Result<Option<Reward>>;
    async fn list_by_store(&self, store_id: i64) -> Result<Vec<Reward>>;
}

/// 用户仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    async fn get_user(&self, id: i64) -> Result<Option<User>>;
}
