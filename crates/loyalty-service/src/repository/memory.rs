//! 进程内仓储实现
//!
//! 用于本地调试和测试，所有表保存在 DashMap 中。
//! 同一 (user_id, store_id) 的余额变更通过 DashMap 的条目锁串行化。

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;

use super::traits::{
    BranchRepositoryTrait, CampaignRepositoryTrait, LedgerRepositoryTrait, RewardRepositoryTrait,
    TransactionRepositoryTrait, UserRepositoryTrait,
};
use crate::error::{LoyaltyError, Result};
use crate::models::{
    AccumulatedReward, Branch, BranchWithStore, Campaign, NewCampaign, NewTransaction, Reward,
    Store, Transaction, User, fits_storage,
};

/// 进程内存储
///
/// 同时实现全部仓储 trait，通过 `Repositories::memory` 注入服务层
#[derive(Default)]
pub struct MemoryStore {
    sequence: AtomicI64,
    stores: DashMap<i64, Store>,
    branches: DashMap<i64, Branch>,
    users: DashMap<i64, User>,
    campaigns: DashMap<i64, Campaign>,
    transactions: DashMap<i64, Transaction>,
    ledger: DashMap<(i64, i64), AccumulatedReward>,
    rewards: DashMap<i64, Reward>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> i64 {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    // ==================== 数据准备 ====================

    pub fn add_store(&self, name: &str, conversion_factor: Decimal) -> Store {
        let now = Utc::now();
        let store = Store {
            id: self.next_id(),
            name: name.to_string(),
            conversion_factor,
            created_at: now,
            updated_at: now,
        };
        self.stores.insert(store.id, store.clone());
        store
    }

    pub fn add_branch(&self, store_id: i64, name: &str) -> Branch {
        let now = Utc::now();
        let branch = Branch {
            id: self.next_id(),
            store_id,
            name: name.to_string(),
            address: None,
            created_at: now,
            updated_at: now,
        };
        self.branches.insert(branch.id, branch.clone());
        branch
    }

    pub fn add_user(&self, name: &str, email: &str) -> User {
        let now = Utc::now();
        let user = User {
            id: self.next_id(),
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        };
        self.users.insert(user.id, user.clone());
        user
    }

    pub fn add_reward(&self, store_id: i64, description: &str, points_required: Decimal) -> Reward {
        let now = Utc::now();
        let reward = Reward {
            id: self.next_id(),
            store_id,
            description: description.to_string(),
            points_required,
            created_at: now,
            updated_at: now,
        };
        self.rewards.insert(reward.id, reward.clone());
        reward
    }

    /// 直接写入活动，不做重叠检查（用于构造历史数据）
    pub fn insert_campaign(&self, campaign: Campaign) {
        self.sequence.fetch_max(campaign.id, Ordering::Relaxed);
        self.campaigns.insert(campaign.id, campaign);
    }

    // ==================== 内部操作 ====================

    fn build_transaction(&self, transaction: &NewTransaction) -> Transaction {
        Transaction {
            id: self.next_id(),
            user_id: transaction.user_id,
            branch_id: transaction.branch_id,
            amount: transaction.amount,
            transaction_date: transaction.transaction_date,
            reward_type: transaction.reward_type,
            points_earned: transaction.points_earned,
            cashback_earned: transaction.cashback_earned,
            created_at: Utc::now(),
        }
    }

    /// 在条目锁内累加余额
    ///
    /// 新余额全部算出且未越界后才执行 `on_applied` 并落盘，失败时不留下任何改动
    fn apply_accrual<T>(
        &self,
        user_id: i64,
        store_id: i64,
        points: Decimal,
        cashback: Decimal,
        on_applied: impl FnOnce() -> T,
    ) -> Result<(T, AccumulatedReward)> {
        let entry = self.ledger.entry((user_id, store_id));
        let mut balance = match &entry {
            Entry::Occupied(occupied) => occupied.get().clone(),
            Entry::Vacant(_) => self.empty_balance(user_id, store_id),
        };

        balance.points_accumulated = add_stored(balance.points_accumulated, points, "积分余额")?;
        balance.cashback_accumulated =
            add_stored(balance.cashback_accumulated, cashback, "返现余额")?;
        balance.updated_at = Utc::now();

        let applied = on_applied();
        entry.insert(balance.clone());

        Ok((applied, balance))
    }

    fn empty_balance(&self, user_id: i64, store_id: i64) -> AccumulatedReward {
        let now = Utc::now();
        AccumulatedReward {
            id: self.next_id(),
            user_id,
            store_id,
            points_accumulated: Decimal::ZERO,
            cashback_accumulated: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 与 NUMERIC(12,2) 列一致的加法，溢出或越界返回 `Validation`
fn add_stored(current: Decimal, delta: Decimal, field: &str) -> Result<Decimal> {
    current
        .checked_add(delta)
        .filter(|value| fits_storage(*value))
        .ok_or_else(|| {
            LoyaltyError::Validation(format!("{}超出可存储范围: {} + {}", field, current, delta))
        })
}

#[async_trait]
impl BranchRepositoryTrait for MemoryStore {
    async fn get_store(&self, id: i64) -> Result<Option<Store>> {
        Ok(self.stores.get(&id).map(|s| s.value().clone()))
    }

    async fn get_branch(&self, id: i64) -> Result<Option<Branch>> {
        Ok(self.branches.get(&id).map(|b| b.value().clone()))
    }

    async fn get_branch_with_store(&self, branch_id: i64) -> Result<Option<BranchWithStore>> {
        let Some(store_id) = self.branches.get(&branch_id).map(|b| b.store_id) else {
            return Ok(None);
        };
        Ok(self.stores.get(&store_id).map(|store| BranchWithStore {
            branch_id,
            store_id,
            conversion_factor: store.conversion_factor,
        }))
    }
}

#[async_trait]
impl CampaignRepositoryTrait for MemoryStore {
    async fn list_by_branch(&self, branch_id: i64) -> Result<Vec<Campaign>> {
        let mut campaigns: Vec<Campaign> = self
            .campaigns
            .iter()
            .filter(|c| c.branch_id == branch_id)
            .map(|c| c.value().clone())
            .collect();
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(campaigns)
    }

    async fn create(&self, campaign: &NewCampaign) -> Result<Campaign> {
        let now = Utc::now();
        let created = Campaign {
            id: self.next_id(),
            name: campaign.name.clone(),
            branch_id: campaign.branch_id,
            campaign_type: campaign.campaign_type,
            percentage: campaign.percentage,
            start_date: campaign.start_date,
            end_date: campaign.end_date,
            created_at: now,
            updated_at: now,
        };
        self.campaigns.insert(created.id, created.clone());
        Ok(created)
    }
}

#[async_trait]
impl TransactionRepositoryTrait for MemoryStore {
    async fn create(&self, transaction: &NewTransaction) -> Result<Transaction> {
        let created = self.build_transaction(transaction);
        self.transactions.insert(created.id, created.clone());
        Ok(created)
    }

    async fn create_with_accrual(
        &self,
        transaction: &NewTransaction,
        store_id: i64,
    ) -> Result<(Transaction, AccumulatedReward)> {
        // 持有余额条目锁期间写入交易，外部观察不到只有一半的状态
        self.apply_accrual(
            transaction.user_id,
            store_id,
            transaction.points_earned,
            transaction.cashback_earned,
            || {
                let created = self.build_transaction(transaction);
                self.transactions.insert(created.id, created.clone());
                created
            },
        )
    }

    fn supports_atomic_accrual(&self) -> bool {
        true
    }

    async fn get(&self, id: i64) -> Result<Option<Transaction>> {
        Ok(self.transactions.get(&id).map(|t| t.value().clone()))
    }

    async fn list_by_user(&self, user_id: i64, limit: i64) -> Result<Vec<Transaction>> {
        let mut rows: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .map(|t| t.value().clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }
}

#[async_trait]
impl LedgerRepositoryTrait for MemoryStore {
    async fn accrue(
        &self,
        user_id: i64,
        store_id: i64,
        points: Decimal,
        cashback: Decimal,
    ) -> Result<AccumulatedReward> {
        self.apply_accrual(user_id, store_id, points, cashback, || ())
            .map(|((), balance)| balance)
    }

    async fn redeem(
        &self,
        user_id: i64,
        store_id: i64,
        points: Decimal,
    ) -> Result<AccumulatedReward> {
        let Some(mut entry) = self.ledger.get_mut(&(user_id, store_id)) else {
            return Err(LoyaltyError::BalanceNotFound { user_id, store_id });
        };

        if entry.points_accumulated < points {
            return Err(LoyaltyError::InsufficientBalance {
                required: points,
                available: entry.points_accumulated,
            });
        }

        entry.points_accumulated -= points;
        entry.updated_at = Utc::now();

        Ok(entry.value().clone())
    }

    async fn get_balance(&self, user_id: i64, store_id: i64) -> Result<Option<AccumulatedReward>> {
        Ok(self
            .ledger
            .get(&(user_id, store_id))
            .map(|r| r.value().clone()))
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<AccumulatedReward>> {
        let mut rows: Vec<AccumulatedReward> = self
            .ledger
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by_key(|r| r.store_id);
        Ok(rows)
    }
}

#[async_trait]
impl RewardRepositoryTrait for MemoryStore {
    async fn get_reward(&self, id: i64) -> Result<Option<Reward>> {
        Ok(self.rewards.get(&id).map(|r| r.value().clone()))
    }

    async fn list_by_store(&self, store_id: i64) -> Result<Vec<Reward>> {
        let mut rows: Vec<Reward> = self
            .rewards
            .iter()
            .filter(|r| r.store_id == store_id)
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by(|a, b| a.points_required.cmp(&b.points_required).then(a.id.cmp(&b.id)));
        Ok(rows)
    }
}

#[async_trait]
impl UserRepositoryTrait for MemoryStore {
    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_redeem_missing_balance() {
        let store = MemoryStore::new();
        let err = LedgerRepositoryTrait::redeem(&store, 1, 1, Decimal::ONE)
            .await
            .unwrap_err();
        assert!(matches!(err, LoyaltyError::BalanceNotFound { .. }));
    }

    #[tokio::test]
    async fn test_redeem_insufficient_keeps_balance() {
        let store = MemoryStore::new();
        store
            .accrue(1, 1, Decimal::from(20), Decimal::ZERO)
            .await
            .unwrap();

        let err = store.redeem(1, 1, Decimal::from(80)).await.unwrap_err();
        assert!(matches!(err, LoyaltyError::InsufficientBalance { .. }));

        let balance = store.get_balance(1, 1).await.unwrap().unwrap();
        assert_eq!(balance.points_accumulated, Decimal::from(20));
    }

    #[tokio::test]
    async fn test_create_with_accrual_updates_both() {
        let store = MemoryStore::new();
        let new_tx = NewTransaction {
            user_id: 7,
            branch_id: 3,
            amount: Decimal::from(100),
            transaction_date: Utc::now(),
            reward_type: crate::models::RewardType::Points,
            points_earned: Decimal::new(15000, 2),
            cashback_earned: Decimal::ZERO,
        };

        let (tx, balance) = store.create_with_accrual(&new_tx, 2).await.unwrap();
        assert_eq!(balance.points_accumulated, Decimal::new(15000, 2));
        assert!(TransactionRepositoryTrait::get(&store, tx.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_campaigns_sorted_newest_first() {
        let store = MemoryStore::new();
        let today = Utc::now().date_naive();
        let new_campaign = NewCampaign {
            name: "first".to_string(),
            branch_id: 1,
            campaign_type: crate::models::CampaignType::Double,
            percentage: Decimal::ZERO,
            start_date: today,
            end_date: today,
        };
        let first = CampaignRepositoryTrait::create(&store, &new_campaign).await.unwrap();
        let second = CampaignRepositoryTrait::create(&store, &new_campaign).await.unwrap();

        let listed = store.list_by_branch(1).await.unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[tokio::test]
    async fn test_accrual_past_storage_limit_keeps_balance() {
        let store = MemoryStore::new();
        let near_limit: Decimal = "9999999999.00".parse().unwrap();
        store.accrue(1, 1, near_limit, Decimal::ZERO).await.unwrap();

        let err = store.accrue(1, 1, Decimal::ONE, Decimal::ZERO).await.unwrap_err();
        assert!(matches!(err, LoyaltyError::Validation(_)));

        let balance = store.get_balance(1, 1).await.unwrap().unwrap();
        assert_eq!(balance.points_accumulated, near_limit);
    }

    #[tokio::test]
    async fn test_overflowing_first_accrual_leaves_no_row() {
        let store = MemoryStore::new();
        let err = store
            .accrue(1, 1, Decimal::MAX, Decimal::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, LoyaltyError::Validation(_)));
        assert!(store.get_balance(1, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejected_accrual_does_not_record_transaction() {
        let store = MemoryStore::new();
        store
            .accrue(7, 2, "9999999990.00".parse().unwrap(), Decimal::ZERO)
            .await
            .unwrap();
        let new_tx = NewTransaction {
            user_id: 7,
            branch_id: 3,
            amount: Decimal::from(100),
            transaction_date: Utc::now(),
            reward_type: crate::models::RewardType::Points,
            points_earned: Decimal::from(100),
            cashback_earned: Decimal::ZERO,
        };

        let err = store.create_with_accrual(&new_tx, 2).await.unwrap_err();
        assert!(matches!(err, LoyaltyError::Validation(_)));
        assert!(TransactionRepositoryTrait::list_by_user(&store, 7, 10).await.unwrap().is_empty());
    }
}
