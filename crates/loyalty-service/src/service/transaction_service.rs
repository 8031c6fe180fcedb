//! 交易记录服务
//!
//! 处理消费交易入账的完整流程：
//!
//! 1. 校验金额 -> 2. 校验用户 -> 3. 查询分店及门店换算系数 -> 4. 解析当日活动
//!    -> 5. 计算积分 -> 6. 写入交易并累加余额
//!
//! 仓储支持原子写入时第 6 步在同一个存储事务内完成；
//! 否则先写交易再累加余额，累加失败时返回 `InconsistentState` 供对账处理。

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{error, info, instrument};
use validator::Validate;

use loyalty_shared::observability::metrics;

use super::balance_ledger::BalanceLedger;
use super::campaign_resolver::CampaignResolver;
use super::dto::{CreateTransactionRequest, CreateTransactionResponse};
use super::reward_calculator::{compute_cashback, compute_points};
use super::store_access::StoreAccess;
use crate::error::{LoyaltyError, Result};
use crate::models::{
    AccumulatedReward, NewTransaction, RewardType, STORED_VALUE_LIMIT, Transaction, fits_storage,
};
use crate::repository::{BranchRepositoryTrait, TransactionRepositoryTrait, UserRepositoryTrait};

/// 金额允许的最大小数位数
const AMOUNT_DECIMAL_PLACES: u32 = 2;

/// 交易记录服务
pub struct TransactionService {
    branch_repo: Arc<dyn BranchRepositoryTrait>,
    transaction_repo: Arc<dyn TransactionRepositoryTrait>,
    user_repo: Arc<dyn UserRepositoryTrait>,
    resolver: Arc<CampaignResolver>,
    ledger: Arc<BalanceLedger>,
    access: StoreAccess,
}

impl TransactionService {
    pub fn new(
        branch_repo: Arc<dyn BranchRepositoryTrait>,
        transaction_repo: Arc<dyn TransactionRepositoryTrait>,
        user_repo: Arc<dyn UserRepositoryTrait>,
        resolver: Arc<CampaignResolver>,
        ledger: Arc<BalanceLedger>,
        access: StoreAccess,
    ) -> Self {
        Self {
            branch_repo,
            transaction_repo,
            user_repo,
            resolver,
            ledger,
            access,
        }
    }

    /// 记录一笔消费交易并累加积分
    #[instrument(
        skip(self, request),
        fields(user_id = request.user_id, branch_id = request.branch_id, amount = %request.amount)
    )]
    pub async fn create_transaction(
        &self,
        request: CreateTransactionRequest,
    ) -> Result<CreateTransactionResponse> {
        let start = Instant::now();
        let result = self.record(request).await;
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok((response, campaign)) => metrics::record_transaction(
                campaign,
                "success",
                decimal_to_f64(response.points_earned),
                elapsed,
            ),
            Err(e) => metrics::record_transaction("none", e.error_code(), 0.0, elapsed),
        }

        result.map(|(response, _)| response)
    }

    async fn record(
        &self,
        request: CreateTransactionRequest,
    ) -> Result<(CreateTransactionResponse, &'static str)> {
        request.validate()?;
        validate_amount(request.amount)?;

        let user = self
            .access
            .read("get_user", || self.user_repo.get_user(request.user_id))
            .await?;
        if user.is_none() {
            return Err(LoyaltyError::UserNotFound(request.user_id));
        }

        let branch = self
            .access
            .read("get_branch_with_store", || {
                self.branch_repo.get_branch_with_store(request.branch_id)
            })
            .await?
            .ok_or(LoyaltyError::BranchNotFound(request.branch_id))?;

        let now = Utc::now();
        let campaign = self
            .resolver
            .active_campaign_for(branch.branch_id, now.date_naive())
            .await?;

        let points = compute_points(request.amount, branch.conversion_factor, campaign.as_ref())?;
        let cashback = compute_cashback(request.amount, campaign.as_ref());

        let new_tx = NewTransaction {
            user_id: request.user_id,
            branch_id: branch.branch_id,
            amount: request.amount,
            transaction_date: now,
            reward_type: RewardType::Points,
            points_earned: points,
            cashback_earned: cashback,
        };

        let (transaction, balance) = self.persist(&new_tx, branch.store_id).await?;

        info!(
            transaction_id = transaction.id,
            store_id = branch.store_id,
            campaign_id = campaign.as_ref().map(|c| c.id),
            points_earned = %points,
            balance = %balance.points_accumulated,
            "交易入账成功"
        );

        let campaign_label = campaign.map_or("none", |c| c.campaign_type.as_str());

        Ok((
            CreateTransactionResponse {
                points_earned: points,
                transaction,
            },
            campaign_label,
        ))
    }

    /// 写入交易并累加余额
    async fn persist(
        &self,
        new_tx: &NewTransaction,
        store_id: i64,
    ) -> Result<(Transaction, AccumulatedReward)> {
        if self.transaction_repo.supports_atomic_accrual() {
            return self
                .access
                .write(
                    "create_transaction_with_accrual",
                    self.transaction_repo.create_with_accrual(new_tx, store_id),
                )
                .await;
        }

        let transaction = self
            .access
            .write("create_transaction", self.transaction_repo.create(new_tx))
            .await?;

        match self
            .ledger
            .accrue(
                new_tx.user_id,
                store_id,
                new_tx.points_earned,
                new_tx.cashback_earned,
            )
            .await
        {
            Ok(balance) => Ok((transaction, balance)),
            Err(e) => {
                error!(
                    transaction_id = transaction.id,
                    user_id = new_tx.user_id,
                    store_id,
                    points = %new_tx.points_earned,
                    error = %e,
                    "交易已写入但积分累加失败，需要对账"
                );
                metrics::record_ledger_inconsistency();
                Err(LoyaltyError::InconsistentState {
                    transaction_id: transaction.id,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// 查询交易
    pub async fn get_transaction(&self, id: i64) -> Result<Transaction> {
        self.access
            .read("get_transaction", || self.transaction_repo.get(id))
            .await?
            .ok_or(LoyaltyError::TransactionNotFound(id))
    }

    /// 列出用户最近的交易
    pub async fn list_user_transactions(&self, user_id: i64, limit: i64) -> Result<Vec<Transaction>> {
        self.access
            .read("list_user_transactions", || {
                self.transaction_repo.list_by_user(user_id, limit)
            })
            .await
    }
}

/// 金额必须大于 0、小于存储上限且最多两位小数
fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(LoyaltyError::Validation(format!(
            "消费金额必须大于 0: {}",
            amount
        )));
    }
    if !fits_storage(amount) {
        return Err(LoyaltyError::Validation(format!(
            "消费金额必须小于 {}: {}",
            STORED_VALUE_LIMIT, amount
        )));
    }
    if amount.normalize().scale() > AMOUNT_DECIMAL_PLACES {
        return Err(LoyaltyError::Validation(format!(
            "消费金额最多两位小数: {}",
            amount
        )));
    }
    Ok(())
}

fn decimal_to_f64(value: Decimal) -> f64 {
    use rust_decimal::prelude::ToPrimitive;
    value.to_f64().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BranchWithStore, User};
    use crate::repository::{
        MockBranchRepositoryTrait, MockCampaignRepositoryTrait, MockLedgerRepositoryTrait,
        MockTransactionRepositoryTrait, MockUserRepositoryTrait,
    };

    fn user(id: i64) -> User {
        let now = Utc::now();
        User {
            id,
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            phone: None,
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn stored(new_tx: &NewTransaction, id: i64) -> Transaction {
        Transaction {
            id,
            user_id: new_tx.user_id,
            branch_id: new_tx.branch_id,
            amount: new_tx.amount,
            transaction_date: new_tx.transaction_date,
            reward_type: new_tx.reward_type,
            points_earned: new_tx.points_earned,
            cashback_earned: new_tx.cashback_earned,
            created_at: Utc::now(),
        }
    }

    struct Mocks {
        branches: MockBranchRepositoryTrait,
        campaigns: MockCampaignRepositoryTrait,
        transactions: MockTransactionRepositoryTrait,
        ledger: MockLedgerRepositoryTrait,
        users: MockUserRepositoryTrait,
    }

    impl Mocks {
        /// 分店 10 属于门店 20，换算系数 1.5，无活动
        fn happy_path() -> Self {
            let mut branches = MockBranchRepositoryTrait::new();
            branches.expect_get_branch_with_store().returning(|id| {
                Ok(Some(BranchWithStore {
                    branch_id: id,
                    store_id: 20,
                    conversion_factor: Decimal::new(15, 1),
                }))
            });
            let mut campaigns = MockCampaignRepositoryTrait::new();
            campaigns.expect_list_by_branch().returning(|_| Ok(Vec::new()));
            let mut users = MockUserRepositoryTrait::new();
            users.expect_get_user().returning(|id| Ok(Some(user(id))));

            Self {
                branches,
                campaigns,
                transactions: MockTransactionRepositoryTrait::new(),
                ledger: MockLedgerRepositoryTrait::new(),
                users,
            }
        }

        fn into_service(self) -> TransactionService {
            let branches: Arc<dyn BranchRepositoryTrait> = Arc::new(self.branches);
            let access = StoreAccess::default();
            let resolver = Arc::new(CampaignResolver::new(
                branches.clone(),
                Arc::new(self.campaigns),
                access.clone(),
            ));
            let ledger = Arc::new(BalanceLedger::new(Arc::new(self.ledger), access.clone()));
            TransactionService::new(
                branches,
                Arc::new(self.transactions),
                Arc::new(self.users),
                resolver,
                ledger,
                access,
            )
        }
    }

    fn request(amount: Decimal) -> CreateTransactionRequest {
        CreateTransactionRequest {
            user_id: 1,
            branch_id: 10,
            amount,
        }
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amount() {
        let service = Mocks::happy_path().into_service();

        for amount in [Decimal::ZERO, Decimal::from(-5)] {
            let err = service.create_transaction(request(amount)).await.unwrap_err();
            assert!(matches!(err, LoyaltyError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn test_rejects_more_than_two_decimals() {
        let service = Mocks::happy_path().into_service();
        let err = service
            .create_transaction(request(Decimal::new(10001, 3)))
            .await
            .unwrap_err();
        assert!(matches!(err, LoyaltyError::Validation(_)));
    }

    #[tokio::test]
    async fn test_rejects_amount_beyond_storage_limit() {
        // 校验先于任何仓储调用，仓储 mock 不设期望
        let service = Mocks::happy_path().into_service();
        let amounts = [
            STORED_VALUE_LIMIT,
            Decimal::from(70_000_000_000_i64),
            "70000000000000000000000000000".parse().unwrap(),
            Decimal::MAX,
        ];

        for amount in amounts {
            let err = service.create_transaction(request(amount)).await.unwrap_err();
            assert!(matches!(err, LoyaltyError::Validation(_)), "{amount}: {err:?}");
        }
    }

    #[tokio::test]
    async fn test_points_beyond_storage_limit_not_persisted() {
        // 9e9 × 1.5 超出积分列范围，不会走到写入
        let service = Mocks::happy_path().into_service();
        let err = service
            .create_transaction(request(Decimal::from(9_000_000_000_i64)))
            .await
            .unwrap_err();
        assert!(matches!(err, LoyaltyError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unknown_branch() {
        let mut mocks = Mocks::happy_path();
        mocks.branches = MockBranchRepositoryTrait::new();
        mocks
            .branches
            .expect_get_branch_with_store()
            .returning(|_| Ok(None));
        let service = mocks.into_service();

        let err = service
            .create_transaction(request(Decimal::from(100)))
            .await
            .unwrap_err();
        assert!(matches!(err, LoyaltyError::BranchNotFound(10)));
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let mut mocks = Mocks::happy_path();
        mocks.users = MockUserRepositoryTrait::new();
        mocks.users.expect_get_user().returning(|_| Ok(None));
        let service = mocks.into_service();

        let err = service
            .create_transaction(request(Decimal::from(100)))
            .await
            .unwrap_err();
        assert!(matches!(err, LoyaltyError::UserNotFound(1)));
    }

    #[tokio::test]
    async fn test_atomic_path_accrues_to_owning_store() {
        let mut mocks = Mocks::happy_path();
        mocks
            .transactions
            .expect_supports_atomic_accrual()
            .return_const(true);
        mocks
            .transactions
            .expect_create_with_accrual()
            .withf(|tx, store_id| *store_id == 20 && tx.points_earned == Decimal::new(15000, 2))
            .times(1)
            .returning(|tx, store_id| {
                let now = Utc::now();
                Ok((
                    stored(tx, 1),
                    AccumulatedReward {
                        id: 1,
                        user_id: tx.user_id,
                        store_id,
                        points_accumulated: tx.points_earned,
                        cashback_accumulated: Decimal::ZERO,
                        created_at: now,
                        updated_at: now,
                    },
                ))
            });
        let service = mocks.into_service();

        let response = service
            .create_transaction(request(Decimal::from(100)))
            .await
            .unwrap();
        assert_eq!(response.points_earned, Decimal::new(15000, 2));
        assert_eq!(response.transaction.reward_type, RewardType::Points);
        assert_eq!(response.transaction.cashback_earned, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_non_atomic_accrual_failure_is_inconsistent_state() {
        let mut mocks = Mocks::happy_path();
        mocks
            .transactions
            .expect_supports_atomic_accrual()
            .return_const(false);
        mocks
            .transactions
            .expect_create()
            .times(1)
            .returning(|tx| Ok(stored(tx, 77)));
        mocks
            .ledger
            .expect_accrue()
            .times(1)
            .returning(|_, _, _, _| Err(LoyaltyError::TransientStoreFailure("pool closed".into())));
        let service = mocks.into_service();

        let err = service
            .create_transaction(request(Decimal::from(100)))
            .await
            .unwrap_err();

        match err {
            LoyaltyError::InconsistentState {
                transaction_id,
                reason,
            } => {
                assert_eq!(transaction_id, 77);
                assert!(reason.contains("pool closed"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_atomic_success() {
        let mut mocks = Mocks::happy_path();
        mocks
            .transactions
            .expect_supports_atomic_accrual()
            .return_const(false);
        mocks
            .transactions
            .expect_create()
            .returning(|tx| Ok(stored(tx, 5)));
        mocks
            .ledger
            .expect_accrue()
            .withf(|user_id, store_id, points, cashback| {
                *user_id == 1
                    && *store_id == 20
                    && *points == Decimal::new(15000, 2)
                    && cashback.is_zero()
            })
            .returning(|user_id, store_id, points, cashback| {
                let now = Utc::now();
                Ok(AccumulatedReward {
                    id: 1,
                    user_id,
                    store_id,
                    points_accumulated: points,
                    cashback_accumulated: cashback,
                    created_at: now,
                    updated_at: now,
                })
            });
        let service = mocks.into_service();

        let response = service
            .create_transaction(request(Decimal::from(100)))
            .await
            .unwrap();
        assert_eq!(response.transaction.id, 5);
    }

    #[tokio::test]
    async fn test_get_transaction_not_found() {
        let mut mocks = Mocks::happy_path();
        mocks.transactions.expect_get().returning(|_| Ok(None));
        let service = mocks.into_service();

        let err = service.get_transaction(42).await.unwrap_err();
        assert!(matches!(err, LoyaltyError::TransactionNotFound(42)));
    }
}
