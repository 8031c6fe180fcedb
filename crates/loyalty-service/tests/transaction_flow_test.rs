//! 交易入账与兑换流程测试
//!
//! 基于进程内仓储跑通完整业务流程：交易 -> 活动解析 -> 积分计算 -> 余额累加 -> 兑换扣减

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;

use loyalty_service::service::{
    CampaignResolver, CreateCampaignRequest, CreateTransactionRequest, StoreAccess,
};
use loyalty_service::{
    AppState, Campaign, CampaignType, LoyaltyError, MemoryStore, Repositories,
};

// ==================== 辅助函数 ====================

fn d(s: &str) -> Decimal {
    s.parse().expect("invalid decimal literal")
}

/// 测试夹具：一个门店、一个分店、一个用户
struct Fixture {
    memory: Arc<MemoryStore>,
    state: AppState,
    store_id: i64,
    branch_id: i64,
    user_id: i64,
}

impl Fixture {
    fn new(conversion_factor: &str) -> Self {
        let memory = Arc::new(MemoryStore::new());
        let store = memory.add_store("Leal Coffee", d(conversion_factor));
        let branch = memory.add_branch(store.id, "Centro");
        let user = memory.add_user("Ana", "ana@example.com");
        let state = AppState::new(Repositories::memory(memory.clone()), StoreAccess::default());

        Self {
            memory,
            state,
            store_id: store.id,
            branch_id: branch.id,
            user_id: user.id,
        }
    }

    /// 创建覆盖今天的活动
    async fn campaign_today(&self, campaign_type: CampaignType) -> Campaign {
        let today = Utc::now().date_naive();
        self.state
            .campaign_service
            .create_campaign(CreateCampaignRequest {
                name: "Today".to_string(),
                branch_id: self.branch_id,
                campaign_type,
                percentage: d("30"),
                start_date: today - Duration::days(1),
                end_date: today + Duration::days(1),
            })
            .await
            .expect("create campaign")
    }

    async fn purchase(&self, amount: &str) -> Result<Decimal, LoyaltyError> {
        self.state
            .transaction_service
            .create_transaction(CreateTransactionRequest {
                user_id: self.user_id,
                branch_id: self.branch_id,
                amount: d(amount),
            })
            .await
            .map(|r| r.points_earned)
    }

    async fn points(&self) -> Decimal {
        self.state
            .ledger
            .get_balance(self.user_id, self.store_id)
            .await
            .expect("balance")
            .points_accumulated
    }
}

// ==================== 场景测试 ====================

#[tokio::test]
async fn test_scenario_a_base_points_with_conversion_factor() {
    let fx = Fixture::new("1.5");

    let earned = fx.purchase("100").await.unwrap();

    assert_eq!(earned, d("150.00"));
    assert_eq!(fx.points().await, d("150.00"));
}

#[tokio::test]
async fn test_scenario_b_double_campaign() {
    let fx = Fixture::new("1.0");
    fx.campaign_today(CampaignType::Double).await;

    let earned = fx.purchase("50").await.unwrap();

    assert_eq!(earned, d("100.00"));
    assert_eq!(fx.points().await, d("100.00"));
}

#[tokio::test]
async fn test_scenario_c_additional_campaign_threshold() {
    let fx = Fixture::new("1.0");
    fx.campaign_today(CampaignType::Additional).await;

    assert_eq!(fx.purchase("25000").await.unwrap(), d("32500.00"));
    assert_eq!(fx.purchase("15000").await.unwrap(), d("15000.00"));
    assert_eq!(fx.points().await, d("47500.00"));
}

#[tokio::test]
async fn test_scenario_d_claim_then_insufficient() {
    let fx = Fixture::new("1.0");
    let reward = fx.memory.add_reward(fx.store_id, "Free coffee", d("80"));
    fx.purchase("100").await.unwrap();

    let confirmation = fx
        .state
        .claim_service
        .claim_reward(fx.user_id, fx.store_id, reward.id)
        .await
        .unwrap();
    assert_eq!(confirmation.description, "Free coffee");
    assert_eq!(confirmation.points_remaining, d("20"));

    let err = fx
        .state
        .claim_service
        .claim_reward(fx.user_id, fx.store_id, reward.id)
        .await
        .unwrap_err();
    assert!(matches!(err, LoyaltyError::InsufficientBalance { .. }));
    assert_eq!(fx.points().await, d("20"));
}

// ==================== 边界场景 ====================

#[tokio::test]
async fn test_expired_campaign_is_ignored() {
    let fx = Fixture::new("1.0");
    let now = Utc::now();
    let today = now.date_naive();
    fx.memory.insert_campaign(Campaign {
        id: 1_000,
        name: "Last month".to_string(),
        branch_id: fx.branch_id,
        campaign_type: CampaignType::Double,
        percentage: Decimal::ZERO,
        start_date: today - Duration::days(30),
        end_date: today - Duration::days(1),
        created_at: now,
        updated_at: now,
    });

    assert_eq!(fx.purchase("50").await.unwrap(), d("50.00"));
}

#[tokio::test]
async fn test_overlapping_legacy_campaigns_use_newest() {
    let fx = Fixture::new("1.0");
    let now = Utc::now();
    let today = now.date_naive();
    let window = |id: i64, campaign_type, age: i64| Campaign {
        id,
        name: format!("legacy-{}", id),
        branch_id: fx.branch_id,
        campaign_type,
        percentage: Decimal::ZERO,
        start_date: today - Duration::days(5),
        end_date: today + Duration::days(5),
        created_at: now - Duration::days(age),
        updated_at: now - Duration::days(age),
    };
    fx.memory.insert_campaign(window(2_000, CampaignType::Additional, 10));
    fx.memory.insert_campaign(window(2_001, CampaignType::Double, 1));

    assert_eq!(fx.purchase("100").await.unwrap(), d("200.00"));
}

#[tokio::test]
async fn test_resolver_window_boundaries() {
    let fx = Fixture::new("1.0");
    fx.state
        .campaign_service
        .create_campaign(CreateCampaignRequest {
            name: "May".to_string(),
            branch_id: fx.branch_id,
            campaign_type: CampaignType::Double,
            percentage: Decimal::ZERO,
            start_date: NaiveDate::from_ymd_opt(2024, 5, 15).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 5, 30).unwrap(),
        })
        .await
        .unwrap();

    let repos = Repositories::memory(fx.memory.clone());
    let resolver = CampaignResolver::new(repos.branches, repos.campaigns, StoreAccess::default());

    let on = |day| NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
    assert!(resolver.find_active_campaign(fx.branch_id, on(20)).await.unwrap().is_some());
    assert!(resolver.find_active_campaign(fx.branch_id, on(14)).await.unwrap().is_none());
    assert!(resolver.find_active_campaign(fx.branch_id, on(31)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_unknown_branch_records_nothing() {
    let fx = Fixture::new("1.0");

    let err = fx
        .state
        .transaction_service
        .create_transaction(CreateTransactionRequest {
            user_id: fx.user_id,
            branch_id: 9_999,
            amount: d("10"),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, LoyaltyError::BranchNotFound(9_999)));
    let history = fx
        .state
        .transaction_service
        .list_user_transactions(fx.user_id, 10)
        .await
        .unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_transaction_history_and_lookup() {
    let fx = Fixture::new("1.0");
    fx.purchase("10").await.unwrap();
    fx.purchase("20").await.unwrap();
    fx.purchase("30").await.unwrap();

    let history = fx
        .state
        .transaction_service
        .list_user_transactions(fx.user_id, 2)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);

    let fetched = fx
        .state
        .transaction_service
        .get_transaction(history[0].id)
        .await
        .unwrap();
    assert_eq!(fetched, history[0]);
}

#[tokio::test]
async fn test_oversized_amount_rejected_inside_spawned_task() {
    let fx = Fixture::new("1.5");
    let service = fx.state.transaction_service.clone();
    let user_id = fx.user_id;
    let branch_id = fx.branch_id;

    // 7e28 * 1.5 超出 Decimal 表示范围，任务不能 panic
    let joined = tokio::spawn(async move {
        service
            .create_transaction(CreateTransactionRequest {
                user_id,
                branch_id,
                amount: d("70000000000000000000000000000"),
            })
            .await
    })
    .await;

    let err = joined.expect("task must not panic").unwrap_err();
    assert!(matches!(err, LoyaltyError::Validation(_)));
    assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_balance_total_capped_at_storage_limit() {
    let fx = Fixture::new("1.0");

    assert_eq!(fx.purchase("9999999999").await.unwrap(), d("9999999999.00"));

    let err = fx.purchase("1").await.unwrap_err();
    assert!(matches!(err, LoyaltyError::Validation(_)));
    assert_eq!(fx.points().await, d("9999999999.00"));

    let history = fx
        .state
        .transaction_service
        .list_user_transactions(fx.user_id, 10)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}
