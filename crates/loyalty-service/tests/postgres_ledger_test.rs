//! PostgreSQL 仓储集成测试
//!
//! 需要可用的测试数据库（TEST_DATABASE_URL），默认忽略：
//! cargo test -p loyalty-service --test postgres_ledger_test -- --ignored

use std::path::PathBuf;

use futures::future::join_all;
use rust_decimal::Decimal;
use sqlx::PgPool;

use loyalty_service::service::{CreateTransactionRequest, StoreAccess};
use loyalty_service::{AppState, LoyaltyError, Repositories};
use loyalty_shared::test_utils::{connect_test_database, unique_suffix};

fn d(s: &str) -> Decimal {
    s.parse().expect("invalid decimal literal")
}

struct Seeded {
    store_id: i64,
    branch_id: i64,
    user_id: i64,
    reward_id: i64,
}

async fn setup() -> (PgPool, Seeded) {
    let migrations = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let db = connect_test_database(&migrations)
        .await
        .expect("test database unavailable");
    let pool = db.pool().clone();
    let suffix = unique_suffix();

    let store_id: i64 = sqlx::query_scalar(
        "INSERT INTO stores (name, conversion_factor) VALUES ($1, $2) RETURNING id",
    )
    .bind(format!("store-{}", suffix))
    .bind(d("1.5"))
    .fetch_one(&pool)
    .await
    .unwrap();

    let branch_id: i64 =
        sqlx::query_scalar("INSERT INTO branches (store_id, name) VALUES ($1, $2) RETURNING id")
            .bind(store_id)
            .bind(format!("branch-{}", suffix))
            .fetch_one(&pool)
            .await
            .unwrap();

    let user_id: i64 = sqlx::query_scalar(
        "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, 'x') RETURNING id",
    )
    .bind("Ana")
    .bind(format!("{}@example.com", suffix))
    .fetch_one(&pool)
    .await
    .unwrap();

    let reward_id: i64 = sqlx::query_scalar(
        "INSERT INTO rewards (store_id, description, points_required) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(store_id)
    .bind(format!("reward-{}", suffix))
    .bind(d("100"))
    .fetch_one(&pool)
    .await
    .unwrap();

    (
        pool,
        Seeded {
            store_id,
            branch_id,
            user_id,
            reward_id,
        },
    )
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_transaction_persists_with_balance() {
    let (pool, seeded) = setup().await;
    let state = AppState::new(Repositories::postgres(pool), StoreAccess::default());

    let first = state
        .transaction_service
        .create_transaction(CreateTransactionRequest {
            user_id: seeded.user_id,
            branch_id: seeded.branch_id,
            amount: d("100"),
        })
        .await
        .unwrap();
    assert_eq!(first.points_earned, d("150"));

    state
        .transaction_service
        .create_transaction(CreateTransactionRequest {
            user_id: seeded.user_id,
            branch_id: seeded.branch_id,
            amount: d("0.33"),
        })
        .await
        .unwrap();

    let balance = state
        .ledger
        .get_balance(seeded.user_id, seeded.store_id)
        .await
        .unwrap();
    assert_eq!(balance.points_accumulated, d("150.50"));

    let fetched = state
        .transaction_service
        .get_transaction(first.transaction.id)
        .await
        .unwrap();
    assert_eq!(fetched.amount, d("100.00"));
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_conditional_redeem() {
    let (pool, seeded) = setup().await;
    let state = AppState::new(Repositories::postgres(pool), StoreAccess::default());

    let err = state
        .claim_service
        .claim_reward(seeded.user_id, seeded.store_id, seeded.reward_id)
        .await
        .unwrap_err();
    assert!(matches!(err, LoyaltyError::BalanceNotFound { .. }));

    state
        .ledger
        .accrue(seeded.user_id, seeded.store_id, d("150"), Decimal::ZERO)
        .await
        .unwrap();

    let confirmation = state
        .claim_service
        .claim_reward(seeded.user_id, seeded.store_id, seeded.reward_id)
        .await
        .unwrap();
    assert_eq!(confirmation.points_remaining, d("50"));

    let err = state
        .claim_service
        .claim_reward(seeded.user_id, seeded.store_id, seeded.reward_id)
        .await
        .unwrap_err();
    assert!(matches!(err, LoyaltyError::InsufficientBalance { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // 需要数据库连接
async fn test_concurrent_accruals_are_serialized() {
    let (pool, seeded) = setup().await;
    let state = AppState::new(Repositories::postgres(pool), StoreAccess::default());
    let (user_id, store_id) = (seeded.user_id, seeded.store_id);

    let tasks = (0..50).map(|_| {
        let ledger = state.ledger.clone();
        async move { ledger.accrue(user_id, store_id, d("1.10"), Decimal::ZERO).await }
    });

    for result in join_all(tasks).await {
        result.unwrap();
    }

    let balance = state.ledger.get_balance(user_id, store_id).await.unwrap();
    assert_eq!(balance.points_accumulated, d("55.00"));
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_values_beyond_numeric_column_are_validation_errors() {
    let (pool, seeded) = setup().await;
    let state = AppState::new(Repositories::postgres(pool), StoreAccess::default());

    state
        .ledger
        .accrue(seeded.user_id, seeded.store_id, d("9999999999"), Decimal::ZERO)
        .await
        .unwrap();

    let err = state
        .ledger
        .accrue(seeded.user_id, seeded.store_id, d("1"), Decimal::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(err, LoyaltyError::Validation(_)));

    let balance = state
        .ledger
        .get_balance(seeded.user_id, seeded.store_id)
        .await
        .unwrap();
    assert_eq!(balance.points_accumulated, d("9999999999.00"));

    let err = state
        .transaction_service
        .create_transaction(CreateTransactionRequest {
            user_id: seeded.user_id,
            branch_id: seeded.branch_id,
            amount: d("10000000000"),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, LoyaltyError::Validation(_)));
}
