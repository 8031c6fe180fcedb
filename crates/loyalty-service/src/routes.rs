//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射

use std::time::Duration;

use axum::{
    Router,
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use tower_http::timeout::TimeoutLayer;

use loyalty_shared::observability::middleware as obs_middleware;

use crate::{handlers, state::AppState};

/// 构建 /api/v1 下的业务路由
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // 交易
        .route(
            "/transactions",
            post(handlers::transaction::create_transaction),
        )
        .route(
            "/transactions/{id}",
            get(handlers::transaction::get_transaction),
        )
        .route(
            "/users/{user_id}/transactions",
            get(handlers::transaction::list_user_transactions),
        )
        // 余额
        .route(
            "/users/{user_id}/stores/{store_id}/balance",
            get(handlers::balance::get_balance),
        )
        .route(
            "/users/{user_id}/balances",
            get(handlers::balance::list_balances),
        )
        // 奖励
        .route(
            "/rewards/{reward_id}/claim",
            post(handlers::reward::claim_reward),
        )
        .route(
            "/stores/{store_id}/rewards",
            get(handlers::reward::list_store_rewards),
        )
        // 活动
        .route("/campaigns", post(handlers::campaign::create_campaign))
}

/// 构建完整应用路由（含健康检查和通用中间件）
pub fn app(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        .route("/health", get(handlers::health_check))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state)
}
