//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。

use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::{InfraError, Result};

/// Metrics 资源守卫
pub struct MetricsHandle {
    _server_handle: tokio::task::JoinHandle<()>,
}

/// 初始化 Prometheus 指标导出
///
/// 启动一个独立的 HTTP 服务器在指定端口暴露 `/metrics` 端点。
pub async fn init(service_name: &str, port: u16) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| InfraError::Observability(e.to_string()))?;

    register_common_metrics(service_name);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let server_handle = start_metrics_server(addr, handle).await?;

    Ok(MetricsHandle {
        _server_handle: server_handle,
    })
}

/// 注册通用指标描述
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!("http_requests_total", "Total number of HTTP requests");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );

    metrics::describe_counter!(
        "loyalty_transactions_total",
        "Total number of purchase transactions recorded"
    );
    metrics::describe_histogram!(
        "loyalty_transaction_duration_seconds",
        "Transaction recording duration in seconds"
    );
    metrics::describe_counter!(
        "loyalty_points_earned_total",
        "Total points credited to balances"
    );

    metrics::describe_counter!("loyalty_claims_total", "Total number of reward claims");
    metrics::describe_histogram!(
        "loyalty_claim_duration_seconds",
        "Reward claim duration in seconds"
    );

    metrics::describe_counter!(
        "ledger_inconsistencies_total",
        "Transactions persisted without a matching ledger accrual"
    );
    metrics::describe_counter!(
        "storage_timeouts_total",
        "Storage operations that exceeded the configured timeout"
    );

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

/// 启动指标 HTTP 服务器
async fn start_metrics_server(
    addr: SocketAddr,
    handle: PrometheusHandle,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(handle.render())))
        .route("/health", get(|| async { "OK" }));

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| InfraError::Observability(format!("bind {}: {}", addr, e)))?;
    info!("Metrics server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(server_handle)
}

// ============================================================================
// 业务指标记录函数
// ============================================================================

/// 记录 HTTP 请求
#[inline]
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str.clone()
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str
    )
    .record(duration_secs);
}

/// 记录交易入账
///
/// `campaign` 为生效的活动类型，无活动时传 "none"
#[inline]
pub fn record_transaction(campaign: &str, status: &str, points: f64, duration_secs: f64) {
    metrics::counter!(
        "loyalty_transactions_total",
        "campaign" => campaign.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "loyalty_transaction_duration_seconds",
        "status" => status.to_string()
    )
    .record(duration_secs);

    if points > 0.0 {
        // counter 只接受整数，按分（0.01 积分）累计
        metrics::counter!("loyalty_points_earned_total").increment((points * 100.0).round() as u64);
    }
}

/// 记录奖励兑换
#[inline]
pub fn record_claim(store_id: i64, status: &str, duration_secs: f64) {
    metrics::counter!(
        "loyalty_claims_total",
        "store_id" => store_id.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "loyalty_claim_duration_seconds",
        "status" => status.to_string()
    )
    .record(duration_secs);
}

/// 记录账本不一致（交易已落库但余额未累加）
#[inline]
pub fn record_ledger_inconsistency() {
    metrics::counter!("ledger_inconsistencies_total").increment(1);
}

/// 记录存储操作超时
#[inline]
pub fn record_storage_timeout(operation: &str) {
    metrics::counter!("storage_timeouts_total", "operation" => operation.to_string()).increment(1);
}
