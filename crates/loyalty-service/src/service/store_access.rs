//! 存储访问包装
//!
//! 所有仓储调用都经由此处：单次调用受超时约束，超时视为瞬时故障。
//! 只读操作按重试策略自动重试，写操作不重试（超时的写入可能已提交）。

use std::future::Future;
use std::time::Duration;

use loyalty_shared::config::StorageConfig;
use loyalty_shared::observability::metrics;
use loyalty_shared::retry::{RetryPolicy, retry_with_policy};
use tracing::warn;

use crate::error::{LoyaltyError, Result};

/// 存储访问包装
#[derive(Debug, Clone)]
pub struct StoreAccess {
    timeout: Duration,
    retry_policy: RetryPolicy,
}

impl StoreAccess {
    pub fn new(timeout: Duration, retry_policy: RetryPolicy) -> Self {
        Self {
            timeout,
            retry_policy,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(
            config.operation_timeout(),
            RetryPolicy::for_storage(config.max_retries, config.retry_initial_delay()),
        )
    }

    /// 执行只读操作，瞬时故障按策略重试
    pub async fn read<T, F, Fut>(&self, operation: &'static str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        retry_with_policy(
            &self.retry_policy,
            operation,
            LoyaltyError::is_retryable,
            || self.bounded(operation, op()),
        )
        .await
    }

    /// 执行写操作，只施加超时
    pub async fn write<T, Fut>(&self, operation: &'static str, fut: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        self.bounded(operation, fut).await
    }

    async fn bounded<T, Fut>(&self, operation: &'static str, fut: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "存储操作超时"
                );
                metrics::record_storage_timeout(operation);
                Err(LoyaltyError::TransientStoreFailure(format!(
                    "{} 超时 ({}ms)",
                    operation,
                    self.timeout.as_millis()
                )))
            }
        }
    }
}

impl Default for StoreAccess {
    fn default() -> Self {
        Self::from_config(&StorageConfig::default())
    }
}
