//! 存储读操作的退避重试
//!
//! 只有瞬时故障（连接池耗尽、连接中断、存储超时）才会重试，
//! 是否可重试由调用方传入的判定函数决定。

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// 退避参数
///
/// 第 n 次重试前等待 `initial_delay * multiplier^n`，不超过 `max_delay`
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 首次执行之外的最多重试次数
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl RetryPolicy {
    /// 请求链路上的存储重试：翻倍退避，单次等待最多 1 秒
    pub fn for_storage(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
            max_delay: Duration::from_secs(1),
            multiplier: 2.0,
        }
    }

    /// 第 `retry` 次重试前的等待时间，`retry` 从 0 起
    pub fn delay_for_attempt(&self, retry: u32) -> Duration {
        let scaled = self.initial_delay.as_millis() as f64 * self.multiplier.powi(retry as i32);
        Duration::from_millis(scaled.min(self.max_delay.as_millis() as f64) as u64)
    }

    /// 已重试 `retries` 次后是否还能再试
    pub fn should_retry(&self, retries: u32) -> bool {
        retries < self.max_retries
    }
}

/// 按策略执行 `operation`
///
/// 不可重试的错误立即返回；次数耗尽时返回最后一次的错误
pub async fn retry_with_policy<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation_name: &str,
    is_retryable: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut retries = 0;

    loop {
        let err = match operation().await {
            Ok(value) => {
                if retries > 0 {
                    debug!(operation = operation_name, retries, "存储操作重试成功");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !is_retryable(&err) {
            return Err(err);
        }
        if !policy.should_retry(retries) {
            warn!(operation = operation_name, retries, error = %err, "存储重试次数耗尽");
            return Err(err);
        }

        let delay = policy.delay_for_attempt(retries);
        warn!(
            operation = operation_name,
            retry = retries + 1,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "存储暂时不可用，稍后重试"
        );
        tokio::time::sleep(delay).await;
        retries += 1;
    }
}
