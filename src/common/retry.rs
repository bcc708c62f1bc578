use std::fmt;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::info;

use crate::common::error::ReposyncError;
use crate::common::result::ReposyncResult;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_MIN_SECONDS: u64 = 10;
pub const DEFAULT_MAX_SECONDS: u64 = 20;

/// リトライ方針
///
/// `min_seconds <= max_seconds` と `max_attempts >= 1` は [`RetryPolicy::new`] でのみ保証されるため、
/// フィールドは公開しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最大試行回数（初回を含む）
    max_attempts: u32,
    /// 待機時間の下限（秒）
    min_seconds: u64,
    /// 待機時間の上限（秒）
    max_seconds: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            min_seconds: DEFAULT_MIN_SECONDS,
            max_seconds: DEFAULT_MAX_SECONDS,
        }
    }
}

impl RetryPolicy {
    /// 新しいRetryPolicyを作成。min > max または試行回数0の場合は設定エラー
    pub fn new(max_attempts: u32, min_seconds: u64, max_seconds: u64) -> ReposyncResult<Self> {
        if min_seconds > max_seconds {
            return Err(ReposyncError::config_error(
                "min seconds should be less than or equal to max seconds",
            ));
        }
        if max_attempts == 0 {
            return Err(ReposyncError::config_error("max attempts must be at least 1"));
        }

        Ok(Self {
            max_attempts,
            min_seconds,
            max_seconds,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn min_seconds(&self) -> u64 {
        self.min_seconds
    }

    pub fn max_seconds(&self) -> u64 {
        self.max_seconds
    }
}

/// Runs a fallible async operation, waiting a uniformly sampled number of
/// seconds between attempts. The last attempt's error is returned untouched.
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub async fn execute<T, E, F, Fut>(&self, mut action: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let mut attempt = 1;
        while attempt < self.policy.max_attempts {
            match action().await {
                Ok(value) => return Ok(value),
                Err(e) => info!("{}", e),
            }

            let seconds = self.sleep_amount();
            info!("Waiting {} seconds before trying again", seconds);
            tokio::time::sleep(Duration::from_secs(seconds)).await;
            attempt += 1;
        }

        // Last attempt
        action().await
    }

    fn sleep_amount(&self) -> u64 {
        rand::thread_rng().gen_range(self.policy.min_seconds..=self.policy.max_seconds)
    }
}
