// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;

/// 重试策略配置
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大重试次数
    pub max_retries: u32,
    /// 初始退避时间
    pub initial_backoff: Duration,
    /// 最大退避时间
    pub max_backoff: Duration,
    /// 退避乘数
    pub backoff_multiplier: f64,
    /// 抖动因子 (0.0-1.0)
    pub jitter_factor: f64,
    /// 是否启用指数退避
    pub exponential_backoff: bool,
    /// 是否启用抖动
    pub enable_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
            exponential_backoff: true,
            enable_jitter: true,
        }
    }
}

impl RetryPolicy {
    /// 创建标准重试策略
    pub fn standard() -> Self {
        Self::default()
    }

    /// 按配置构造重试策略
    pub fn with_limits(max_retries: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
            max_backoff,
            ..Self::default()
        }
    }

    /// 计算下次重试的退避时间
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        if !self.exponential_backoff {
            return self.initial_backoff;
        }

        // 计算指数退避
        let backoff_secs =
            self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32 - 1);

        // 限制最大退避时间
        let capped_backoff = backoff_secs.min(self.max_backoff.as_secs_f64());

        // 添加抖动
        let final_backoff = if self.enable_jitter {
            let jitter_range = capped_backoff * self.jitter_factor;
            let jitter = rand::random_range(-jitter_range..jitter_range);
            (capped_backoff + jitter).max(0.0)
        } else {
            capped_backoff
        };

        Duration::from_secs_f64(final_backoff)
    }

    /// 是否应该重试
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

/// 判断错误是否为瞬态基础设施错误
///
/// 只有瞬态错误消耗重试预算；业务级失败由执行器内部捕获并
/// 作为结构化结果返回，编排器永远不会重试它们。
pub fn is_retryable_error(error: &str) -> bool {
    let error_string = error.to_lowercase();

    // 云服务端限流与网络抖动可重试
    let retryable_patterns = [
        "throttling",
        "throttlingexception",
        "rate exceeded",
        "too many requests",
        "requestlimitexceeded",
        "timeout",
        "timed out",
        "connection reset",
        "connection refused",
        "service unavailable",
        "serviceunavailable",
        "internalfailure",
        "internalerror",
        "slowdown",
        "network is unreachable",
        "broken pipe",
        "dispatch failure",
        "connector error",
    ];

    retryable_patterns.iter().any(|&p| error_string.contains(p))
}

/// 展开 SDK 错误并分类
///
/// SdkError 的 Display 只有最外层的固定文案（如 "service error"），
/// 错误码和服务端消息在错误链里。分类优先看服务端错误码，
/// 没有错误码的失败来自传输层，按完整错误链的文案判断。
pub fn classify_sdk_error<E>(err: &E) -> (String, bool)
where
    E: std::error::Error + ProvideErrorMetadata,
{
    let message = DisplayErrorContext(err).to_string();
    let retryable = match err.code() {
        Some(code) => is_retryable_error(code),
        None => is_retryable_error(&message),
    };
    (message, retryable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_backoff_exponential() {
        let mut policy = RetryPolicy::standard();
        policy.enable_jitter = false; // 禁用抖动以获得精确值

        assert_eq!(policy.calculate_backoff(1), Duration::from_secs(1));
        assert_eq!(policy.calculate_backoff(2), Duration::from_secs(2)); // 1 * 2^1
        assert_eq!(policy.calculate_backoff(3), Duration::from_secs(4)); // 1 * 2^2
    }

    #[test]
    fn test_calculate_backoff_max_limit() {
        let mut policy = RetryPolicy::standard();
        policy.max_backoff = Duration::from_secs(5);
        policy.enable_jitter = false;

        let backoff = policy.calculate_backoff(10);
        assert_eq!(backoff, Duration::from_secs(5)); // 被限制在最大值
    }

    #[test]
    fn test_calculate_backoff_with_jitter() {
        let mut policy = RetryPolicy::standard();
        policy.enable_jitter = true;
        policy.jitter_factor = 0.1;

        let backoff = policy.calculate_backoff(2);
        let expected = Duration::from_secs(2);
        let jitter_range = Duration::from_millis(200); // 10% of 2s

        assert!(backoff >= expected - jitter_range);
        assert!(backoff <= expected + jitter_range);
    }

    #[test]
    fn test_should_retry() {
        let policy = RetryPolicy::standard();

        assert!(policy.should_retry(0));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3)); // max_retries = 3
        assert!(!policy.should_retry(4));
    }

    #[test]
    fn test_retryable_error_classification() {
        assert!(is_retryable_error("ThrottlingException: Rate exceeded"));
        assert!(is_retryable_error("request timed out"));
        assert!(is_retryable_error("503 Service Unavailable"));
        assert!(!is_retryable_error("AccessDeniedException: not authorized"));
        assert!(!is_retryable_error("ValidationError: bad input"));
    }

    #[test]
    fn test_throttled_sdk_error_classified_by_code_not_display() {
        // AssumeRole 被限流：限流信息只在错误码里，外层 Display 看不到
        let throttled = aws_sdk_sts::operation::assume_role::AssumeRoleError::generic(
            aws_smithy_types::error::ErrorMetadata::builder()
                .code("ThrottlingException")
                .message("Rate exceeded")
                .build(),
        );
        let (message, retryable) = classify_sdk_error(&throttled);
        assert!(retryable);
        assert!(message.contains("ThrottlingException"));

        let denied = aws_sdk_sts::operation::assume_role::AssumeRoleError::generic(
            aws_smithy_types::error::ErrorMetadata::builder()
                .code("AccessDenied")
                .message("User is not authorized to perform sts:AssumeRole")
                .build(),
        );
        let (message, retryable) = classify_sdk_error(&denied);
        assert!(!retryable);
        assert!(message.contains("AccessDenied"));
    }

    #[test]
    fn test_s3_slow_down_code_is_retryable() {
        let slow_down = aws_sdk_s3::operation::list_buckets::ListBucketsError::generic(
            aws_smithy_types::error::ErrorMetadata::builder()
                .code("SlowDown")
                .message("Please reduce your request rate.")
                .build(),
        );
        let (_, retryable) = classify_sdk_error(&slow_down);
        assert!(retryable);
    }
}
