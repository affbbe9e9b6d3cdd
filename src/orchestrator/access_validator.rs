// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::credentials::{BrokerError, CredentialBroker};
use crate::scanners::supported;
use crate::utils::retry_policy::{classify_sdk_error, RetryPolicy};

/// 验证结论
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    Ok,
    Denied,
}

/// 账户验证结果
///
/// Denied 携带拒绝原因，编排器据此写入一条服务名为空的
/// 任务失败记录并跳过该账户；Ok 时请求范围已裁剪到
/// 该账户实际可扫描的服务与区域。
#[derive(Debug, Clone)]
pub struct AccountValidation {
    pub validation: Validation,
    pub services_to_scan: Vec<String>,
    pub regions: Vec<String>,
    pub denial_reason: Option<String>,
}

impl AccountValidation {
    pub fn denied(reason: String) -> Self {
        Self {
            validation: Validation::Denied,
            services_to_scan: Vec::new(),
            regions: Vec::new(),
            denial_reason: Some(reason),
        }
    }
}

/// 访问验证器特质
///
/// 幂等、无副作用（凭证代入的内部重试除外）。实现必须把
/// "角色无法代入"与"账户已关闭/暂停"映射为 Denied，
/// 绝不作为编排错误抛出。
#[async_trait]
pub trait AccessValidator: Send + Sync {
    async fn validate(
        &self,
        account_id: &str,
        requested_services: &[String],
        requested_regions: &[String],
    ) -> AccountValidation;
}

/// 调用方账户解析失败，retryable 区分限流与真正的拒绝
struct ResolveFailure {
    message: String,
    retryable: bool,
}

/// 基于 STS 的访问验证器
///
/// 通过凭证代理代入目标账户的验证角色，并核对解析出的
/// 调用方账户与目标账户一致。瞬态失败（限流、网络抖动）按
/// 退避策略重试，预算耗尽才降级为 Denied；"角色无法代入"
/// 一类的最终裁定不消耗重试预算。
pub struct StsAccessValidator {
    broker: Arc<dyn CredentialBroker>,
    retry_policy: RetryPolicy,
}

impl StsAccessValidator {
    pub fn new(broker: Arc<dyn CredentialBroker>, retry_policy: RetryPolicy) -> Self {
        Self {
            broker,
            retry_policy,
        }
    }

    async fn obtain_credentials(
        &self,
        account_id: &str,
    ) -> Result<crate::credentials::AccountCredentials, BrokerError> {
        let mut attempt: u32 = 0;
        loop {
            match self.broker.credentials_for_validation(account_id).await {
                Ok(credentials) => return Ok(credentials),
                Err(err) if err.is_transient() => {
                    attempt += 1;
                    if !self.retry_policy.should_retry(attempt) {
                        return Err(err);
                    }
                    let backoff = self.retry_policy.calculate_backoff(attempt);
                    warn!(
                        account_id,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "Transient validation failure, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn resolve_caller_account(
        &self,
        credentials: &crate::credentials::AccountCredentials,
    ) -> Result<String, ResolveFailure> {
        let config = aws_sdk_sts::Config::builder()
            .behavior_version(aws_sdk_sts::config::BehaviorVersion::latest())
            .credentials_provider(aws_sdk_sts::config::Credentials::new(
                credentials.access_key_id.clone(),
                credentials.secret_access_key.clone(),
                Some(credentials.session_token.clone()),
                None,
                "orgscan-validation",
            ))
            .build();
        let client = aws_sdk_sts::Client::from_conf(config);

        let identity = client
            .get_caller_identity()
            .send()
            .await
            .map_err(|err| {
                let (message, retryable) = classify_sdk_error(&err);
                ResolveFailure { message, retryable }
            })?;
        identity
            .account()
            .map(|account| account.to_string())
            .ok_or_else(|| ResolveFailure {
                message: "GetCallerIdentity returned no account".to_string(),
                retryable: false,
            })
    }

    async fn check_caller_account(
        &self,
        account_id: &str,
        credentials: &crate::credentials::AccountCredentials,
    ) -> Result<String, ResolveFailure> {
        let mut attempt: u32 = 0;
        loop {
            match self.resolve_caller_account(credentials).await {
                Ok(resolved) => return Ok(resolved),
                Err(failure) if failure.retryable => {
                    attempt += 1;
                    if !self.retry_policy.should_retry(attempt) {
                        return Err(failure);
                    }
                    let backoff = self.retry_policy.calculate_backoff(attempt);
                    warn!(
                        account_id,
                        attempt,
                        error = %failure.message,
                        "Transient caller identity failure, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(failure) => return Err(failure),
            }
        }
    }
}

#[async_trait]
impl AccessValidator for StsAccessValidator {
    async fn validate(
        &self,
        account_id: &str,
        requested_services: &[String],
        requested_regions: &[String],
    ) -> AccountValidation {
        let credentials = match self.obtain_credentials(account_id).await {
            Ok(credentials) => credentials,
            Err(err) => {
                warn!(account_id, error = %err, "Account access validation failed");
                return AccountValidation::denied(format!(
                    "Access Validation Failed: Unable to assume role in this account. {err}"
                ));
            }
        };

        match self.check_caller_account(account_id, &credentials).await {
            Ok(resolved) if resolved == account_id => {
                info!(account_id, "Account IDs matched, validation successful");
                AccountValidation {
                    validation: Validation::Ok,
                    services_to_scan: supported::narrow_services(Some(requested_services)),
                    regions: supported::narrow_regions(Some(requested_regions)),
                    denial_reason: None,
                }
            }
            Ok(resolved) => {
                warn!(account_id, resolved, "Caller account mismatch, skipping account");
                AccountValidation::denied(
                    "Access Validation Failed: Unable to assume role in this account.".to_string(),
                )
            }
            Err(failure) => {
                warn!(account_id, error = %failure.message, "Caller identity resolution failed");
                AccountValidation::denied(failure.message)
            }
        }
    }
}
