// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::utils::retry_policy::classify_sdk_error;

/// 凭证能力枚举
///
/// 每种能力对应一个单一用途的跨账户角色。能力之间不共享凭证，
/// 任何一种都不携带写权限。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// 账户访问验证
    ValidateAccess,
    /// 扇出扫描目标账户资源
    ScanSpokeResources,
    /// 按需单账户扫描
    ScanSingleAccount,
}

impl Capability {
    /// 该能力使用的会话名
    pub fn session_name(&self) -> &'static str {
        match self {
            Capability::ValidateAccess => "orgscan-validation",
            Capability::ScanSpokeResources => "orgscan-scan",
            Capability::ScanSingleAccount => "orgscan-single-account",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Capability::ValidateAccess => write!(f, "ValidateAccess"),
            Capability::ScanSpokeResources => write!(f, "ScanSpokeResources"),
            Capability::ScanSingleAccount => write!(f, "ScanSingleAccount"),
        }
    }
}

/// 限时账户凭证
///
/// 由凭证代理签发的目标账户只读凭证，到期自动失效。
#[derive(Debug, Clone)]
pub struct AccountCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime<Utc>,
}

/// 能力信任表
///
/// 显式枚举哪些主体可以请求哪种能力。不在表中的组合一律拒绝，
/// 没有隐式授权。
#[derive(Debug, Clone, Default)]
pub struct TrustList {
    entries: HashMap<Capability, Vec<String>>,
}

impl TrustList {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为某能力追加一个可信主体
    pub fn allow(mut self, capability: Capability, principal: &str) -> Self {
        self.entries
            .entry(capability)
            .or_default()
            .push(principal.to_string());
        self
    }

    /// 判断主体是否可以请求该能力
    pub fn is_allowed(&self, capability: Capability, principal: &str) -> bool {
        self.entries
            .get(&capability)
            .map(|principals| principals.iter().any(|p| p == principal))
            .unwrap_or(false)
    }
}

/// 凭证代理错误类型
#[derive(Error, Debug)]
pub enum BrokerError {
    /// 主体不在该能力的信任表中
    #[error("Principal {principal} is not trusted for capability {capability}")]
    NotTrusted {
        capability: Capability,
        principal: String,
    },
    /// 角色代入失败（角色不存在、账户已关闭、限流等）
    #[error("Failed to assume role in account {account_id}: {message}")]
    AssumeRole {
        account_id: String,
        message: String,
        retryable: bool,
    },
}

impl BrokerError {
    /// 瞬态失败可按退避策略重试；其余一律视为该账户不可达
    pub fn is_transient(&self) -> bool {
        matches!(self, BrokerError::AssumeRole { retryable: true, .. })
    }
}

/// 凭证代理特质
///
/// 每种能力一个方法，各自返回限时、最小权限的目标账户凭证。
/// 实现必须在签发前检查能力信任表。
#[async_trait]
pub trait CredentialBroker: Send + Sync {
    /// 签发账户访问验证凭证
    async fn credentials_for_validation(
        &self,
        account_id: &str,
    ) -> Result<AccountCredentials, BrokerError>;
    /// 签发扇出扫描凭证
    async fn credentials_for_scan(
        &self,
        account_id: &str,
    ) -> Result<AccountCredentials, BrokerError>;
    /// 签发单账户按需扫描凭证
    async fn credentials_for_single_account_scan(
        &self,
        account_id: &str,
    ) -> Result<AccountCredentials, BrokerError>;
}

/// 基于 STS 的凭证代理实现
///
/// 以服务自身的主体身份按能力代入目标账户中的 spoke 角色。
/// 凭证有效期固定为 900 秒。
pub struct StsCredentialBroker {
    client: aws_sdk_sts::Client,
    spoke_role_name: String,
    partition: String,
    principal_arn: String,
    trust_list: TrustList,
}

const SESSION_DURATION_SECONDS: i32 = 900;

impl StsCredentialBroker {
    pub fn new(
        client: aws_sdk_sts::Client,
        spoke_role_name: String,
        partition: String,
        principal_arn: String,
        trust_list: TrustList,
    ) -> Self {
        Self {
            client,
            spoke_role_name,
            partition,
            principal_arn,
            trust_list,
        }
    }

    async fn assume_spoke_role(
        &self,
        capability: Capability,
        account_id: &str,
    ) -> Result<AccountCredentials, BrokerError> {
        if !self.trust_list.is_allowed(capability, &self.principal_arn) {
            return Err(BrokerError::NotTrusted {
                capability,
                principal: self.principal_arn.clone(),
            });
        }

        let role_arn = format!(
            "arn:{}:iam::{}:role/{}",
            self.partition, account_id, self.spoke_role_name
        );
        debug!(%role_arn, %capability, "Assuming spoke role");

        let response = self
            .client
            .assume_role()
            .role_arn(&role_arn)
            .role_session_name(capability.session_name())
            .duration_seconds(SESSION_DURATION_SECONDS)
            .send()
            .await
            .map_err(|err| {
                let (message, retryable) = classify_sdk_error(&err);
                BrokerError::AssumeRole {
                    account_id: account_id.to_string(),
                    message,
                    retryable,
                }
            })?;

        let credentials = response.credentials().ok_or_else(|| BrokerError::AssumeRole {
            account_id: account_id.to_string(),
            message: "AssumeRole returned no credentials".to_string(),
            retryable: false,
        })?;

        Ok(AccountCredentials {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().to_string(),
            expiration: DateTime::from_timestamp(credentials.expiration().secs(), 0)
                .unwrap_or_else(Utc::now),
        })
    }
}

#[async_trait]
impl CredentialBroker for StsCredentialBroker {
    async fn credentials_for_validation(
        &self,
        account_id: &str,
    ) -> Result<AccountCredentials, BrokerError> {
        self.assume_spoke_role(Capability::ValidateAccess, account_id)
            .await
    }

    async fn credentials_for_scan(
        &self,
        account_id: &str,
    ) -> Result<AccountCredentials, BrokerError> {
        self.assume_spoke_role(Capability::ScanSpokeResources, account_id)
            .await
    }

    async fn credentials_for_single_account_scan(
        &self,
        account_id: &str,
    ) -> Result<AccountCredentials, BrokerError> {
        self.assume_spoke_role(Capability::ScanSingleAccount, account_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trust_list_denies_by_default() {
        let list = TrustList::new();
        assert!(!list.is_allowed(Capability::ValidateAccess, "arn:aws:iam::1:role/hub"));
    }

    #[test]
    fn test_transient_flag_drives_is_transient() {
        let throttled = BrokerError::AssumeRole {
            account_id: "111122223333".to_string(),
            message: "ThrottlingException: Rate exceeded".to_string(),
            retryable: true,
        };
        assert!(throttled.is_transient());

        let missing_role = BrokerError::AssumeRole {
            account_id: "111122223333".to_string(),
            message: "AccessDenied: role does not exist".to_string(),
            retryable: false,
        };
        assert!(!missing_role.is_transient());

        let untrusted = BrokerError::NotTrusted {
            capability: Capability::ValidateAccess,
            principal: "arn:aws:iam::1:role/other".to_string(),
        };
        assert!(!untrusted.is_transient());
    }

    #[test]
    fn test_trust_list_is_per_capability() {
        let list = TrustList::new().allow(Capability::ValidateAccess, "arn:aws:iam::1:role/hub");
        assert!(list.is_allowed(Capability::ValidateAccess, "arn:aws:iam::1:role/hub"));
        assert!(!list.is_allowed(Capability::ScanSpokeResources, "arn:aws:iam::1:role/hub"));
        assert!(!list.is_allowed(Capability::ValidateAccess, "arn:aws:iam::2:role/other"));
    }
}
