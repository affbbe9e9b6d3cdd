// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::models::job::AssessmentType;

/// 扫描发现
///
/// 一条由扫描任务持久化的结果记录。身份键为 (AssessmentType, SortKey)，
/// SortKey 由类别自行组合（见各 Record 类型），保证并发任务之间
/// 永不竞争同一行。创建后不再修改，由过期时间或删除父任务回收。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Finding {
    /// 评估类型，即逻辑分区
    pub assessment_type: AssessmentType,
    /// 类别特定的复合身份键
    pub sort_key: String,
    /// 发现所属的账户
    pub account_id: String,
    /// 发现所属的区域，组织级发现为空
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// 产生该发现的任务ID
    pub job_id: String,
    /// 评估时间
    pub assessed_at: DateTime<FixedOffset>,
    /// 类别特定字段
    pub payload: Value,
    /// 过期时间
    pub expires_at: DateTime<FixedOffset>,
}

impl Finding {
    /// 创建一条新的发现记录
    pub fn new(
        assessment_type: AssessmentType,
        sort_key: String,
        account_id: String,
        region: Option<String>,
        job_id: String,
        payload: Value,
        retention: Duration,
    ) -> Self {
        let now: DateTime<FixedOffset> = Utc::now().into();
        Self {
            assessment_type,
            sort_key,
            account_id,
            region,
            job_id,
            assessed_at: now,
            payload,
            expires_at: now + retention,
        }
    }
}

/// 委托管理员记录
///
/// 身份键：服务主体#账户ID
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DelegatedAdminRecord {
    pub account_id: String,
    pub service_principal: String,
    pub arn: String,
    pub email: String,
    pub name: String,
    pub status: String,
    pub joined_method: String,
    pub joined_timestamp: String,
    pub delegation_enabled_date: String,
}

impl DelegatedAdminRecord {
    pub fn sort_key(&self) -> String {
        format!("{}#{}", self.service_principal, self.account_id)
    }

    /// 转换为发现记录
    pub fn into_finding(self, job_id: &str, retention: Duration) -> Finding {
        Finding::new(
            AssessmentType::DelegatedAdmin,
            self.sort_key(),
            self.account_id.clone(),
            None,
            job_id.to_string(),
            serde_json::to_value(&self).unwrap_or(Value::Null),
            retention,
        )
    }
}

/// 可信访问记录
///
/// 身份键：服务主体。组织级记录，账户字段为管理账户。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrustedAccessRecord {
    pub service_principal: String,
    pub date_enabled: String,
}

impl TrustedAccessRecord {
    pub fn sort_key(&self) -> String {
        self.service_principal.clone()
    }

    /// 转换为发现记录
    pub fn into_finding(self, management_account_id: &str, job_id: &str, retention: Duration) -> Finding {
        Finding::new(
            AssessmentType::TrustedAccess,
            self.sort_key(),
            management_account_id.to_string(),
            None,
            job_id.to_string(),
            serde_json::to_value(&self).unwrap_or(Value::Null),
            retention,
        )
    }
}

/// 基于资源的策略记录
///
/// 身份键：服务名#账户ID#区域#资源名#依赖类型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceBasedPolicyRecord {
    pub account_id: String,
    pub service_name: String,
    pub resource_name: String,
    pub dependency_type: String,
    pub dependency_on: String,
    pub region: String,
}

impl ResourceBasedPolicyRecord {
    pub fn sort_key(&self) -> String {
        format!(
            "{}#{}#{}#{}#{}",
            self.service_name, self.account_id, self.region, self.resource_name, self.dependency_type
        )
    }

    /// 转换为发现记录
    pub fn into_finding(self, job_id: &str, retention: Duration) -> Finding {
        Finding::new(
            AssessmentType::ResourceBasedPolicy,
            self.sort_key(),
            self.account_id.clone(),
            Some(self.region.clone()),
            job_id.to_string(),
            serde_json::to_value(&self).unwrap_or(Value::Null),
            retention,
        )
    }
}

/// 策略清单记录
///
/// 每晚全量刷新，保留期很短（默认1天），身份键与资源策略记录同构，
/// 带语句序号以区分同一策略文档中的多条语句。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyExplorerRecord {
    pub account_id: String,
    pub service_name: String,
    pub resource_identifier: String,
    pub region: String,
    pub policy_type: String,
    pub statement_index: u32,
    pub statement: Value,
}

impl PolicyExplorerRecord {
    pub fn sort_key(&self) -> String {
        format!(
            "{}#{}#{}#{}",
            self.account_id, self.region, self.resource_identifier, self.statement_index
        )
    }

    /// 转换为发现记录
    pub fn into_finding(self, job_id: &str, retention: Duration) -> Finding {
        Finding::new(
            AssessmentType::PolicyExplorer,
            self.sort_key(),
            self.account_id.clone(),
            Some(self.region.clone()),
            job_id.to_string(),
            serde_json::to_value(&self).unwrap_or(Value::Null),
            retention,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_policy_sort_key_components() {
        let record = ResourceBasedPolicyRecord {
            account_id: "111122223333".to_string(),
            service_name: "s3".to_string(),
            resource_name: "my-bucket".to_string(),
            dependency_type: "aws:PrincipalOrgID".to_string(),
            dependency_on: "o-example".to_string(),
            region: "us-east-1".to_string(),
        };
        assert_eq!(
            record.sort_key(),
            "s3#111122223333#us-east-1#my-bucket#aws:PrincipalOrgID"
        );
    }

    #[test]
    fn test_finding_carries_job_id_and_payload() {
        let record = DelegatedAdminRecord {
            account_id: "111122223333".to_string(),
            service_principal: "guardduty.amazonaws.com".to_string(),
            arn: "arn:aws:organizations::111122223333:account/o-x/111122223333".to_string(),
            email: "sec@example.com".to_string(),
            name: "security".to_string(),
            status: "ACTIVE".to_string(),
            joined_method: "INVITED".to_string(),
            joined_timestamp: "2024-01-01T00:00:00Z".to_string(),
            delegation_enabled_date: "2024-02-01T00:00:00Z".to_string(),
        };
        let finding = record.into_finding("job-1", Duration::days(90));
        assert_eq!(finding.job_id, "job-1");
        assert_eq!(finding.sort_key, "guardduty.amazonaws.com#111122223333");
        assert_eq!(finding.payload["ServicePrincipal"], "guardduty.amazonaws.com");
    }
}
