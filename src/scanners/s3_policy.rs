// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::models::finding::{Finding, PolicyExplorerRecord, ResourceBasedPolicyRecord};
use crate::domain::models::job::AssessmentType;
use crate::scanners::policy_analysis::{find_org_dependencies, statements};
use crate::scanners::router::{ScanContext, ServicePolicyScanner};
use crate::scanners::ScanError;

/// S3 桶策略扫描器
///
/// 列出账户内归属目标区域的桶，逐个读取桶策略。资源策略评估
/// 只记录对组织有依赖的语句；策略清单刷新把每条语句都落库。
/// 没有策略的桶直接跳过；单个桶的读取失败记录告警后继续，
/// 不让一个坏桶拖垮整个任务。
pub struct S3PolicyScanner;

impl S3PolicyScanner {
    fn client(ctx: &ScanContext) -> aws_sdk_s3::Client {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(ctx.region.clone()))
            .credentials_provider(aws_sdk_s3::config::Credentials::new(
                ctx.credentials.access_key_id.clone(),
                ctx.credentials.secret_access_key.clone(),
                Some(ctx.credentials.session_token.clone()),
                None,
                "orgscan-scan",
            ))
            .build();
        aws_sdk_s3::Client::from_conf(config)
    }

    /// 桶的归属区域，us-east-1 由空的 LocationConstraint 表示
    async fn bucket_region(
        client: &aws_sdk_s3::Client,
        bucket_name: &str,
    ) -> Result<String, ScanError> {
        let location = client
            .get_bucket_location()
            .bucket(bucket_name)
            .send()
            .await
            .map_err(|err| ScanError::from_sdk(&err))?;
        Ok(location
            .location_constraint()
            .map(|constraint| constraint.as_str().to_string())
            .filter(|region| !region.is_empty())
            .unwrap_or_else(|| "us-east-1".to_string()))
    }

    /// 资源策略评估：只有依赖组织的语句构成发现
    fn findings_for_policy(
        ctx: &ScanContext,
        bucket_name: &str,
        policy_document: &str,
    ) -> Vec<Finding> {
        find_org_dependencies(bucket_name, policy_document)
            .into_iter()
            .map(|dependency| {
                ResourceBasedPolicyRecord {
                    account_id: ctx.account_id.clone(),
                    service_name: "s3".to_string(),
                    resource_name: dependency.resource_name,
                    dependency_type: dependency.global_context_key,
                    dependency_on: dependency.organizations_resource,
                    region: ctx.region.clone(),
                }
                .into_finding(&ctx.job_id, ctx.finding_retention)
            })
            .collect()
    }

    /// 策略清单刷新：策略文档的每条语句各落一行
    fn inventory_findings(
        ctx: &ScanContext,
        bucket_name: &str,
        policy_document: &str,
    ) -> Vec<Finding> {
        let Ok(policy) = serde_json::from_str::<Value>(policy_document) else {
            return Vec::new();
        };
        statements(&policy)
            .into_iter()
            .enumerate()
            .map(|(index, statement)| {
                PolicyExplorerRecord {
                    account_id: ctx.account_id.clone(),
                    service_name: "s3".to_string(),
                    resource_identifier: bucket_name.to_string(),
                    region: ctx.region.clone(),
                    policy_type: "ResourceBasedPolicy".to_string(),
                    statement_index: index as u32,
                    statement: statement.clone(),
                }
                .into_finding(&ctx.job_id, ctx.finding_retention)
            })
            .collect()
    }

    fn findings_from_document(ctx: &ScanContext, bucket_name: &str, policy: &str) -> Vec<Finding> {
        if ctx.assessment_type == AssessmentType::PolicyExplorer {
            Self::inventory_findings(ctx, bucket_name, policy)
        } else {
            Self::findings_for_policy(ctx, bucket_name, policy)
        }
    }
}

#[async_trait]
impl ServicePolicyScanner for S3PolicyScanner {
    fn service_name(&self) -> &'static str {
        "s3"
    }

    async fn scan(&self, ctx: &ScanContext) -> Result<Vec<Finding>, ScanError> {
        let client = Self::client(ctx);

        let buckets = client
            .list_buckets()
            .send()
            .await
            .map_err(|err| ScanError::from_sdk(&err))?
            .buckets
            .unwrap_or_default();

        let mut findings = Vec::new();
        for bucket in buckets {
            let Some(bucket_name) = bucket.name() else {
                continue;
            };

            match Self::bucket_region(&client, bucket_name).await {
                Ok(region) if region == ctx.region => {}
                Ok(_) => continue, // 归属其它区域，由那边的任务处理
                Err(ScanError::Transient(message)) => return Err(ScanError::Transient(message)),
                Err(ScanError::Business(message)) => {
                    warn!(bucket_name, error = %message, "Unable to resolve bucket location");
                    continue;
                }
            }

            match client.get_bucket_policy().bucket(bucket_name).send().await {
                Ok(output) => {
                    if let Some(policy) = output.policy() {
                        findings.extend(Self::findings_from_document(ctx, bucket_name, policy));
                    }
                }
                Err(err) => {
                    if err.as_service_error().and_then(|service_err| service_err.code())
                        == Some("NoSuchBucketPolicy")
                    {
                        debug!(bucket_name, "Bucket has no policy");
                        continue;
                    }
                    match ScanError::from_sdk(&err) {
                        ScanError::Transient(message) => {
                            return Err(ScanError::Transient(message))
                        }
                        ScanError::Business(message) => {
                            warn!(bucket_name, error = %message, "Unable to read bucket policy");
                        }
                    }
                }
            }
        }

        Ok(findings)
    }
}
