// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tracing::{debug, instrument, warn};

use crate::credentials::CredentialBroker;
use crate::domain::models::job::AssessmentType;
use crate::domain::repositories::findings_repository::FindingsRepository;
use crate::scanners::router::{ScanContext, ScannerRegistry};
use crate::scanners::ScanError;

/// 单个扫描任务的结构化结果
///
/// 重试策略是标签的纯函数：Success 与 BusinessFailure 是最终裁定，
/// 只有 InfraError 消耗编排器的重试预算。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// 扫描完成，发现已落库
    Success { status_code: u16 },
    /// 业务级失败，执行器内部已捕获并做出最终裁定
    BusinessFailure { error: String },
    /// 瞬态基础设施失败，可重试
    InfraError { error: String },
}

/// 扫描任务执行器特质
///
/// 一次 (账户, 服务, 区域) 扫描的调用边界，也是新增评估类别的
/// 扩展点。实现必须在内部捕获全部业务级错误并翻译为
/// 非抛出的结构化结果。
#[async_trait]
pub trait ScanTaskExecutor: Send + Sync {
    async fn execute(
        &self,
        assessment_type: AssessmentType,
        account_id: &str,
        service_name: &str,
        region: &str,
        job_id: &str,
    ) -> TaskOutcome;
}

/// 目标账户扫描执行器
///
/// 从凭证代理取得目标账户的只读扫描凭证，分发给注册表中
/// 对应服务的扫描器，把发现按任务ID落库。
pub struct SpokeScanExecutor {
    broker: Arc<dyn CredentialBroker>,
    registry: Arc<ScannerRegistry>,
    findings_repository: Arc<dyn FindingsRepository>,
    finding_retention: Duration,
    policy_explorer_retention: Duration,
}

impl SpokeScanExecutor {
    pub fn new(
        broker: Arc<dyn CredentialBroker>,
        registry: Arc<ScannerRegistry>,
        findings_repository: Arc<dyn FindingsRepository>,
        finding_retention: Duration,
        policy_explorer_retention: Duration,
    ) -> Self {
        Self {
            broker,
            registry,
            findings_repository,
            finding_retention,
            policy_explorer_retention,
        }
    }

    /// 策略清单每晚全量重建，发现只保留到下一轮刷新
    fn retention_for(&self, assessment_type: AssessmentType) -> Duration {
        if assessment_type == AssessmentType::PolicyExplorer {
            self.policy_explorer_retention
        } else {
            self.finding_retention
        }
    }
}

#[async_trait]
impl ScanTaskExecutor for SpokeScanExecutor {
    #[instrument(skip(self), fields(account_id, service_name, region, job_id))]
    async fn execute(
        &self,
        assessment_type: AssessmentType,
        account_id: &str,
        service_name: &str,
        region: &str,
        job_id: &str,
    ) -> TaskOutcome {
        let scanner = match self.registry.resolve(service_name) {
            Some(scanner) => scanner,
            None => {
                return TaskOutcome::BusinessFailure {
                    error: "Unsupported Service".to_string(),
                }
            }
        };

        let credentials = match self.broker.credentials_for_scan(account_id).await {
            Ok(credentials) => credentials,
            Err(err) => {
                let message = err.to_string();
                warn!(account_id, service_name, error = %message, "Scan credential issuance failed");
                return if err.is_transient() {
                    TaskOutcome::InfraError { error: message }
                } else {
                    TaskOutcome::BusinessFailure { error: message }
                };
            }
        };

        let ctx = ScanContext {
            assessment_type,
            account_id: account_id.to_string(),
            region: region.to_string(),
            job_id: job_id.to_string(),
            credentials,
            finding_retention: self.retention_for(assessment_type),
        };

        match scanner.scan(&ctx).await {
            Ok(findings) => {
                if findings.is_empty() {
                    debug!(account_id, service_name, region, "Scan produced no findings");
                    return TaskOutcome::Success { status_code: 200 };
                }
                match self.findings_repository.create_all(&findings).await {
                    Ok(written) => {
                        debug!(account_id, service_name, region, written, "Findings persisted");
                        metrics::counter!("orgscan_findings_written_total").increment(written);
                        TaskOutcome::Success { status_code: 200 }
                    }
                    // 存储抖动与其它瞬态条件同等对待，交给编排器的重试预算
                    Err(err) => TaskOutcome::InfraError {
                        error: err.to_string(),
                    },
                }
            }
            Err(ScanError::Business(error)) => TaskOutcome::BusinessFailure { error },
            Err(ScanError::Transient(error)) => TaskOutcome::InfraError { error },
        }
    }
}
