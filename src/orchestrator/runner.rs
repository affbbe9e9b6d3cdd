// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use futures::stream::{self, TryStreamExt};
use futures::{FutureExt, StreamExt};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::domain::models::job::{AssessmentType, Job, JobMarker, JobStatus, TaskFailure};
use crate::domain::models::scan_config::ScanConfiguration;
use crate::domain::repositories::findings_repository::FindingsRepository;
use crate::domain::repositories::jobs_repository::{JobsRepository, RepositoryError};
use crate::orchestrator::access_validator::{AccessValidator, Validation};
use crate::orchestrator::account_resolver::AccountResolver;
use crate::orchestrator::finalizer::{FinalizeError, JobFinalizer};
use crate::orchestrator::task_executor::{ScanTaskExecutor, TaskOutcome};
use crate::orchestrator::OrchestrationError;
use crate::scanners::SynchronousScan;
use crate::utils::retry_policy::RetryPolicy;

/// 启动错误类型
///
/// 这些错误在任何扫描任务开始之前返回给调用方，属于客户端错误，
/// 不产生 Failed 终态的任务行（ScanRunning 时甚至不创建任务行）。
#[derive(Error, Debug)]
pub enum StartError {
    /// 同类型任务仍在活跃中
    #[error("Cannot start another scan of type {0} while there is already a scan of this type running.")]
    ScanRunning(AssessmentType),
    /// 同步评估类型没有注册对应的扫描策略
    #[error("No synchronous scan strategy registered for {0}")]
    UnknownStrategy(AssessmentType),
    /// 存储错误
    #[error(transparent)]
    Store(#[from] RepositoryError),
    /// 终结失败
    #[error(transparent)]
    Finalize(#[from] FinalizeError),
}

/// 展开账户内的 (服务, 区域) 扫描对
fn service_region_pairs(services: &[String], regions: &[String]) -> Vec<(String, String)> {
    services
        .iter()
        .flat_map(|service| {
            regions
                .iter()
                .map(move |region| (service.clone(), region.clone()))
        })
        .collect()
}

/// 任务编排器
///
/// 异步评估类别的核心：解析账户集合，对账户做外层有界扇出，
/// 账户内对 (服务, 区域) 对做内层有界扇出，汇合后调用终结器。
/// 单任务失败被容忍并记录；只有编排级错误短路剩余扇出并把
/// 任务推到 Failed。
pub struct JobOrchestrator {
    resolver: Arc<AccountResolver>,
    validator: Arc<dyn AccessValidator>,
    executor: Arc<dyn ScanTaskExecutor>,
    jobs_repository: Arc<dyn JobsRepository>,
    finalizer: Arc<JobFinalizer>,
    retry_policy: RetryPolicy,
    outer_concurrency: usize,
    inner_concurrency: usize,
    failure_retention: Duration,
}

impl JobOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        resolver: Arc<AccountResolver>,
        validator: Arc<dyn AccessValidator>,
        executor: Arc<dyn ScanTaskExecutor>,
        jobs_repository: Arc<dyn JobsRepository>,
        finalizer: Arc<JobFinalizer>,
        retry_policy: RetryPolicy,
        outer_concurrency: usize,
        inner_concurrency: usize,
        failure_retention: Duration,
    ) -> Self {
        Self {
            resolver,
            validator,
            executor,
            jobs_repository,
            finalizer,
            retry_policy,
            outer_concurrency,
            inner_concurrency,
            failure_retention,
        }
    }

    /// 运行一个已创建为 Active 的任务直到终态
    #[instrument(skip(self, config), fields(assessment_type = %job.assessment_type, job_id = %job.job_id))]
    pub async fn run(&self, job: Job, config: ScanConfiguration) {
        let (status, error_detail) = match self.run_fanout(&job, &config).await {
            Ok(()) => (JobStatus::Succeeded, None),
            Err(err) => {
                warn!(error = %err, "Fan-out aborted by orchestration-level error");
                (JobStatus::Failed, Some(err.to_string()))
            }
        };

        if let Err(err) = self
            .finalizer
            .finalize(job.assessment_type, &job.job_id, status, error_detail)
            .await
        {
            error!(error = %err, "Failed to finalize job");
        }
    }

    async fn run_fanout(
        &self,
        job: &Job,
        config: &ScanConfiguration,
    ) -> Result<(), OrchestrationError> {
        let scope = self.resolver.resolve(config).await?;
        info!(
            accounts = scope.account_ids.len(),
            outer_concurrency = self.outer_concurrency,
            inner_concurrency = self.inner_concurrency,
            "Starting two-level fan-out"
        );

        stream::iter(scope.account_ids.clone())
            .map(Ok::<String, OrchestrationError>)
            .try_for_each_concurrent(Some(self.outer_concurrency), |account_id| {
                let services = scope.service_names.clone();
                let regions = scope.regions.clone();
                async move {
                    self.process_account(job, &account_id, &services, &regions)
                        .await
                }
            })
            .await
    }

    /// 处理单个账户：验证访问并裁剪范围，然后做内层扇出
    async fn process_account(
        &self,
        job: &Job,
        account_id: &str,
        services: &[String],
        regions: &[String],
    ) -> Result<(), OrchestrationError> {
        let validation = self.validator.validate(account_id, services, regions).await;

        if validation.validation == Validation::Denied {
            // 账户级拒绝：服务名与区域留空的一条失败记录，账户被跳过
            let failure = TaskFailure::new(
                job.assessment_type,
                job.job_id.clone(),
                String::new(),
                account_id.to_string(),
                String::new(),
                validation
                    .denial_reason
                    .unwrap_or_else(|| "Access Validation Failed".to_string()),
                self.failure_retention,
            );
            self.jobs_repository.create_task_failure(&failure).await?;
            metrics::counter!("orgscan_accounts_denied_total").increment(1);
            return Ok(());
        }

        let pairs = service_region_pairs(&validation.services_to_scan, &validation.regions);
        stream::iter(pairs)
            .map(Ok::<(String, String), OrchestrationError>)
            .try_for_each_concurrent(Some(self.inner_concurrency), |(service, region)| {
                let account_id = account_id.to_string();
                async move { self.run_task(job, &account_id, &service, &region).await }
            })
            .await
    }

    /// 执行单个扫描任务，带有界重试
    ///
    /// 业务失败是执行器的最终裁定，立即记录；瞬态失败按退避策略
    /// 重试，预算耗尽后降级为任务失败记录。执行器 panic 违反契约，
    /// 作为编排错误向上传播。
    async fn run_task(
        &self,
        job: &Job,
        account_id: &str,
        service_name: &str,
        region: &str,
    ) -> Result<(), OrchestrationError> {
        let mut attempt: u32 = 0;
        loop {
            let execution = self.executor.execute(
                job.assessment_type,
                account_id,
                service_name,
                region,
                &job.job_id,
            );
            let outcome = std::panic::AssertUnwindSafe(execution)
                .catch_unwind()
                .await
                .map_err(|_| OrchestrationError::ExecutorPanic {
                    account_id: account_id.to_string(),
                    service_name: service_name.to_string(),
                })?;

            match outcome {
                TaskOutcome::Success { .. } => {
                    metrics::counter!("orgscan_tasks_total", "outcome" => "success").increment(1);
                    return Ok(());
                }
                TaskOutcome::BusinessFailure { error } => {
                    metrics::counter!("orgscan_tasks_total", "outcome" => "business_failure")
                        .increment(1);
                    self.record_task_failure(job, account_id, service_name, region, error)
                        .await?;
                    return Ok(());
                }
                TaskOutcome::InfraError { error } => {
                    attempt += 1;
                    if self.retry_policy.should_retry(attempt) {
                        let backoff = self.retry_policy.calculate_backoff(attempt);
                        warn!(
                            account_id,
                            service_name,
                            region,
                            attempt,
                            backoff_ms = backoff.as_millis() as u64,
                            error = %error,
                            "Transient task failure, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    // 重试预算耗尽：降级为被容忍的任务失败
                    metrics::counter!("orgscan_tasks_total", "outcome" => "retries_exhausted")
                        .increment(1);
                    self.record_task_failure(job, account_id, service_name, region, error)
                        .await?;
                    return Ok(());
                }
            }
        }
    }

    async fn record_task_failure(
        &self,
        job: &Job,
        account_id: &str,
        service_name: &str,
        region: &str,
        error_detail: String,
    ) -> Result<(), OrchestrationError> {
        let failure = TaskFailure::new(
            job.assessment_type,
            job.job_id.clone(),
            service_name.to_string(),
            account_id.to_string(),
            region.to_string(),
            error_detail,
            self.failure_retention,
        );
        self.jobs_repository.create_task_failure(&failure).await?;
        Ok(())
    }
}

/// 评估运行器
///
/// "启动任务"操作的入口。同步类别在本次调用内扫描、落库并终结；
/// 异步类别创建 Active 任务行后交给编排器在后台扇出，调用方
/// 凭任务ID轮询。同类型任务已在活跃中时拒绝启动。
pub struct AssessmentRunner {
    jobs_repository: Arc<dyn JobsRepository>,
    findings_repository: Arc<dyn FindingsRepository>,
    finalizer: Arc<JobFinalizer>,
    orchestrator: Arc<JobOrchestrator>,
    sync_strategies: HashMap<AssessmentType, Arc<dyn SynchronousScan>>,
    job_retention: Duration,
}

impl AssessmentRunner {
    pub fn new(
        jobs_repository: Arc<dyn JobsRepository>,
        findings_repository: Arc<dyn FindingsRepository>,
        finalizer: Arc<JobFinalizer>,
        orchestrator: Arc<JobOrchestrator>,
        sync_strategies: HashMap<AssessmentType, Arc<dyn SynchronousScan>>,
        job_retention: Duration,
    ) -> Self {
        Self {
            jobs_repository,
            findings_repository,
            finalizer,
            orchestrator,
            sync_strategies,
            job_retention,
        }
    }

    /// 启动一次评估
    pub async fn start(
        &self,
        assessment_type: AssessmentType,
        config: ScanConfiguration,
        started_by: String,
    ) -> Result<Job, StartError> {
        self.raise_if_active_job(assessment_type).await?;

        let job = Job::new(assessment_type, started_by, self.job_retention);
        self.jobs_repository.create_job(&job).await?;
        self.jobs_repository
            .put_job_marker(&JobMarker::of(&job))
            .await?;
        info!(%assessment_type, job_id = %job.job_id, "Job accepted");

        if assessment_type.is_asynchronous() {
            let orchestrator = self.orchestrator.clone();
            let background_job = job.clone();
            tokio::spawn(async move {
                orchestrator.run(background_job, config).await;
            });
            return Ok(job);
        }

        let strategy = self
            .sync_strategies
            .get(&assessment_type)
            .cloned()
            .ok_or(StartError::UnknownStrategy(assessment_type))?;

        let (status, error_detail) = match strategy.scan(&job.job_id).await {
            Ok(findings) => match self.findings_repository.create_all(&findings).await {
                Ok(written) => {
                    info!(%assessment_type, job_id = %job.job_id, written, "Synchronous scan persisted findings");
                    (JobStatus::Succeeded, None)
                }
                Err(err) => (JobStatus::Failed, Some(err.to_string())),
            },
            Err(err) => (JobStatus::Failed, Some(err.to_string())),
        };

        let finished = self
            .finalizer
            .finalize(assessment_type, &job.job_id, status, error_detail)
            .await?;
        Ok(finished)
    }

    /// 同类型任务仍在活跃中时拒绝启动
    async fn raise_if_active_job(
        &self,
        assessment_type: AssessmentType,
    ) -> Result<(), StartError> {
        if let Some(marker) = self.jobs_repository.get_job_marker(assessment_type).await? {
            if marker.status == JobStatus::Active {
                return Err(StartError::ScanRunning(assessment_type));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_region_pairs_cartesian() {
        let services = vec!["s3".to_string(), "kms".to_string()];
        let regions = vec!["us-east-1".to_string(), "eu-west-1".to_string()];
        let pairs = service_region_pairs(&services, &regions);
        assert_eq!(pairs.len(), 4);
        assert!(pairs.contains(&("s3".to_string(), "us-east-1".to_string())));
        assert!(pairs.contains(&("kms".to_string(), "eu-west-1".to_string())));
    }

    #[test]
    fn test_no_pairs_without_regions() {
        let services = vec!["s3".to_string()];
        assert!(service_region_pairs(&services, &[]).is_empty());
    }
}
