// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use orgscan::domain::models::finding::{Finding, TrustedAccessRecord};
use orgscan::domain::models::job::{AssessmentType, Job, JobMarker, TaskFailure};
use orgscan::domain::repositories::findings_repository::FindingsRepository;
use orgscan::domain::repositories::jobs_repository::{JobsRepository, RepositoryError};
use orgscan::domain::services::organizations_gateway::{
    DelegatedAdminAccount, DelegatedService, GatewayError, OrganizationInfo, OrganizationsGateway,
};
use orgscan::orchestrator::access_validator::{AccessValidator, AccountValidation, Validation};
use orgscan::orchestrator::account_resolver::AccountResolver;
use orgscan::orchestrator::finalizer::JobFinalizer;
use orgscan::orchestrator::runner::JobOrchestrator;
use orgscan::orchestrator::task_executor::{ScanTaskExecutor, TaskOutcome};
use orgscan::utils::retry_policy::RetryPolicy;

/// 内存任务仓库
#[derive(Default)]
pub struct InMemoryJobsRepository {
    pub jobs: Mutex<HashMap<(AssessmentType, String), Job>>,
    pub markers: Mutex<HashMap<AssessmentType, JobMarker>>,
    pub failures: Mutex<Vec<TaskFailure>>,
}

#[async_trait]
impl JobsRepository for InMemoryJobsRepository {
    async fn create_job(&self, job: &Job) -> Result<Job, RepositoryError> {
        self.jobs
            .lock()
            .insert((job.assessment_type, job.job_id.clone()), job.clone());
        Ok(job.clone())
    }

    async fn put_job(&self, job: &Job) -> Result<(), RepositoryError> {
        self.jobs
            .lock()
            .insert((job.assessment_type, job.job_id.clone()), job.clone());
        Ok(())
    }

    async fn get_job(
        &self,
        assessment_type: AssessmentType,
        job_id: &str,
    ) -> Result<Option<Job>, RepositoryError> {
        Ok(self
            .jobs
            .lock()
            .get(&(assessment_type, job_id.to_string()))
            .cloned())
    }

    async fn find_all_jobs(&self) -> Result<Vec<Job>, RepositoryError> {
        let mut jobs: Vec<Job> = self.jobs.lock().values().cloned().collect();
        jobs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(jobs)
    }

    async fn find_jobs_by_assessment_type(
        &self,
        assessment_type: AssessmentType,
    ) -> Result<Vec<Job>, RepositoryError> {
        let mut jobs: Vec<Job> = self
            .jobs
            .lock()
            .values()
            .filter(|job| job.assessment_type == assessment_type)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(jobs)
    }

    async fn delete_job(
        &self,
        assessment_type: AssessmentType,
        job_id: &str,
    ) -> Result<(), RepositoryError> {
        self.jobs
            .lock()
            .remove(&(assessment_type, job_id.to_string()));
        Ok(())
    }

    async fn put_job_marker(&self, marker: &JobMarker) -> Result<(), RepositoryError> {
        self.markers
            .lock()
            .insert(marker.assessment_type, marker.clone());
        Ok(())
    }

    async fn get_job_marker(
        &self,
        assessment_type: AssessmentType,
    ) -> Result<Option<JobMarker>, RepositoryError> {
        Ok(self.markers.lock().get(&assessment_type).cloned())
    }

    async fn find_all_job_markers(&self) -> Result<Vec<JobMarker>, RepositoryError> {
        Ok(self.markers.lock().values().cloned().collect())
    }

    async fn create_task_failure(&self, failure: &TaskFailure) -> Result<(), RepositoryError> {
        self.failures.lock().push(failure.clone());
        Ok(())
    }

    async fn find_task_failures_by_job_id(
        &self,
        job_id: &str,
    ) -> Result<Vec<TaskFailure>, RepositoryError> {
        Ok(self
            .failures
            .lock()
            .iter()
            .filter(|failure| failure.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn delete_task_failures_by_job_id(
        &self,
        job_id: &str,
    ) -> Result<u64, RepositoryError> {
        let mut failures = self.failures.lock();
        let before = failures.len();
        failures.retain(|failure| failure.job_id != job_id);
        Ok((before - failures.len()) as u64)
    }

    async fn purge_expired(&self, now: DateTime<FixedOffset>) -> Result<u64, RepositoryError> {
        let mut removed = 0u64;
        self.jobs.lock().retain(|_, job| {
            let keep = job.expires_at > now;
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}

/// 内存发现仓库
#[derive(Default)]
pub struct InMemoryFindingsRepository {
    pub findings: Mutex<Vec<Finding>>,
}

#[async_trait]
impl FindingsRepository for InMemoryFindingsRepository {
    async fn create_all(&self, findings: &[Finding]) -> Result<u64, RepositoryError> {
        self.findings.lock().extend_from_slice(findings);
        Ok(findings.len() as u64)
    }

    async fn find_by_job_id(&self, job_id: &str) -> Result<Vec<Finding>, RepositoryError> {
        Ok(self
            .findings
            .lock()
            .iter()
            .filter(|finding| finding.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn find_by_assessment_type(
        &self,
        assessment_type: AssessmentType,
    ) -> Result<Vec<Finding>, RepositoryError> {
        Ok(self
            .findings
            .lock()
            .iter()
            .filter(|finding| finding.assessment_type == assessment_type)
            .cloned()
            .collect())
    }

    async fn delete_by_job_id(&self, job_id: &str) -> Result<u64, RepositoryError> {
        let mut findings = self.findings.lock();
        let before = findings.len();
        findings.retain(|finding| finding.job_id != job_id);
        Ok((before - findings.len()) as u64)
    }

    async fn purge_expired(&self, now: DateTime<FixedOffset>) -> Result<u64, RepositoryError> {
        let mut findings = self.findings.lock();
        let before = findings.len();
        findings.retain(|finding| finding.expires_at > now);
        Ok((before - findings.len()) as u64)
    }
}

/// 静态组织网关：固定的账户集合，或一律返回错误
pub struct StaticGateway {
    pub accounts: Vec<String>,
    pub fail_with: Option<String>,
}

impl StaticGateway {
    pub fn with_accounts(accounts: &[&str]) -> Self {
        Self {
            accounts: accounts.iter().map(|s| s.to_string()).collect(),
            fail_with: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            accounts: Vec::new(),
            fail_with: Some(message.to_string()),
        }
    }

    fn accounts_or_error(&self) -> Result<Vec<String>, GatewayError> {
        match &self.fail_with {
            Some(message) => Err(GatewayError::Api(message.clone())),
            None => Ok(self.accounts.clone()),
        }
    }
}

#[async_trait]
impl OrganizationsGateway for StaticGateway {
    async fn describe_organization(&self) -> Result<OrganizationInfo, GatewayError> {
        Ok(OrganizationInfo {
            organization_id: "o-example".to_string(),
            management_account_id: "999988887777".to_string(),
        })
    }

    async fn list_delegated_administrators(
        &self,
    ) -> Result<Vec<DelegatedAdminAccount>, GatewayError> {
        Ok(Vec::new())
    }

    async fn list_delegated_services_for_account(
        &self,
        _account_id: &str,
    ) -> Result<Vec<DelegatedService>, GatewayError> {
        Ok(Vec::new())
    }

    async fn list_enabled_service_principals(
        &self,
    ) -> Result<Vec<TrustedAccessRecord>, GatewayError> {
        Ok(vec![TrustedAccessRecord {
            service_principal: "guardduty.amazonaws.com".to_string(),
            date_enabled: "2024-01-01T00:00:00Z".to_string(),
        }])
    }

    async fn list_all_active_accounts(&self) -> Result<Vec<String>, GatewayError> {
        self.accounts_or_error()
    }

    async fn list_accounts_for_org_units(
        &self,
        _org_unit_ids: &[String],
    ) -> Result<Vec<String>, GatewayError> {
        self.accounts_or_error()
    }
}

/// 静态访问验证器：指定账户被拒绝，其余放行且不裁剪范围
pub struct StaticValidator {
    pub denied_accounts: Vec<String>,
}

impl StaticValidator {
    pub fn allowing_all() -> Self {
        Self {
            denied_accounts: Vec::new(),
        }
    }

    pub fn denying(accounts: &[&str]) -> Self {
        Self {
            denied_accounts: accounts.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
impl AccessValidator for StaticValidator {
    async fn validate(
        &self,
        account_id: &str,
        requested_services: &[String],
        requested_regions: &[String],
    ) -> AccountValidation {
        if self.denied_accounts.iter().any(|a| a == account_id) {
            return AccountValidation::denied(
                "Access Validation Failed: Unable to assume role in this account.".to_string(),
            );
        }
        AccountValidation {
            validation: Validation::Ok,
            services_to_scan: requested_services.to_vec(),
            regions: requested_regions.to_vec(),
            denial_reason: None,
        }
    }
}

/// 脚本化执行器
///
/// 按 (账户, 服务) 预置结果，默认写入一条发现并返回成功。
/// 记录每个任务的调用次数与同时在飞的任务数峰值。
pub struct ScriptedExecutor {
    pub findings_repository: Arc<InMemoryFindingsRepository>,
    pub outcomes: Mutex<HashMap<(String, String), TaskOutcome>>,
    pub calls: Mutex<HashMap<(String, String), u32>>,
    pub in_flight: Mutex<usize>,
    pub max_in_flight: Mutex<usize>,
    pub task_delay: std::time::Duration,
}

impl ScriptedExecutor {
    pub fn new(findings_repository: Arc<InMemoryFindingsRepository>) -> Self {
        Self {
            findings_repository,
            outcomes: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(0),
            max_in_flight: Mutex::new(0),
            task_delay: std::time::Duration::from_millis(0),
        }
    }

    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.task_delay = delay;
        self
    }

    pub fn script(self, account_id: &str, service_name: &str, outcome: TaskOutcome) -> Self {
        self.outcomes
            .lock()
            .insert((account_id.to_string(), service_name.to_string()), outcome);
        self
    }

    pub fn call_count(&self, account_id: &str, service_name: &str) -> u32 {
        self.calls
            .lock()
            .get(&(account_id.to_string(), service_name.to_string()))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl ScanTaskExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        assessment_type: AssessmentType,
        account_id: &str,
        service_name: &str,
        region: &str,
        job_id: &str,
    ) -> TaskOutcome {
        {
            let mut in_flight = self.in_flight.lock();
            *in_flight += 1;
            let mut max = self.max_in_flight.lock();
            *max = (*max).max(*in_flight);
        }
        *self
            .calls
            .lock()
            .entry((account_id.to_string(), service_name.to_string()))
            .or_insert(0) += 1;

        if !self.task_delay.is_zero() {
            tokio::time::sleep(self.task_delay).await;
        }

        let outcome = self
            .outcomes
            .lock()
            .get(&(account_id.to_string(), service_name.to_string()))
            .cloned();

        let result = match outcome {
            Some(outcome) => outcome,
            None => {
                let finding = Finding::new(
                    assessment_type,
                    format!("{service_name}#{account_id}#{region}#resource#aws:PrincipalOrgID"),
                    account_id.to_string(),
                    Some(region.to_string()),
                    job_id.to_string(),
                    serde_json::json!({ "ResourceName": "resource" }),
                    Duration::days(90),
                );
                let _ = self.findings_repository.create_all(&[finding]).await;
                TaskOutcome::Success { status_code: 200 }
            }
        };

        *self.in_flight.lock() -= 1;
        result
    }
}

/// 快速重试策略，退避接近零，测试不用等待
pub fn fast_retry_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        initial_backoff: std::time::Duration::from_millis(1),
        max_backoff: std::time::Duration::from_millis(2),
        backoff_multiplier: 2.0,
        jitter_factor: 0.0,
        exponential_backoff: true,
        enable_jitter: false,
    }
}

/// 测试编排环境
pub struct TestOrchestra {
    pub jobs_repo: Arc<InMemoryJobsRepository>,
    pub findings_repo: Arc<InMemoryFindingsRepository>,
    pub executor: Arc<ScriptedExecutor>,
    pub finalizer: Arc<JobFinalizer>,
    pub orchestrator: Arc<JobOrchestrator>,
}

pub fn build_orchestra(
    gateway: Arc<dyn OrganizationsGateway>,
    validator: Arc<dyn AccessValidator>,
    executor: Arc<ScriptedExecutor>,
    outer_concurrency: usize,
    inner_concurrency: usize,
) -> TestOrchestra {
    let jobs_repo = Arc::new(InMemoryJobsRepository::default());
    let findings_repo = executor.findings_repository.clone();
    let finalizer = Arc::new(JobFinalizer::new(jobs_repo.clone()));
    let orchestrator = Arc::new(JobOrchestrator::new(
        Arc::new(AccountResolver::new(gateway)),
        validator,
        executor.clone(),
        jobs_repo.clone(),
        finalizer.clone(),
        fast_retry_policy(),
        outer_concurrency,
        inner_concurrency,
        Duration::days(90),
    ));
    TestOrchestra {
        jobs_repo,
        findings_repo,
        executor,
        finalizer,
        orchestrator,
    }
}
