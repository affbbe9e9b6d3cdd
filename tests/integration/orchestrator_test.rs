// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Duration;
use std::sync::Arc;

use orgscan::domain::models::job::{AssessmentType, Job, JobStatus};
use orgscan::domain::models::scan_config::ScanConfiguration;
use orgscan::domain::repositories::jobs_repository::JobsRepository;
use orgscan::orchestrator::task_executor::TaskOutcome;

use crate::helpers::{
    build_orchestra, InMemoryFindingsRepository, ScriptedExecutor, StaticGateway, StaticValidator,
};

const ACCOUNT_A: &str = "111122223333";
const ACCOUNT_B: &str = "444455556666";

fn narrow_config(account_ids: &[&str], services: &[&str], regions: &[&str]) -> ScanConfiguration {
    ScanConfiguration {
        account_ids: Some(account_ids.iter().map(|s| s.to_string()).collect()),
        service_names: Some(services.iter().map(|s| s.to_string()).collect()),
        regions: Some(regions.iter().map(|s| s.to_string()).collect()),
        ..Default::default()
    }
}

async fn seeded_job(
    jobs_repo: &dyn JobsRepository,
    assessment_type: AssessmentType,
) -> Job {
    let job = Job::new(assessment_type, "test".to_string(), Duration::days(90));
    jobs_repo.create_job(&job).await.unwrap();
    job
}

#[tokio::test]
async fn denied_account_is_tolerated_and_job_succeeds() {
    let findings_repo = Arc::new(InMemoryFindingsRepository::default());
    let executor = Arc::new(ScriptedExecutor::new(findings_repo));
    let orchestra = build_orchestra(
        Arc::new(StaticGateway::with_accounts(&[ACCOUNT_A, ACCOUNT_B])),
        Arc::new(StaticValidator::denying(&[ACCOUNT_B])),
        executor,
        10,
        10,
    );

    let job = seeded_job(
        orchestra.jobs_repo.as_ref(),
        AssessmentType::ResourceBasedPolicy,
    )
    .await;
    let config = narrow_config(&[ACCOUNT_A, ACCOUNT_B], &["s3"], &["us-east-1"]);

    orchestra.orchestrator.run(job.clone(), config).await;

    let finished = orchestra
        .jobs_repo
        .get_job(job.assessment_type, &job.job_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(finished.status, JobStatus::Succeeded);
    assert!(finished.error.is_none());

    // 被拒绝的账户：一条服务名与区域为空的失败记录
    let failures = orchestra.jobs_repo.failures.lock().clone();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].account_id, ACCOUNT_B);
    assert_eq!(failures[0].service_name, "");
    assert_eq!(failures[0].region, "");
    assert!(failures[0].error.contains("Access Validation Failed"));

    // 另一个账户的扫描照常完成
    let findings = orchestra.findings_repo.findings.lock().clone();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].account_id, ACCOUNT_A);
    assert_eq!(findings[0].job_id, job.job_id);
}

#[tokio::test]
async fn business_failure_recorded_without_retry_and_job_succeeds() {
    let findings_repo = Arc::new(InMemoryFindingsRepository::default());
    let executor = Arc::new(
        ScriptedExecutor::new(findings_repo).script(
            ACCOUNT_A,
            "s3",
            TaskOutcome::BusinessFailure {
                error: "Scan failed: AccessDeniedException".to_string(),
            },
        ),
    );
    let orchestra = build_orchestra(
        Arc::new(StaticGateway::with_accounts(&[ACCOUNT_A])),
        Arc::new(StaticValidator::allowing_all()),
        executor.clone(),
        10,
        10,
    );

    let job = seeded_job(
        orchestra.jobs_repo.as_ref(),
        AssessmentType::ResourceBasedPolicy,
    )
    .await;
    let config = narrow_config(&[ACCOUNT_A], &["s3", "sns"], &["us-east-1"]);

    orchestra.orchestrator.run(job.clone(), config).await;

    let finished = orchestra
        .jobs_repo
        .get_job(job.assessment_type, &job.job_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(finished.status, JobStatus::Succeeded);

    // 业务失败是最终裁定，恰好执行一次
    assert_eq!(executor.call_count(ACCOUNT_A, "s3"), 1);

    let failures = orchestra.jobs_repo.failures.lock().clone();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].service_name, "s3");
    assert_eq!(failures[0].region, "us-east-1");

    // 其它 (服务, 区域) 对不受影响
    let findings = orchestra.findings_repo.findings.lock().clone();
    assert_eq!(findings.len(), 1);
    assert!(findings[0].sort_key.starts_with("sns#"));
}

#[tokio::test]
async fn transient_failure_retried_then_demoted_to_task_failure() {
    let findings_repo = Arc::new(InMemoryFindingsRepository::default());
    let executor = Arc::new(
        ScriptedExecutor::new(findings_repo).script(
            ACCOUNT_A,
            "s3",
            TaskOutcome::InfraError {
                error: "ThrottlingException: Rate exceeded".to_string(),
            },
        ),
    );
    let orchestra = build_orchestra(
        Arc::new(StaticGateway::with_accounts(&[ACCOUNT_A])),
        Arc::new(StaticValidator::allowing_all()),
        executor.clone(),
        10,
        10,
    );

    let job = seeded_job(
        orchestra.jobs_repo.as_ref(),
        AssessmentType::ResourceBasedPolicy,
    )
    .await;
    let config = narrow_config(&[ACCOUNT_A], &["s3"], &["us-east-1"]);

    orchestra.orchestrator.run(job.clone(), config).await;

    // max_retries = 3：三次执行后重试预算耗尽
    assert_eq!(executor.call_count(ACCOUNT_A, "s3"), 3);

    let failures = orchestra.jobs_repo.failures.lock().clone();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].error.contains("ThrottlingException"));

    // 降级后的失败被容忍，任务仍然成功
    let finished = orchestra
        .jobs_repo
        .get_job(job.assessment_type, &job.job_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(finished.status, JobStatus::Succeeded);
}

#[tokio::test]
async fn resolution_failure_fails_job_before_any_task() {
    let findings_repo = Arc::new(InMemoryFindingsRepository::default());
    let executor = Arc::new(ScriptedExecutor::new(findings_repo));
    let orchestra = build_orchestra(
        Arc::new(StaticGateway::failing("Organizations API unavailable")),
        Arc::new(StaticValidator::allowing_all()),
        executor.clone(),
        10,
        10,
    );

    let job = seeded_job(
        orchestra.jobs_repo.as_ref(),
        AssessmentType::ResourceBasedPolicy,
    )
    .await;
    // 账户选择为全组织，解析需要走网关
    let config = ScanConfiguration::default();

    orchestra.orchestrator.run(job.clone(), config).await;

    let finished = orchestra
        .jobs_repo
        .get_job(job.assessment_type, &job.job_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(finished.status, JobStatus::Failed);
    assert!(finished
        .error
        .as_deref()
        .unwrap()
        .contains("Organizations API unavailable"));

    // 没有任何任务被执行或记录
    assert!(orchestra.jobs_repo.failures.lock().is_empty());
    assert!(orchestra.findings_repo.findings.lock().is_empty());
}

#[tokio::test]
async fn outer_fanout_respects_account_concurrency_cap() {
    let findings_repo = Arc::new(InMemoryFindingsRepository::default());
    let executor = Arc::new(
        ScriptedExecutor::new(findings_repo).with_delay(std::time::Duration::from_millis(20)),
    );
    let accounts = [
        "111111111111",
        "222222222222",
        "333333333333",
        "444444444444",
        "555555555555",
    ];
    let orchestra = build_orchestra(
        Arc::new(StaticGateway::with_accounts(&accounts)),
        Arc::new(StaticValidator::allowing_all()),
        executor.clone(),
        2,
        1,
    );

    let job = seeded_job(
        orchestra.jobs_repo.as_ref(),
        AssessmentType::ResourceBasedPolicy,
    )
    .await;
    let config = narrow_config(&accounts, &["s3"], &["us-east-1"]);

    orchestra.orchestrator.run(job, config).await;

    let max_in_flight = *executor.max_in_flight.lock();
    assert!(max_in_flight <= 2, "observed {max_in_flight} tasks in flight");
    assert_eq!(orchestra.findings_repo.findings.lock().len(), 5);
}
