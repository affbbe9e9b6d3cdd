// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Duration;
use std::collections::HashMap;
use std::sync::Arc;

use orgscan::domain::models::job::{AssessmentType, JobStatus};
use orgscan::domain::models::scan_config::ScanConfiguration;
use orgscan::domain::repositories::jobs_repository::JobsRepository;
use orgscan::orchestrator::runner::{AssessmentRunner, StartError};
use orgscan::scanners::trusted_access::TrustedAccessScan;
use orgscan::scanners::SynchronousScan;

use crate::helpers::{
    build_orchestra, InMemoryFindingsRepository, ScriptedExecutor, StaticGateway, StaticValidator,
};

const ACCOUNT_A: &str = "111122223333";

fn build_runner(
    orchestra: &crate::helpers::TestOrchestra,
    gateway: Arc<StaticGateway>,
) -> AssessmentRunner {
    let mut sync_strategies: HashMap<AssessmentType, Arc<dyn SynchronousScan>> = HashMap::new();
    sync_strategies.insert(
        AssessmentType::TrustedAccess,
        Arc::new(TrustedAccessScan::new(gateway, Duration::days(90))),
    );
    AssessmentRunner::new(
        orchestra.jobs_repo.clone(),
        orchestra.findings_repo.clone(),
        orchestra.finalizer.clone(),
        orchestra.orchestrator.clone(),
        sync_strategies,
        Duration::days(90),
    )
}

#[tokio::test]
async fn synchronous_scan_returns_terminal_job_with_findings() {
    let gateway = Arc::new(StaticGateway::with_accounts(&[ACCOUNT_A]));
    let findings_repo = Arc::new(InMemoryFindingsRepository::default());
    let executor = Arc::new(ScriptedExecutor::new(findings_repo));
    let orchestra = build_orchestra(
        gateway.clone(),
        Arc::new(StaticValidator::allowing_all()),
        executor,
        10,
        10,
    );
    let runner = build_runner(&orchestra, gateway);

    let job = runner
        .start(
            AssessmentType::TrustedAccess,
            ScanConfiguration::default(),
            "admin@example.com".to_string(),
        )
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Succeeded);
    assert!(job.finished_at.is_some());

    // 可信访问发现落在管理账户名下
    let findings = orchestra.findings_repo.findings.lock().clone();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].account_id, "999988887777");
    assert_eq!(findings[0].sort_key, "guardduty.amazonaws.com");

    // 标记反映终态，允许下一次启动
    let marker = orchestra
        .jobs_repo
        .get_job_marker(AssessmentType::TrustedAccess)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(marker.status, JobStatus::Succeeded);
}

#[tokio::test]
async fn concurrent_start_of_same_type_is_rejected() {
    let gateway = Arc::new(StaticGateway::with_accounts(&[ACCOUNT_A]));
    let findings_repo = Arc::new(InMemoryFindingsRepository::default());
    let executor = Arc::new(
        ScriptedExecutor::new(findings_repo).with_delay(std::time::Duration::from_millis(200)),
    );
    let orchestra = build_orchestra(
        gateway.clone(),
        Arc::new(StaticValidator::allowing_all()),
        executor,
        10,
        10,
    );
    let runner = build_runner(&orchestra, gateway);

    let config = ScanConfiguration {
        account_ids: Some(vec![ACCOUNT_A.to_string()]),
        service_names: Some(vec!["s3".to_string()]),
        regions: Some(vec!["us-east-1".to_string()]),
        ..Default::default()
    };

    let job = runner
        .start(
            AssessmentType::ResourceBasedPolicy,
            config.clone(),
            "admin@example.com".to_string(),
        )
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Active);

    // 同类型任务仍活跃：第二次启动被拒绝，且不创建新任务行
    let rejected = runner
        .start(
            AssessmentType::ResourceBasedPolicy,
            config,
            "admin@example.com".to_string(),
        )
        .await;
    assert!(matches!(rejected, Err(StartError::ScanRunning(_))));
    assert_eq!(orchestra.jobs_repo.jobs.lock().len(), 1);

    // 后台扇出最终把任务推到终态
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    loop {
        let current = orchestra
            .jobs_repo
            .get_job(AssessmentType::ResourceBasedPolicy, &job.job_id)
            .await
            .unwrap()
            .unwrap();
        if current.status.is_terminal() {
            assert_eq!(current.status, JobStatus::Succeeded);
            break;
        }
        assert!(
            std::time::Instant::now() < deadline,
            "job did not reach a terminal state"
        );
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    // 终态之后同类型可以再次启动
    let again = runner
        .start(
            AssessmentType::ResourceBasedPolicy,
            ScanConfiguration {
                account_ids: Some(vec![ACCOUNT_A.to_string()]),
                service_names: Some(vec!["s3".to_string()]),
                regions: Some(vec!["us-east-1".to_string()]),
                ..Default::default()
            },
            "admin@example.com".to_string(),
        )
        .await;
    assert!(again.is_ok());
}
