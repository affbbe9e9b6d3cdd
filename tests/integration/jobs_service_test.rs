// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Duration;
use std::sync::Arc;

use orgscan::domain::models::finding::Finding;
use orgscan::domain::models::job::{AssessmentType, Job, JobMarker, TaskFailure};
use orgscan::domain::repositories::findings_repository::FindingsRepository;
use orgscan::domain::repositories::jobs_repository::{JobsRepository, RepositoryError};
use orgscan::domain::services::jobs_service::JobsService;

use crate::helpers::{InMemoryFindingsRepository, InMemoryJobsRepository};

async fn seed_job_with_results(
    jobs_repo: &InMemoryJobsRepository,
    findings_repo: &InMemoryFindingsRepository,
    assessment_type: AssessmentType,
) -> Job {
    let job = Job::new(assessment_type, "test".to_string(), Duration::days(90));
    jobs_repo.create_job(&job).await.unwrap();
    jobs_repo.put_job_marker(&JobMarker::of(&job)).await.unwrap();

    let finding = Finding::new(
        assessment_type,
        format!("s3#111122223333#us-east-1#bucket#aws:PrincipalOrgID#{}", job.job_id),
        "111122223333".to_string(),
        Some("us-east-1".to_string()),
        job.job_id.clone(),
        serde_json::json!({ "ResourceName": "bucket" }),
        Duration::days(90),
    );
    findings_repo.create_all(&[finding]).await.unwrap();

    let failure = TaskFailure::new(
        assessment_type,
        job.job_id.clone(),
        "sns".to_string(),
        "444455556666".to_string(),
        "eu-west-1".to_string(),
        "Scan failed: AccessDeniedException".to_string(),
        Duration::days(90),
    );
    jobs_repo.create_task_failure(&failure).await.unwrap();
    job
}

#[tokio::test]
async fn job_details_aggregate_findings_and_failures() {
    let jobs_repo = Arc::new(InMemoryJobsRepository::default());
    let findings_repo = Arc::new(InMemoryFindingsRepository::default());
    let job = seed_job_with_results(
        &jobs_repo,
        &findings_repo,
        AssessmentType::ResourceBasedPolicy,
    )
    .await;

    let service = JobsService::new(jobs_repo, findings_repo);
    let details = service
        .read_job(AssessmentType::ResourceBasedPolicy, &job.job_id)
        .await
        .unwrap();

    assert_eq!(details.job.job_id, job.job_id);
    assert_eq!(details.findings.len(), 1);
    assert_eq!(details.task_failures.len(), 1);
    assert_eq!(details.task_failures[0].service_name, "sns");
}

#[tokio::test]
async fn policy_explorer_details_omit_findings() {
    let jobs_repo = Arc::new(InMemoryJobsRepository::default());
    let findings_repo = Arc::new(InMemoryFindingsRepository::default());
    let job = seed_job_with_results(&jobs_repo, &findings_repo, AssessmentType::PolicyExplorer)
        .await;

    let service = JobsService::new(jobs_repo, findings_repo.clone());
    let details = service
        .read_job(AssessmentType::PolicyExplorer, &job.job_id)
        .await
        .unwrap();

    // 发现仍在存储里，只是不随详情返回
    assert!(details.findings.is_empty());
    assert_eq!(findings_repo.findings.lock().len(), 1);
}

#[tokio::test]
async fn delete_job_removes_findings_and_failures_eagerly() {
    let jobs_repo = Arc::new(InMemoryJobsRepository::default());
    let findings_repo = Arc::new(InMemoryFindingsRepository::default());
    let job = seed_job_with_results(
        &jobs_repo,
        &findings_repo,
        AssessmentType::ResourceBasedPolicy,
    )
    .await;

    let service = JobsService::new(jobs_repo.clone(), findings_repo.clone());
    service
        .delete_job(AssessmentType::ResourceBasedPolicy, &job.job_id)
        .await
        .unwrap();

    assert!(findings_repo.findings.lock().is_empty());
    assert!(jobs_repo.failures.lock().is_empty());

    let missing = service
        .read_job(AssessmentType::ResourceBasedPolicy, &job.job_id)
        .await;
    assert!(matches!(missing, Err(RepositoryError::NotFound)));

    // 再删一次同样是未找到
    let again = service
        .delete_job(AssessmentType::ResourceBasedPolicy, &job.job_id)
        .await;
    assert!(matches!(again, Err(RepositoryError::NotFound)));
}

#[tokio::test]
async fn findings_partition_query_returns_policy_explorer_results() {
    let jobs_repo = Arc::new(InMemoryJobsRepository::default());
    let findings_repo = Arc::new(InMemoryFindingsRepository::default());
    seed_job_with_results(&jobs_repo, &findings_repo, AssessmentType::PolicyExplorer).await;

    let service = JobsService::new(jobs_repo, findings_repo);

    // 详情不带的策略清单发现走分区查询
    let explorer = service
        .read_findings(AssessmentType::PolicyExplorer)
        .await
        .unwrap();
    assert_eq!(explorer.len(), 1);
    assert_eq!(explorer[0].assessment_type, AssessmentType::PolicyExplorer);

    let other = service
        .read_findings(AssessmentType::ResourceBasedPolicy)
        .await
        .unwrap();
    assert!(other.is_empty());
}

#[tokio::test]
async fn jobs_can_be_listed_by_assessment_type() {
    let jobs_repo = Arc::new(InMemoryJobsRepository::default());
    let findings_repo = Arc::new(InMemoryFindingsRepository::default());

    let first = Job::new(
        AssessmentType::DelegatedAdmin,
        "test".to_string(),
        Duration::days(90),
    );
    let second = Job::new(
        AssessmentType::DelegatedAdmin,
        "test".to_string(),
        Duration::days(90),
    );
    let unrelated = Job::new(
        AssessmentType::TrustedAccess,
        "test".to_string(),
        Duration::days(90),
    );
    for job in [&first, &second, &unrelated] {
        jobs_repo.create_job(job).await.unwrap();
    }

    let service = JobsService::new(jobs_repo, findings_repo);
    let listed = service
        .read_jobs_of_type(AssessmentType::DelegatedAdmin)
        .await
        .unwrap();

    assert_eq!(listed.len(), 2);
    assert!(listed
        .iter()
        .all(|job| job.assessment_type == AssessmentType::DelegatedAdmin));
    assert!(listed.iter().any(|job| job.job_id == first.job_id));
    assert!(listed.iter().any(|job| job.job_id == second.job_id));
}

#[tokio::test]
async fn latest_jobs_follow_markers() {
    let jobs_repo = Arc::new(InMemoryJobsRepository::default());
    let findings_repo = Arc::new(InMemoryFindingsRepository::default());

    // 同类型的两次任务：标记只指向最近一次
    let old_job = Job::new(
        AssessmentType::DelegatedAdmin,
        "test".to_string(),
        Duration::days(90),
    );
    jobs_repo.create_job(&old_job).await.unwrap();
    jobs_repo
        .put_job_marker(&JobMarker::of(&old_job))
        .await
        .unwrap();

    let new_job = Job::new(
        AssessmentType::DelegatedAdmin,
        "test".to_string(),
        Duration::days(90),
    );
    jobs_repo.create_job(&new_job).await.unwrap();
    jobs_repo
        .put_job_marker(&JobMarker::of(&new_job))
        .await
        .unwrap();

    let service = JobsService::new(jobs_repo, findings_repo);
    let latest = service.read_latest_jobs().await.unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].job_id, new_job.job_id);

    let all = service.read_all_jobs().await.unwrap();
    assert_eq!(all.len(), 2);
}
