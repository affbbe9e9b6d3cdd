// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use tracing::info;

use crate::domain::models::finding::Finding;
use crate::domain::models::job::{AssessmentType, Job, JobDetails, JobMarker};
use crate::domain::repositories::findings_repository::FindingsRepository;
use crate::domain::repositories::jobs_repository::{JobsRepository, RepositoryError};

/// 任务查询与维护服务
///
/// 聚合任务行、发现与失败明细的读取接口，以及按需删除。
/// 编排器不经过该服务，它只服务展示层。
pub struct JobsService {
    jobs_repository: Arc<dyn JobsRepository>,
    findings_repository: Arc<dyn FindingsRepository>,
}

impl JobsService {
    pub fn new(
        jobs_repository: Arc<dyn JobsRepository>,
        findings_repository: Arc<dyn FindingsRepository>,
    ) -> Self {
        Self {
            jobs_repository,
            findings_repository,
        }
    }

    /// 读取任务详情
    ///
    /// 返回任务行、该任务的全部发现与被容忍的失败明细。
    /// 策略清单任务的发现集过大，不随详情返回，调用方按分区另行查询。
    pub async fn read_job(
        &self,
        assessment_type: AssessmentType,
        job_id: &str,
    ) -> Result<JobDetails, RepositoryError> {
        let job = self
            .jobs_repository
            .get_job(assessment_type, job_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let findings = if assessment_type == AssessmentType::PolicyExplorer {
            Vec::new()
        } else {
            self.findings_repository.find_by_job_id(job_id).await?
        };
        let task_failures = self
            .jobs_repository
            .find_task_failures_by_job_id(job_id)
            .await?;

        Ok(JobDetails {
            job,
            findings,
            task_failures,
        })
    }

    /// 读取全部任务，按开始时间倒序
    pub async fn read_all_jobs(&self) -> Result<Vec<Job>, RepositoryError> {
        self.jobs_repository.find_all_jobs().await
    }

    /// 按评估类型读取任务历史，最近的在前
    pub async fn read_jobs_of_type(
        &self,
        assessment_type: AssessmentType,
    ) -> Result<Vec<Job>, RepositoryError> {
        self.jobs_repository
            .find_jobs_by_assessment_type(assessment_type)
            .await
    }

    /// 按分区读取发现
    ///
    /// 策略清单等大结果集不随任务详情返回，走这条分区查询。
    pub async fn read_findings(
        &self,
        assessment_type: AssessmentType,
    ) -> Result<Vec<Finding>, RepositoryError> {
        self.findings_repository
            .find_by_assessment_type(assessment_type)
            .await
    }

    /// 读取每种评估类型的最近一次任务
    pub async fn read_latest_jobs(&self) -> Result<Vec<Job>, RepositoryError> {
        let markers: Vec<JobMarker> = self.jobs_repository.find_all_job_markers().await?;
        let mut jobs = Vec::with_capacity(markers.len());
        for marker in markers {
            if let Some(job) = self
                .jobs_repository
                .get_job(marker.assessment_type, &marker.job_id)
                .await?
            {
                jobs.push(job);
            }
        }
        Ok(jobs)
    }

    /// 删除任务及其全部发现和失败明细
    ///
    /// 发现立即删除而非等待过期，避免界面继续展示已删任务的结果。
    pub async fn delete_job(
        &self,
        assessment_type: AssessmentType,
        job_id: &str,
    ) -> Result<(), RepositoryError> {
        if self
            .jobs_repository
            .get_job(assessment_type, job_id)
            .await?
            .is_none()
        {
            return Err(RepositoryError::NotFound);
        }

        let findings_deleted = self.findings_repository.delete_by_job_id(job_id).await?;
        let failures_deleted = self
            .jobs_repository
            .delete_task_failures_by_job_id(job_id)
            .await?;
        self.jobs_repository
            .delete_job(assessment_type, job_id)
            .await?;
        info!(
            %assessment_type,
            job_id,
            findings_deleted,
            failures_deleted,
            "Deleted job with its findings and task failures"
        );
        Ok(())
    }
}
