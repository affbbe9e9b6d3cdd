// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};

use crate::domain::models::job::{AssessmentType, DomainError, Job, JobMarker, JobStatus};
use crate::domain::repositories::jobs_repository::{JobsRepository, RepositoryError};

/// 终结错误类型
#[derive(Error, Debug)]
pub enum FinalizeError {
    /// 任务行不存在
    #[error("Job not found: {assessment_type}/{job_id}")]
    JobNotFound {
        assessment_type: AssessmentType,
        job_id: String,
    },
    /// 非法的终态写入（换终态、或写非终态）
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// 存储错误
    #[error(transparent)]
    Store(#[from] RepositoryError),
}

/// 任务终结器
///
/// 每个任务只被调用一次，写入终态与结束时间，并刷新该评估类型的
/// 最近任务标记。基础设施层重试导致的重复调用是幂等的：
/// 相同终态的第二次写入产生相同的任务行。
pub struct JobFinalizer {
    jobs_repository: Arc<dyn JobsRepository>,
}

impl JobFinalizer {
    pub fn new(jobs_repository: Arc<dyn JobsRepository>) -> Self {
        Self { jobs_repository }
    }

    /// 写入终态
    pub async fn finalize(
        &self,
        assessment_type: AssessmentType,
        job_id: &str,
        status: JobStatus,
        error_detail: Option<String>,
    ) -> Result<Job, FinalizeError> {
        let job = self
            .jobs_repository
            .get_job(assessment_type, job_id)
            .await?
            .ok_or(FinalizeError::JobNotFound {
                assessment_type,
                job_id: job_id.to_string(),
            })?;

        let finished = job.finish(status, error_detail)?;
        self.jobs_repository.put_job(&finished).await?;
        self.jobs_repository
            .put_job_marker(&JobMarker::of(&finished))
            .await?;

        if finished.status == JobStatus::Failed {
            error!(%assessment_type, job_id, error = ?finished.error, "Job finished as failed");
        } else {
            info!(%assessment_type, job_id, "Job finished successfully");
        }
        metrics::counter!(
            "orgscan_jobs_finished_total",
            "status" => finished.status.to_string()
        )
        .increment(1);
        Ok(finished)
    }
}
