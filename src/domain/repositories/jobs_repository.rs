// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{AssessmentType, Job, JobMarker, TaskFailure};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use sea_orm::DbErr;
use thiserror::Error;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
}

/// 任务仓库特质
///
/// 任务记录、最近任务标记与任务失败明细的数据访问接口。
/// 发现与失败记录只会引用已存在的任务行：任务行先以 Active 状态
/// 落库，之后任何扫描任务才会开始执行。
#[async_trait]
pub trait JobsRepository: Send + Sync {
    /// 创建任务记录
    async fn create_job(&self, job: &Job) -> Result<Job, RepositoryError>;
    /// 写入任务记录（按身份键覆盖，终结器的幂等写依赖该语义）
    async fn put_job(&self, job: &Job) -> Result<(), RepositoryError>;
    /// 按身份键查找任务
    async fn get_job(
        &self,
        assessment_type: AssessmentType,
        job_id: &str,
    ) -> Result<Option<Job>, RepositoryError>;
    /// 查找全部任务，按开始时间倒序
    async fn find_all_jobs(&self) -> Result<Vec<Job>, RepositoryError>;
    /// 按评估类型查找任务，按开始时间倒序
    async fn find_jobs_by_assessment_type(
        &self,
        assessment_type: AssessmentType,
    ) -> Result<Vec<Job>, RepositoryError>;
    /// 删除任务记录
    async fn delete_job(
        &self,
        assessment_type: AssessmentType,
        job_id: &str,
    ) -> Result<(), RepositoryError>;

    /// 写入最近任务标记（每种评估类型一条，覆盖写）
    async fn put_job_marker(&self, marker: &JobMarker) -> Result<(), RepositoryError>;
    /// 读取某评估类型的最近任务标记
    async fn get_job_marker(
        &self,
        assessment_type: AssessmentType,
    ) -> Result<Option<JobMarker>, RepositoryError>;
    /// 读取全部最近任务标记
    async fn find_all_job_markers(&self) -> Result<Vec<JobMarker>, RepositoryError>;

    /// 写入一条任务失败记录
    async fn create_task_failure(&self, failure: &TaskFailure) -> Result<(), RepositoryError>;
    /// 按任务ID查找失败记录
    async fn find_task_failures_by_job_id(
        &self,
        job_id: &str,
    ) -> Result<Vec<TaskFailure>, RepositoryError>;
    /// 按任务ID删除失败记录
    async fn delete_task_failures_by_job_id(&self, job_id: &str)
        -> Result<u64, RepositoryError>;

    /// 清理过期行，返回删除数量
    async fn purge_expired(&self, now: DateTime<FixedOffset>) -> Result<u64, RepositoryError>;
}
