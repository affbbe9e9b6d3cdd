// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::finding::Finding;
use crate::domain::models::job::AssessmentType;
use crate::domain::repositories::jobs_repository::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

/// 发现仓库特质
///
/// 扫描结果的数据访问接口。写入是按任务追加的，身份键为
/// (评估类型, 复合键)，并发任务之间不会竞争同一行，重复扫描
/// 按身份键覆盖。
#[async_trait]
pub trait FindingsRepository: Send + Sync {
    /// 批量写入发现（按身份键覆盖），返回写入数量
    async fn create_all(&self, findings: &[Finding]) -> Result<u64, RepositoryError>;
    /// 按任务ID查找发现（二级索引）
    async fn find_by_job_id(&self, job_id: &str) -> Result<Vec<Finding>, RepositoryError>;
    /// 按评估类型查找发现
    async fn find_by_assessment_type(
        &self,
        assessment_type: AssessmentType,
    ) -> Result<Vec<Finding>, RepositoryError>;
    /// 按任务ID删除发现，返回删除数量
    async fn delete_by_job_id(&self, job_id: &str) -> Result<u64, RepositoryError>;
    /// 清理过期行，返回删除数量
    async fn purge_expired(&self, now: DateTime<FixedOffset>) -> Result<u64, RepositoryError>;
}
