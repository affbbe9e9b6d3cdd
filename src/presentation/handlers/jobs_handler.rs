// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use crate::domain::models::finding::Finding;
use crate::domain::models::job::{AssessmentType, DomainError, Job, JobDetails};
use crate::domain::services::jobs_service::JobsService;
use crate::presentation::errors::AppError;

#[derive(Debug, Default, Deserialize)]
pub struct JobsQuery {
    /// `latest` 只返回每种评估类型的最近一次任务
    pub selection: Option<String>,
    /// 限定单一评估类型的任务历史
    pub assessment_type: Option<String>,
}

fn parse_assessment_type(value: &str) -> Result<AssessmentType, DomainError> {
    value
        .parse()
        .map_err(|_| DomainError::ValidationError(format!("Unknown assessment type: {value}")))
}

/// 列出任务
pub async fn list_jobs(
    Query(query): Query<JobsQuery>,
    Extension(jobs_service): Extension<Arc<JobsService>>,
) -> Result<Json<Vec<Job>>, AppError> {
    let jobs = if let Some(assessment_type) = query.assessment_type.as_deref() {
        jobs_service
            .read_jobs_of_type(parse_assessment_type(assessment_type)?)
            .await?
    } else if query.selection.as_deref() == Some("latest") {
        jobs_service.read_latest_jobs().await?
    } else {
        jobs_service.read_all_jobs().await?
    };
    Ok(Json(jobs))
}

/// 按分区列出发现，策略清单的查询入口
pub async fn list_findings(
    Path(assessment_type): Path<String>,
    Extension(jobs_service): Extension<Arc<JobsService>>,
) -> Result<Json<Vec<Finding>>, AppError> {
    let assessment_type = parse_assessment_type(&assessment_type)?;
    let findings = jobs_service.read_findings(assessment_type).await?;
    Ok(Json(findings))
}

/// 读取单个任务的详情、发现与失败明细
pub async fn get_job(
    Path((assessment_type, job_id)): Path<(String, String)>,
    Extension(jobs_service): Extension<Arc<JobsService>>,
) -> Result<Json<JobDetails>, AppError> {
    let assessment_type = parse_assessment_type(&assessment_type)?;
    let details = jobs_service.read_job(assessment_type, &job_id).await?;
    Ok(Json(details))
}

/// 删除任务及其发现与失败明细
pub async fn delete_job(
    Path((assessment_type, job_id)): Path<(String, String)>,
    Extension(jobs_service): Extension<Arc<JobsService>>,
) -> Result<StatusCode, AppError> {
    let assessment_type = parse_assessment_type(&assessment_type)?;
    jobs_service.delete_job(assessment_type, &job_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
