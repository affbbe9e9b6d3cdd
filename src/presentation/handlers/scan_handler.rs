// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::extract::{Extension, Path};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::domain::models::job::{AssessmentType, DomainError, Job};
use crate::domain::models::scan_config::ScanConfiguration;
use crate::domain::repositories::jobs_repository::RepositoryError;
use crate::domain::repositories::scan_config_repository::ScanConfigRepository;
use crate::orchestrator::runner::AssessmentRunner;
use crate::presentation::errors::AppError;

/// 启动扫描请求
///
/// 给出 ConfigurationName 时按名称加载已保存的模板，
/// 否则按内联字段构造扫描配置。两者都省略表示全组织默认扫描。
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct StartScanRequest {
    #[validate(length(min = 1, max = 64))]
    pub configuration_name: Option<String>,
    pub account_ids: Option<Vec<String>>,
    pub org_unit_ids: Option<Vec<String>>,
    pub regions: Option<Vec<String>>,
    pub service_names: Option<Vec<String>>,
}

fn parse_assessment_type(value: &str) -> Result<AssessmentType, DomainError> {
    value
        .parse()
        .map_err(|_| DomainError::ValidationError(format!("Unknown assessment type: {value}")))
}

fn started_by(headers: &HeaderMap) -> String {
    headers
        .get("x-started-by")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("system")
        .to_string()
}

/// 启动一次评估扫描
///
/// 同步类别（委托管理员、可信访问）在本次请求内完成并返回终态任务；
/// 异步类别返回 Active 任务，调用方凭任务ID轮询。
pub async fn start_scan(
    Path(assessment_type): Path<String>,
    Extension(runner): Extension<Arc<AssessmentRunner>>,
    Extension(config_repo): Extension<Arc<dyn ScanConfigRepository>>,
    headers: HeaderMap,
    body: Option<Json<StartScanRequest>>,
) -> Result<Json<Job>, AppError> {
    let assessment_type = parse_assessment_type(&assessment_type)?;
    let request = body.map(|Json(request)| request).unwrap_or_default();
    request
        .validate()
        .map_err(|err| DomainError::ValidationError(err.to_string()))?;

    let config = match &request.configuration_name {
        Some(name) => config_repo
            .find_by_name(name)
            .await?
            .ok_or(RepositoryError::NotFound)?,
        None => ScanConfiguration {
            configuration_name: None,
            account_ids: request.account_ids,
            org_unit_ids: request.org_unit_ids,
            regions: request.regions,
            service_names: request.service_names,
            expires_at: None,
        },
    };
    // 账户选择冲突与格式错误在任何任务开始前拒绝
    config.account_selection()?;

    let job = runner
        .start(assessment_type, config, started_by(&headers))
        .await?;
    info!(%assessment_type, job_id = %job.job_id, status = %job.status, "Scan requested");
    Ok(Json(job))
}
