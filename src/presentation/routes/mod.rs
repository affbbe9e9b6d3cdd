// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::routing::{get, post};
use axum::Router;

use crate::presentation::handlers::{jobs_handler, scan_config_handler, scan_handler};

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// 构建全部路由
///
/// 共享状态（运行器、查询服务、配置仓库）由 main 以 Extension 层注入。
pub fn routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version))
        .route("/v1/scans/{assessment_type}", post(scan_handler::start_scan))
        .route("/v1/jobs", get(jobs_handler::list_jobs))
        .route(
            "/v1/jobs/{assessment_type}/{job_id}",
            get(jobs_handler::get_job).delete(jobs_handler::delete_job),
        )
        .route(
            "/v1/findings/{assessment_type}",
            get(jobs_handler::list_findings),
        )
        .route(
            "/v1/scan-configurations",
            get(scan_config_handler::list_scan_configurations)
                .post(scan_config_handler::save_scan_configuration),
        )
}
