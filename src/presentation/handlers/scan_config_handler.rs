// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::Extension;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::domain::models::job::DomainError;
use crate::domain::models::scan_config::ScanConfiguration;
use crate::domain::repositories::scan_config_repository::ScanConfigRepository;
use crate::presentation::errors::AppError;
use crate::scanners::supported::{SUPPORTED_REGIONS, SUPPORTED_SERVICES};

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceOption {
    pub service_name: &'static str,
    pub service_principal: &'static str,
    pub friendly_name: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegionOption {
    pub region: &'static str,
    pub region_name: &'static str,
}

/// 配置选项响应
///
/// 已保存的模板加上可选的服务与区域全集，供界面构建选择器。
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SelectionOptions {
    pub saved_configurations: Vec<ScanConfiguration>,
    pub supported_services: Vec<ServiceOption>,
    pub supported_regions: Vec<RegionOption>,
}

/// 列出已保存配置与可选取值
pub async fn list_scan_configurations(
    Extension(config_repo): Extension<Arc<dyn ScanConfigRepository>>,
) -> Result<Json<SelectionOptions>, AppError> {
    let saved_configurations = config_repo.find_all().await?;
    let supported_services = SUPPORTED_SERVICES
        .iter()
        .map(|service| ServiceOption {
            service_name: service.service_name,
            service_principal: service.service_principal,
            friendly_name: service.friendly_name,
        })
        .collect();
    let supported_regions = SUPPORTED_REGIONS
        .iter()
        .map(|region| RegionOption {
            region: region.region,
            region_name: region.region_name,
        })
        .collect();
    Ok(Json(SelectionOptions {
        saved_configurations,
        supported_services,
        supported_regions,
    }))
}

/// 保存一份命名扫描配置
pub async fn save_scan_configuration(
    Extension(config_repo): Extension<Arc<dyn ScanConfigRepository>>,
    Json(config): Json<ScanConfiguration>,
) -> Result<Json<ScanConfiguration>, AppError> {
    if config.configuration_name.is_none() {
        return Err(DomainError::ValidationError(
            "ConfigurationName is required".to_string(),
        )
        .into());
    }
    config.validate_name()?;
    config.account_selection()?;

    let saved = config_repo.save(&config).await?;
    Ok(Json(saved))
}
