// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tracing::info;

use crate::domain::models::finding::Finding;
use crate::domain::models::job::AssessmentType;
use crate::domain::services::organizations_gateway::OrganizationsGateway;
use crate::scanners::{ScanError, SynchronousScan};

/// 可信访问扫描策略
///
/// 列出组织内启用了可信服务访问的服务主体。记录是组织级的，
/// 账户字段填管理账户。
pub struct TrustedAccessScan {
    gateway: Arc<dyn OrganizationsGateway>,
    retention: Duration,
}

impl TrustedAccessScan {
    pub fn new(gateway: Arc<dyn OrganizationsGateway>, retention: Duration) -> Self {
        Self { gateway, retention }
    }
}

#[async_trait]
impl SynchronousScan for TrustedAccessScan {
    fn assessment_type(&self) -> AssessmentType {
        AssessmentType::TrustedAccess
    }

    async fn scan(&self, job_id: &str) -> Result<Vec<Finding>, ScanError> {
        let organization = self.gateway.describe_organization().await?;
        let enabled = self.gateway.list_enabled_service_principals().await?;
        info!(
            count = enabled.len(),
            "Found trusted access enabled services"
        );

        Ok(enabled
            .into_iter()
            .map(|record| {
                record.into_finding(&organization.management_account_id, job_id, self.retention)
            })
            .collect())
    }
}
