// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tracing::{debug, info};

use crate::domain::models::finding::{DelegatedAdminRecord, Finding};
use crate::domain::models::job::AssessmentType;
use crate::domain::services::organizations_gateway::{
    DelegatedAdminAccount, DelegatedService, OrganizationsGateway,
};
use crate::scanners::{ScanError, SynchronousScan};

/// 委托管理员扫描策略
///
/// 在管理账户侧遍历组织内被指定为委托管理员的账户，
/// 并展开每个账户被委托管理的服务主体。组织级扫描，不扇出。
pub struct DelegatedAdminScan {
    gateway: Arc<dyn OrganizationsGateway>,
    retention: Duration,
}

impl DelegatedAdminScan {
    pub fn new(gateway: Arc<dyn OrganizationsGateway>, retention: Duration) -> Self {
        Self { gateway, retention }
    }

    fn denormalize(
        account: &DelegatedAdminAccount,
        service: &DelegatedService,
    ) -> DelegatedAdminRecord {
        DelegatedAdminRecord {
            account_id: account.account_id.clone(),
            service_principal: service.service_principal.clone(),
            arn: account.arn.clone(),
            email: account.email.clone(),
            name: account.name.clone(),
            status: account.status.clone(),
            joined_method: account.joined_method.clone(),
            joined_timestamp: account.joined_timestamp.clone(),
            delegation_enabled_date: service.delegation_enabled_date.clone(),
        }
    }
}

#[async_trait]
impl SynchronousScan for DelegatedAdminScan {
    fn assessment_type(&self) -> AssessmentType {
        AssessmentType::DelegatedAdmin
    }

    async fn scan(&self, job_id: &str) -> Result<Vec<Finding>, ScanError> {
        let admin_accounts = self.gateway.list_delegated_administrators().await?;
        info!(
            count = admin_accounts.len(),
            "Found accounts designated as delegated administrators"
        );

        let mut findings = Vec::new();
        for account in &admin_accounts {
            let services = self
                .gateway
                .list_delegated_services_for_account(&account.account_id)
                .await?;
            debug!(
                account_id = %account.account_id,
                count = services.len(),
                "Found delegated services for account"
            );
            for service in &services {
                findings.push(
                    Self::denormalize(account, service).into_finding(job_id, self.retention),
                );
            }
        }
        Ok(findings)
    }
}
