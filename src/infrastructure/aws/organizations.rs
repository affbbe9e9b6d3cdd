// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use aws_sdk_organizations::error::DisplayErrorContext;
use tracing::debug;

use crate::domain::models::finding::TrustedAccessRecord;
use crate::domain::services::organizations_gateway::{
    DelegatedAdminAccount, DelegatedService, GatewayError, OrganizationInfo, OrganizationsGateway,
};

/// 组织网关实现
///
/// 管理账户侧的组织查询。所有列举接口逐页取完，
/// 与控制台看到的完整账户集合一致。
pub struct AwsOrganizationsGateway {
    client: aws_sdk_organizations::Client,
}

impl AwsOrganizationsGateway {
    pub fn new(client: aws_sdk_organizations::Client) -> Self {
        Self { client }
    }
}

fn timestamp_string(value: Option<&aws_smithy_types::DateTime>) -> String {
    value
        .and_then(|t| chrono::DateTime::from_timestamp(t.secs(), 0))
        .map(|t| t.to_rfc3339())
        .unwrap_or_default()
}

fn api_error<E: std::error::Error + Send + Sync + 'static, R: std::fmt::Debug>(
    err: aws_sdk_organizations::error::SdkError<E, R>,
) -> GatewayError {
    GatewayError::Api(DisplayErrorContext(&err).to_string())
}

#[async_trait]
impl OrganizationsGateway for AwsOrganizationsGateway {
    async fn describe_organization(&self) -> Result<OrganizationInfo, GatewayError> {
        let response = self
            .client
            .describe_organization()
            .send()
            .await
            .map_err(api_error)?;
        let organization = response
            .organization()
            .ok_or_else(|| GatewayError::Api("DescribeOrganization returned no organization".to_string()))?;
        Ok(OrganizationInfo {
            organization_id: organization.id().unwrap_or_default().to_string(),
            management_account_id: organization
                .master_account_id()
                .unwrap_or_default()
                .to_string(),
        })
    }

    async fn list_delegated_administrators(
        &self,
    ) -> Result<Vec<DelegatedAdminAccount>, GatewayError> {
        let mut accounts = Vec::new();
        let mut pages = self
            .client
            .list_delegated_administrators()
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            let page = page.map_err(api_error)?;
            for admin in page.delegated_administrators() {
                accounts.push(DelegatedAdminAccount {
                    account_id: admin.id().unwrap_or_default().to_string(),
                    arn: admin.arn().unwrap_or_default().to_string(),
                    email: admin.email().unwrap_or_default().to_string(),
                    name: admin.name().unwrap_or_default().to_string(),
                    status: admin
                        .status()
                        .map(|s| s.as_str().to_string())
                        .unwrap_or_default(),
                    joined_method: admin
                        .joined_method()
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default(),
                    joined_timestamp: timestamp_string(admin.joined_timestamp()),
                });
            }
        }
        debug!(count = accounts.len(), "Listed delegated administrators");
        Ok(accounts)
    }

    async fn list_delegated_services_for_account(
        &self,
        account_id: &str,
    ) -> Result<Vec<DelegatedService>, GatewayError> {
        let mut services = Vec::new();
        let mut pages = self
            .client
            .list_delegated_services_for_account()
            .account_id(account_id)
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            let page = page.map_err(api_error)?;
            for service in page.delegated_services() {
                services.push(DelegatedService {
                    service_principal: service.service_principal().unwrap_or_default().to_string(),
                    delegation_enabled_date: timestamp_string(service.delegation_enabled_date()),
                });
            }
        }
        Ok(services)
    }

    async fn list_enabled_service_principals(
        &self,
    ) -> Result<Vec<TrustedAccessRecord>, GatewayError> {
        let mut records = Vec::new();
        let mut pages = self
            .client
            .list_aws_service_access_for_organization()
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            let page = page.map_err(api_error)?;
            for principal in page.enabled_service_principals() {
                records.push(TrustedAccessRecord {
                    service_principal: principal
                        .service_principal()
                        .unwrap_or_default()
                        .to_string(),
                    date_enabled: timestamp_string(principal.date_enabled()),
                });
            }
        }
        Ok(records)
    }

    async fn list_all_active_accounts(&self) -> Result<Vec<String>, GatewayError> {
        let mut account_ids = Vec::new();
        let mut pages = self.client.list_accounts().into_paginator().send();
        while let Some(page) = pages.next().await {
            let page = page.map_err(api_error)?;
            for account in page.accounts() {
                if account.status() == Some(&aws_sdk_organizations::types::AccountStatus::Active) {
                    if let Some(id) = account.id() {
                        account_ids.push(id.to_string());
                    }
                }
            }
        }
        debug!(count = account_ids.len(), "Listed active organization accounts");
        Ok(account_ids)
    }

    async fn list_accounts_for_org_units(
        &self,
        org_unit_ids: &[String],
    ) -> Result<Vec<String>, GatewayError> {
        let mut account_ids = Vec::new();
        for org_unit_id in org_unit_ids {
            let mut pages = self
                .client
                .list_accounts_for_parent()
                .parent_id(org_unit_id)
                .into_paginator()
                .send();
            while let Some(page) = pages.next().await {
                let page = page.map_err(api_error)?;
                for account in page.accounts() {
                    if let Some(id) = account.id() {
                        account_ids.push(id.to_string());
                    }
                }
            }
        }
        Ok(account_ids)
    }
}
