// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use tracing::info;

use crate::domain::models::scan_config::{AccountSelection, ScanConfiguration, ScanScope};
use crate::domain::services::organizations_gateway::OrganizationsGateway;
use crate::orchestrator::OrchestrationError;
use crate::scanners::supported;

/// 账户解析器
///
/// 把扫描配置展开为具体的扇出输入：账户集合加上裁剪后的
/// 服务与区域列表。这里抛出的任何错误都是编排级的，
/// 整个任务直接进入 Failed 终态，不会启动任何扫描。
pub struct AccountResolver {
    gateway: Arc<dyn OrganizationsGateway>,
}

impl AccountResolver {
    pub fn new(gateway: Arc<dyn OrganizationsGateway>) -> Self {
        Self { gateway }
    }

    /// 解析扫描范围
    pub async fn resolve(
        &self,
        config: &ScanConfiguration,
    ) -> Result<ScanScope, OrchestrationError> {
        let selection = config
            .account_selection()
            .map_err(|err| OrchestrationError::InvalidConfiguration(err.to_string()))?;

        let account_ids = match selection {
            AccountSelection::Explicit(ids) => ids,
            AccountSelection::OrgUnits(org_unit_ids) => self
                .gateway
                .list_accounts_for_org_units(&org_unit_ids)
                .await
                .map_err(|err| OrchestrationError::Resolution(err.to_string()))?,
            AccountSelection::AllAccounts => self
                .gateway
                .list_all_active_accounts()
                .await
                .map_err(|err| OrchestrationError::Resolution(err.to_string()))?,
        };

        if account_ids.is_empty() {
            return Err(OrchestrationError::Resolution(
                "Account selection resolved to an empty set".to_string(),
            ));
        }

        let scope = ScanScope {
            account_ids,
            service_names: supported::narrow_services(config.service_names.as_deref()),
            regions: supported::narrow_regions(config.regions.as_deref()),
        };
        info!(
            accounts = scope.account_ids.len(),
            services = scope.service_names.len(),
            regions = scope.regions.len(),
            "Resolved scan scope"
        );
        Ok(scope)
    }
}
