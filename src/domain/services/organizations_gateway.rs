// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::finding::TrustedAccessRecord;

/// 组织网关错误类型
#[derive(Error, Debug)]
pub enum GatewayError {
    /// 组织管理接口调用失败
    #[error("Organizations API error: {0}")]
    Api(String),
}

/// 组织信息
#[derive(Debug, Clone)]
pub struct OrganizationInfo {
    /// 组织标识
    pub organization_id: String,
    /// 管理账户ID
    pub management_account_id: String,
}

/// 委托管理员账户
#[derive(Debug, Clone)]
pub struct DelegatedAdminAccount {
    pub account_id: String,
    pub arn: String,
    pub email: String,
    pub name: String,
    pub status: String,
    pub joined_method: String,
    pub joined_timestamp: String,
}

/// 账户上启用的委托服务
#[derive(Debug, Clone)]
pub struct DelegatedService {
    pub service_principal: String,
    pub delegation_enabled_date: String,
}

/// 组织网关特质
///
/// 管理账户侧的组织查询接口。账户解析器用它展开扫描范围，
/// 同步扫描策略用它采集组织级发现。所有方法只读、可重入。
#[async_trait]
pub trait OrganizationsGateway: Send + Sync {
    /// 读取组织信息
    async fn describe_organization(&self) -> Result<OrganizationInfo, GatewayError>;
    /// 列出被指定为委托管理员的账户
    async fn list_delegated_administrators(
        &self,
    ) -> Result<Vec<DelegatedAdminAccount>, GatewayError>;
    /// 列出某账户被委托管理的服务
    async fn list_delegated_services_for_account(
        &self,
        account_id: &str,
    ) -> Result<Vec<DelegatedService>, GatewayError>;
    /// 列出启用了可信访问的服务主体
    async fn list_enabled_service_principals(
        &self,
    ) -> Result<Vec<TrustedAccessRecord>, GatewayError>;
    /// 列出组织内全部活跃账户
    async fn list_all_active_accounts(&self) -> Result<Vec<String>, GatewayError>;
    /// 列出给定组织单元直接挂载的账户
    async fn list_accounts_for_org_units(
        &self,
        org_unit_ids: &[String],
    ) -> Result<Vec<String>, GatewayError>;
}
