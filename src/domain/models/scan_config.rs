// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::models::job::DomainError;

static ORG_UNIT_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new("^ou-[a-z0-9]{4,32}-[a-z0-9]{8,32}$").unwrap());
static ACCOUNT_ID_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new("^[0-9]{12}$").unwrap());
static CONFIG_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[a-zA-Z0-9_-]{1,64}$").unwrap());

/// 扫描配置
///
/// 可命名、可复用的扫描请求模板。AccountIds/OrgUnitIds 至多给出一个，
/// 决定账户选择策略；两者都省略表示扫描组织内全部账户。
/// Regions/ServiceNames 省略表示"全部支持的"。保存后不可变。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScanConfiguration {
    /// 模板名称，内联请求可省略
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_name: Option<String>,
    /// 显式账户列表
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_ids: Option<Vec<String>>,
    /// 组织单元列表，展开为其下全部账户
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_unit_ids: Option<Vec<String>>,
    /// 目标区域列表
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<String>>,
    /// 目标服务列表
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_names: Option<Vec<String>>,
    /// 过期时间，持久化时设置
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<FixedOffset>>,
}

/// 账户选择策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountSelection {
    /// 显式账户列表
    Explicit(Vec<String>),
    /// 组织单元下的全部账户
    OrgUnits(Vec<String>),
    /// 组织内全部活跃账户
    AllAccounts,
}

/// 解析后的扫描范围
///
/// 账户选择策略已展开为具体账户集合，服务与区域已裁剪为
/// 受支持的取值。编排器的扇出输入。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanScope {
    pub account_ids: Vec<String>,
    pub service_names: Vec<String>,
    pub regions: Vec<String>,
}

impl ScanConfiguration {
    /// 求取账户选择策略
    ///
    /// AccountIds 和 OrgUnitIds 同时给出视为验证错误；给出的取值
    /// 必须通过格式校验。
    pub fn account_selection(&self) -> Result<AccountSelection, DomainError> {
        match (&self.account_ids, &self.org_unit_ids) {
            (Some(_), Some(_)) => Err(DomainError::ValidationError(
                "AccountIds and OrgUnitIds are mutually exclusive".to_string(),
            )),
            (Some(accounts), None) => {
                let invalid: Vec<&String> = accounts
                    .iter()
                    .filter(|id| !ACCOUNT_ID_REGEX.is_match(id))
                    .collect();
                if invalid.is_empty() {
                    Ok(AccountSelection::Explicit(accounts.clone()))
                } else {
                    Err(DomainError::ValidationError(format!(
                        "Invalid AccountIds: {}",
                        invalid
                            .iter()
                            .map(|s| s.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    )))
                }
            }
            (None, Some(org_units)) => {
                let invalid: Vec<&String> = org_units
                    .iter()
                    .filter(|id| !ORG_UNIT_ID_REGEX.is_match(id))
                    .collect();
                if invalid.is_empty() {
                    Ok(AccountSelection::OrgUnits(org_units.clone()))
                } else {
                    Err(DomainError::ValidationError(format!(
                        "Invalid OrgUnitIds: {}",
                        invalid
                            .iter()
                            .map(|s| s.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    )))
                }
            }
            (None, None) => Ok(AccountSelection::AllAccounts),
        }
    }

    /// 校验模板名称
    pub fn validate_name(&self) -> Result<(), DomainError> {
        if let Some(name) = &self.configuration_name {
            if !CONFIG_NAME_REGEX.is_match(name) {
                return Err(DomainError::ValidationError(
                    "Invalid configuration name.".to_string(),
                ));
            }
        }
        Ok(())
    }
}
