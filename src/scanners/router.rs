// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;

use crate::credentials::AccountCredentials;
use crate::domain::models::finding::Finding;
use crate::domain::models::job::AssessmentType;
use crate::scanners::ScanError;

/// 单次按服务扫描的上下文
///
/// 凭证由执行器预先从凭证代理取得，扫描器本身不接触代理。
/// 评估类型决定发现落入哪个分区：同一个扫描器可以同时服务
/// 资源策略评估和策略清单刷新。
pub struct ScanContext {
    pub assessment_type: AssessmentType,
    pub account_id: String,
    pub region: String,
    pub job_id: String,
    pub credentials: AccountCredentials,
    pub finding_retention: Duration,
}

/// 按服务策略扫描器特质
///
/// 新增评估类别的扩展点：实现该特质并注册到注册表即可，
/// 编排器和执行器不需要改动。实现必须在内部捕获全部业务错误，
/// 只允许真正瞬态的条件以 Transient 逃逸。
#[async_trait]
pub trait ServicePolicyScanner: Send + Sync {
    /// 扫描器处理的服务名，与受支持服务表中的取值一致
    fn service_name(&self) -> &'static str;
    /// 在目标账户/区域内扫描该服务的策略，返回发现集
    async fn scan(&self, ctx: &ScanContext) -> Result<Vec<Finding>, ScanError>;
}

/// 按服务扫描器注册表
///
/// 服务名到扫描器的静态映射，启动时装配完成后只读。
/// 未注册的服务由执行器记为业务失败（"Unsupported Service"）。
#[derive(Default)]
pub struct ScannerRegistry {
    scanners: HashMap<&'static str, Arc<dyn ServicePolicyScanner>>,
}

impl ScannerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个扫描器，同名注册覆盖
    pub fn register(mut self, scanner: Arc<dyn ServicePolicyScanner>) -> Self {
        self.scanners.insert(scanner.service_name(), scanner);
        self
    }

    /// 按服务名解析扫描器
    pub fn resolve(&self, service_name: &str) -> Option<Arc<dyn ServicePolicyScanner>> {
        self.scanners.get(service_name).cloned()
    }

    pub fn registered_services(&self) -> Vec<&'static str> {
        self.scanners.keys().copied().collect()
    }
}
