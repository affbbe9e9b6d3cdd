// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 类别扫描器模块
///
/// 同步的组织级扫描策略（委托管理员、可信访问）以及资源策略
/// 扫描的可插拔按服务扫描器注册表。
pub mod delegated_admin;
pub mod policy_analysis;
pub mod router;
pub mod s3_policy;
pub mod supported;
pub mod trusted_access;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::finding::Finding;
use crate::domain::models::job::AssessmentType;
use crate::domain::services::organizations_gateway::GatewayError;
use crate::utils::retry_policy::{classify_sdk_error, is_retryable_error};
use aws_smithy_types::error::metadata::ProvideErrorMetadata;

/// 扫描错误类型
///
/// 在产生处即打上标签：业务失败由调用方记为任务失败且永不重试，
/// 瞬态失败消耗编排器的重试预算。
#[derive(Error, Debug)]
pub enum ScanError {
    /// 业务级失败（权限不足、资源不存在、不支持的服务）
    #[error("Scan failed: {0}")]
    Business(String),
    /// 瞬态基础设施失败（限流、网络抖动）
    #[error("Transient scan error: {0}")]
    Transient(String),
}

impl ScanError {
    /// 按错误文案对网关错误分类
    pub fn classify(message: String) -> Self {
        if is_retryable_error(&message) {
            ScanError::Transient(message)
        } else {
            ScanError::Business(message)
        }
    }

    /// 按错误码对 SDK 错误分类，Display 本身不携带错误码
    pub fn from_sdk<E>(err: &E) -> Self
    where
        E: std::error::Error + ProvideErrorMetadata,
    {
        let (message, retryable) = classify_sdk_error(err);
        if retryable {
            ScanError::Transient(message)
        } else {
            ScanError::Business(message)
        }
    }
}

impl From<GatewayError> for ScanError {
    fn from(err: GatewayError) -> Self {
        ScanError::classify(err.to_string())
    }
}

/// 同步扫描策略特质
///
/// 同步类别在一次启动请求内完成：扫描、落库、写终态。
/// 与异步类别相对，后者只创建任务记录，由编排器在后台扇出。
#[async_trait]
pub trait SynchronousScan: Send + Sync {
    /// 策略对应的评估类型
    fn assessment_type(&self) -> AssessmentType;
    /// 执行扫描，返回待落库的发现集
    async fn scan(&self, job_id: &str) -> Result<Vec<Finding>, ScanError>;
}
