// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 编排器模块
///
/// 任务生命周期、两级有界扇出、访问验证、重试与部分失败语义。
pub mod access_validator;
pub mod account_resolver;
pub mod finalizer;
pub mod runner;
pub mod task_executor;

use thiserror::Error;

use crate::domain::repositories::jobs_repository::RepositoryError;

/// 编排级错误类型
///
/// 只有这一类错误会把任务推到 Failed 终态。账户级拒绝、业务级
/// 扫描失败和重试耗尽的瞬态错误都被容忍为任务失败记录，
/// 不会出现在这里。
#[derive(Error, Debug)]
pub enum OrchestrationError {
    /// 扫描配置不合法（账户选择冲突、格式错误）
    #[error("Invalid scan configuration: {0}")]
    InvalidConfiguration(String),
    /// 账户集合解析失败
    #[error("Account resolution failed: {0}")]
    Resolution(String),
    /// 执行器违反契约（panic 逃逸而不是返回结构化结果）
    #[error("Scan task executor panicked for account {account_id}, service {service_name}")]
    ExecutorPanic {
        account_id: String,
        service_name: String,
    },
    /// 任务存储写入失败
    #[error("Job store error: {0}")]
    Store(#[from] RepositoryError),
}
