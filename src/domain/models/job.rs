// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::finding::Finding;

/// 评估类型枚举
///
/// 定义系统支持的合规评估类别，每种类别对应独立的扫描策略
/// 和独立的发现分区。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssessmentType {
    /// 委托管理员评估，扫描组织内被指定为委托管理员的账户
    DelegatedAdmin,
    /// 可信访问评估，扫描组织内启用了可信服务访问的服务
    TrustedAccess,
    /// 基于资源的策略评估，跨账户跨区域扫描资源策略
    ResourceBasedPolicy,
    /// 策略清单评估，每晚全量刷新的策略浏览器数据
    PolicyExplorer,
}

impl AssessmentType {
    /// 判断该评估类型是否采用异步扇出执行
    ///
    /// 同步类型在一次请求内完成扫描并落库；异步类型仅创建任务记录，
    /// 由编排器在后台完成两级扇出后调用终结器。
    pub fn is_asynchronous(&self) -> bool {
        matches!(
            self,
            AssessmentType::ResourceBasedPolicy | AssessmentType::PolicyExplorer
        )
    }
}

impl fmt::Display for AssessmentType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AssessmentType::DelegatedAdmin => write!(f, "DELEGATED_ADMIN"),
            AssessmentType::TrustedAccess => write!(f, "TRUSTED_ACCESS"),
            AssessmentType::ResourceBasedPolicy => write!(f, "RESOURCE_BASED_POLICY"),
            AssessmentType::PolicyExplorer => write!(f, "POLICY_EXPLORER"),
        }
    }
}

impl FromStr for AssessmentType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DELEGATED_ADMIN" => Ok(AssessmentType::DelegatedAdmin),
            "TRUSTED_ACCESS" => Ok(AssessmentType::TrustedAccess),
            "RESOURCE_BASED_POLICY" => Ok(AssessmentType::ResourceBasedPolicy),
            "POLICY_EXPLORER" => Ok(AssessmentType::PolicyExplorer),
            _ => Err(()),
        }
    }
}

/// 任务状态枚举
///
/// 状态转换遵循以下流程：
/// Queued → Active → Succeeded/Failed
///
/// Queued 是瞬态：编排器开始解析账户集合的那一刻任务即为 Active。
/// 单个扫描任务的失败不影响终态，只有逃逸出整个扇出的编排级
/// 异常才会把任务置为 Failed。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// 已入队，尚未开始解析账户集合
    #[default]
    Queued,
    /// 活跃中，扇出正在执行
    Active,
    /// 已成功，所有账户处理完毕（允许存在被容忍的任务失败）
    Succeeded,
    /// 已失败，编排级异常中断了扇出
    Failed,
}

impl JobStatus {
    /// 判断是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "QUEUED"),
            JobStatus::Active => write!(f, "ACTIVE"),
            JobStatus::Succeeded => write!(f, "SUCCEEDED"),
            JobStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "QUEUED" => Ok(JobStatus::Queued),
            "ACTIVE" => Ok(JobStatus::Active),
            "SUCCEEDED" => Ok(JobStatus::Succeeded),
            "FAILED" => Ok(JobStatus::Failed),
            _ => Err(()),
        }
    }
}

/// 任务实体
///
/// 表示一次跨账户扫描的完整生命周期记录。身份键为
/// (AssessmentType, JobId)。由编排器写入 Active 状态，
/// 由终结器写入唯一一次终态。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Job {
    /// 评估类型
    pub assessment_type: AssessmentType,
    /// 任务唯一标识符（同一评估类型内唯一）
    pub job_id: String,
    /// 任务状态
    #[serde(rename = "JobStatus")]
    pub status: JobStatus,
    /// 开始时间
    pub started_at: DateTime<FixedOffset>,
    /// 发起者标识
    pub started_by: String,
    /// 结束时间，仅终态设置
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<FixedOffset>>,
    /// 编排级错误信息，仅 Failed 状态携带
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// 过期时间，到期后由维护工作器回收
    pub expires_at: DateTime<FixedOffset>,
}

/// 领域错误类型
#[derive(Error, Debug)]
pub enum DomainError {
    /// 无效的状态转换
    #[error("Invalid state transition")]
    InvalidStateTransition,

    /// 验证错误，输入数据不符合领域规则
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl Job {
    /// 创建一个新的任务记录，状态为 Active
    ///
    /// Queued 状态是瞬态的：任务记录在编排器接受请求的那一刻落库，
    /// 此后任何发现和任务失败记录引用的 JobId 都已存在。
    pub fn new(assessment_type: AssessmentType, started_by: String, retention: Duration) -> Self {
        let now: DateTime<FixedOffset> = Utc::now().into();
        Self {
            assessment_type,
            job_id: Uuid::new_v4().simple().to_string(),
            status: JobStatus::Active,
            started_at: now,
            started_by,
            finished_at: None,
            error: None,
            expires_at: now + retention,
        }
    }

    /// 写入终态
    ///
    /// 只允许从 Active 转换到 Succeeded/Failed；重复写入相同终态
    /// 是幂等的（终结器在基础设施层重试时依赖该语义）。
    pub fn finish(
        mut self,
        status: JobStatus,
        error: Option<String>,
    ) -> Result<Self, DomainError> {
        if !status.is_terminal() {
            return Err(DomainError::InvalidStateTransition);
        }
        match self.status {
            JobStatus::Active => {
                self.status = status;
                self.finished_at = Some(Utc::now().into());
                self.error = error;
                Ok(self)
            }
            current if current == status => Ok(self),
            _ => Err(DomainError::InvalidStateTransition),
        }
    }
}

/// 任务失败记录
///
/// 一条 (账户, 服务) 扫描任务在执行器内部处理后仍无法完成时写入。
/// 只追加、不修改；访问验证失败的账户以空 ServiceName 记录。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskFailure {
    /// 记录标识
    pub id: Uuid,
    /// 评估类型
    pub assessment_type: AssessmentType,
    /// 所属任务ID
    pub job_id: String,
    /// 失败的服务名，账户级失败时为空字符串
    pub service_name: String,
    /// 目标账户ID
    pub account_id: String,
    /// 目标区域，账户级失败时为空字符串
    pub region: String,
    /// 失败时间
    pub failed_at: DateTime<FixedOffset>,
    /// 错误详情
    pub error: String,
    /// 过期时间
    pub expires_at: DateTime<FixedOffset>,
}

impl TaskFailure {
    /// 创建一条新的任务失败记录
    pub fn new(
        assessment_type: AssessmentType,
        job_id: String,
        service_name: String,
        account_id: String,
        region: String,
        error: String,
        retention: Duration,
    ) -> Self {
        let now: DateTime<FixedOffset> = Utc::now().into();
        Self {
            id: Uuid::new_v4(),
            assessment_type,
            job_id,
            service_name,
            account_id,
            region,
            failed_at: now,
            error,
            expires_at: now + retention,
        }
    }
}

/// 最近任务标记
///
/// 每种评估类型保留一条，用于快速回答"最近一次任务"
/// 以及拒绝同类型任务并发启动。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobMarker {
    pub assessment_type: AssessmentType,
    pub job_id: String,
    #[serde(rename = "JobStatus")]
    pub status: JobStatus,
    pub expires_at: DateTime<FixedOffset>,
}

impl JobMarker {
    /// 从任务记录生成标记
    pub fn of(job: &Job) -> Self {
        Self {
            assessment_type: job.assessment_type,
            job_id: job.job_id.clone(),
            status: job.status,
            expires_at: job.expires_at,
        }
    }
}

/// 任务详情
///
/// "读取任务详情"接口的聚合返回：任务记录、该任务产生的全部发现、
/// 以及被容忍的任务失败列表。任务 Succeeded 且失败列表非空是
/// 预期形态，不是异常。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobDetails {
    pub job: Job,
    pub findings: Vec<Finding>,
    pub task_failures: Vec<TaskFailure>,
}
