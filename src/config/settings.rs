// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含数据库、服务器、云访问、扫描并发与重试等所有配置项
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 服务器配置
    pub server: ServerSettings,
    /// 云访问配置
    pub aws: AwsSettings,
    /// 扫描编排配置
    pub scan: ScanSettings,
    /// 瞬态错误重试配置
    pub retry: RetrySettings,
    /// 指标导出配置
    pub metrics: MetricsSettings,
}

/// 数据库配置设置
#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// 服务器配置设置
#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 云访问配置设置
#[derive(Debug, Deserialize)]
pub struct AwsSettings {
    /// 成员账户中被代入的角色名
    pub spoke_role_name: String,
    /// 角色 ARN 的分区段
    pub partition: String,
    /// 允许代入角色的主体 ARN，逗号分隔；为空时信任当前主体
    pub trusted_principals: Option<String>,
}

/// 扫描编排配置设置
#[derive(Debug, Deserialize)]
pub struct ScanSettings {
    /// 同时处理的账户数上限
    pub account_concurrency: usize,
    /// 单个账户内同时执行的服务×区域任务数上限
    pub task_concurrency: usize,
    /// 任务行与失败明细的保留天数
    pub job_retention_days: i64,
    /// 发现的保留天数
    pub finding_retention_days: i64,
    /// 策略清单发现的保留天数，夜间刷新前即过期
    pub policy_explorer_retention_days: i64,
}

/// 瞬态错误重试配置设置
#[derive(Debug, Deserialize)]
pub struct RetrySettings {
    /// 最大重试次数
    pub max_retries: u32,
    /// 初始退避时间（毫秒）
    pub initial_backoff_ms: u64,
    /// 最大退避时间（毫秒）
    pub max_backoff_ms: u64,
}

/// 指标导出配置设置
#[derive(Debug, Deserialize)]
pub struct MetricsSettings {
    /// Prometheus 导出器监听地址
    pub listen_addr: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Start with default settings
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            // Default DB pool settings
            .set_default("database.max_connections", 100)?
            .set_default("database.min_connections", 10)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            // Default AWS settings
            .set_default("aws.spoke_role_name", "OrgScanSpokeRole")?
            .set_default("aws.partition", "aws")?
            // Default scan settings
            .set_default("scan.account_concurrency", 10)?
            .set_default("scan.task_concurrency", 10)?
            .set_default("scan.job_retention_days", 90)?
            .set_default("scan.finding_retention_days", 90)?
            .set_default("scan.policy_explorer_retention_days", 1)?
            // Default retry settings
            .set_default("retry.max_retries", 3)?
            .set_default("retry.initial_backoff_ms", 1000)?
            .set_default("retry.max_backoff_ms", 60000)?
            // Default metrics settings
            .set_default("metrics.listen_addr", "0.0.0.0:9090")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("ORGSCAN").separator("__"));

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
