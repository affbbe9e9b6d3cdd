// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scan_config::ScanConfiguration;
use crate::domain::repositories::jobs_repository::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

/// 扫描配置仓库特质
///
/// 命名模板的数据访问接口。模板保存后不可变，同名保存覆盖旧行。
#[async_trait]
pub trait ScanConfigRepository: Send + Sync {
    /// 保存命名模板
    async fn save(&self, config: &ScanConfiguration) -> Result<ScanConfiguration, RepositoryError>;
    /// 按名称查找模板
    async fn find_by_name(&self, name: &str)
        -> Result<Option<ScanConfiguration>, RepositoryError>;
    /// 查找全部模板
    async fn find_all(&self) -> Result<Vec<ScanConfiguration>, RepositoryError>;
    /// 清理过期行，返回删除数量
    async fn purge_expired(&self, now: DateTime<FixedOffset>) -> Result<u64, RepositoryError>;
}
