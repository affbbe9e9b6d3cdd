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

use crate::config::settings::DatabaseSettings;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;
use tracing::info;

const DEFAULT_MAX_CONNECTIONS: u32 = 100;
const DEFAULT_MIN_CONNECTIONS: u32 = 10;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 300;

/// 创建数据库连接池
///
/// 生产环境使用 Postgres，sqlite 同样受支持，迁移与仓库实现
/// 在两种后端上行为一致。未配置的池参数取默认值。
/// 扫描扇出会批量落库，SQL 语句日志保持关闭。
pub async fn create_pool(settings: &DatabaseSettings) -> Result<DatabaseConnection, DbErr> {
    let max_connections = settings.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS);
    let connect_timeout = settings
        .connect_timeout
        .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);

    let mut options = ConnectOptions::new(settings.url.clone());
    options
        .max_connections(max_connections)
        .min_connections(settings.min_connections.unwrap_or(DEFAULT_MIN_CONNECTIONS))
        .connect_timeout(Duration::from_secs(connect_timeout))
        .acquire_timeout(Duration::from_secs(connect_timeout))
        .idle_timeout(Duration::from_secs(
            settings.idle_timeout.unwrap_or(DEFAULT_IDLE_TIMEOUT_SECS),
        ))
        .max_lifetime(Duration::from_secs(3600))
        .sqlx_logging(false);

    let pool = Database::connect(options).await?;
    info!(max_connections, "Database pool ready");
    Ok(pool)
}
