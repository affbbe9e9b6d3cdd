// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施模块
///
/// 数据库连接与实体、仓库实现、云服务网关和指标上报。
pub mod aws;
pub mod database;
pub mod metrics;
pub mod repositories;
