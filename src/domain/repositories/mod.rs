// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 具体实现由基础设施层提供。
///
/// 包含的仓库接口：
/// - 任务仓库（jobs_repository）：任务记录、最近任务标记与失败明细
/// - 发现仓库（findings_repository）：扫描结果的分区存储
/// - 扫描配置仓库（scan_config_repository）：命名扫描模板
pub mod findings_repository;
pub mod jobs_repository;
pub mod scan_config_repository;
