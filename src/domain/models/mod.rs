// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 任务（job）：一次跨账户扫描的生命周期记录及其失败明细
/// - 发现（finding）：扫描任务持久化的结果记录
/// - 扫描配置（scan_config）：可复用的扫描范围模板
pub mod finding;
pub mod job;
pub mod scan_config;
