// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 后台定时任务：过期数据清理和夜间策略清单刷新。
pub mod expiration_worker;
pub mod nightly_worker;
