// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 展示层
///
/// HTTP 处理器、路由表与统一错误映射。
pub mod errors;
pub mod handlers;
pub mod routes;
