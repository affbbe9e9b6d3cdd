// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod finding;
pub mod job;
pub mod job_marker;
pub mod scan_config;
pub mod task_failure;
