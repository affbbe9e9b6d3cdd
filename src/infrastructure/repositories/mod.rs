// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod findings_repo_impl;
pub mod jobs_repo_impl;
pub mod scan_config_repo_impl;
