// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod config;
pub mod credentials;
pub mod domain;
pub mod infrastructure;
pub mod orchestrator;
pub mod presentation;
pub mod scanners;
pub mod utils;
pub mod workers;
