// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod coordinator_test;
pub mod helpers;
pub mod scraper_flow_test;
