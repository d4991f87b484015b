// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 抓取领域模块
///
/// 定义职位抓取器的统一契约及其错误类型
pub mod scraper;
