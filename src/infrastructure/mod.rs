// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 领域层抓取契约的具体实现：
/// - 抓取器（scrapers）：各招聘网站的搜索和详情页解析，以及来源注册表
/// - 指标（metrics）：抓取数量、耗时和失败次数
pub mod metrics;
pub mod scrapers;
