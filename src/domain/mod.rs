// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务概念，包括：
/// - 领域模型（models）：职位、抓取选项 / 结果和抓取任务
/// - 抓取契约（scraping）：各来源抓取器需要实现的接口
///
/// 领域层不依赖任何具体的浏览器或站点实现。
pub mod models;
pub mod scraping;
