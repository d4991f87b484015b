// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 职位（job）：抓取得到的职位及其公司信息
/// - 抓取（scrape）：单次抓取的选项与结果
/// - 任务（task）：跨来源抓取请求的生命周期记录
pub mod job;
pub mod scrape;
pub mod task;
