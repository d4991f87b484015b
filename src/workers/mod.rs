// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 多来源抓取任务的执行：并发调度、按来源限速和结果汇总
pub mod coordinator;

pub use coordinator::{CoordinatorConfig, ScrapeCoordinator, ScrapeReport, SourceOutcome};
