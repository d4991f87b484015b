// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含职位、抓取任务等核心实体以及抓取器契约
pub mod domain;

/// 引擎模块
///
/// 无头浏览器池和页面获取抽象
pub mod engines;

/// 基础设施模块
///
/// 各招聘网站的抓取器实现、来源注册表和指标
pub mod infrastructure;

/// 工具模块
///
/// 提供字段归一化和日志初始化等辅助功能
pub mod utils;

/// 工作器模块
///
/// 多来源抓取任务的调度和汇总
pub mod workers;
