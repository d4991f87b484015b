// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理浏览器池、抓取超时与并发、日志等配置
pub mod settings;

pub use settings::{LogFormat, LoggingSettings, ScrapingSettings, Settings};
