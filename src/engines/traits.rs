// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::error::Error as StdError;
use std::time::Duration;
use thiserror::Error;

/// 浏览器错误类型
///
/// 底层驱动的所有失败统一包装为 `Navigation`，并保留原始原因用于日志
#[derive(Error, Debug)]
pub enum BrowserError {
    /// 浏览器启动或连接失败
    #[error("Browser launch failed: {0}")]
    Launch(String),

    /// 导航 / 页面交互失败
    #[error("Navigation failed ({context}): {source}")]
    Navigation {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// 等待条件在截止时间前未满足
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// 浏览器池已关闭
    #[error("Browser pool is closed")]
    PoolClosed,
}

impl BrowserError {
    /// 包装底层错误
    pub fn navigation(
        context: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        BrowserError::Navigation {
            context: context.into(),
            source: source.into(),
        }
    }
}

/// 页面加载后的等待条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitFor {
    /// 等待匹配选择器的元素可见
    Selector(String),
    /// 等待 `document.readyState == "complete"`
    DocumentReady,
    /// 固定延迟
    Delay(Duration),
}

impl WaitFor {
    pub fn selector(selector: impl Into<String>) -> Self {
        WaitFor::Selector(selector.into())
    }
}

/// 懒加载页面的滚动计划
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollPlan {
    /// 滚动到底部的次数
    pub times: u32,
    /// 每次滚动后的等待
    pub delay: Duration,
}

/// 页面获取请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// 目标URL
    pub url: String,
    /// 等待条件
    pub wait: WaitFor,
    /// 本次获取的超时
    pub timeout: Duration,
    /// 可选的滚动计划
    pub scroll: Option<ScrollPlan>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>, wait: WaitFor, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            wait,
            timeout,
            scroll: None,
        }
    }

    pub fn with_scroll(mut self, times: u32, delay: Duration) -> Self {
        self.scroll = Some(ScrollPlan { times, delay });
        self
    }
}

/// 页面获取特质
///
/// 抓取器只依赖该特质而非具体浏览器，测试时可替换为返回固定 HTML 的实现
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// 获取渲染完成后的 HTML
    async fn fetch(&self, request: &FetchRequest) -> Result<String, BrowserError>;

    /// 获取器名称
    fn name(&self) -> &'static str;
}
