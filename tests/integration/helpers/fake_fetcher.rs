// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use jobcrawl::engines::traits::{BrowserError, FetchRequest, PageFetcher, WaitFor};
use std::sync::Mutex;
use std::time::Duration;

/// 脚本化响应
#[derive(Clone)]
pub enum FakeResponse {
    Html(String),
    /// 等待条件未满足
    Fail,
    /// 一直不返回
    Hang,
}

struct Route {
    url_contains: String,
    wait: Option<String>,
    response: FakeResponse,
}

/// 按 URL 片段和等待选择器匹配响应的页面获取器，并记录收到的请求
#[derive(Default)]
pub struct FakeFetcher {
    routes: Vec<Route>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// URL 包含 `url_contains` 的请求返回 `response`
    pub fn route(mut self, url_contains: &str, response: FakeResponse) -> Self {
        self.routes.push(Route {
            url_contains: url_contains.to_string(),
            wait: None,
            response,
        });
        self
    }

    /// 同时要求等待选择器完全相同
    pub fn route_wait(mut self, url_contains: &str, wait: &str, response: FakeResponse) -> Self {
        self.routes.push(Route {
            url_contains: url_contains.to_string(),
            wait: Some(wait.to_string()),
            response,
        });
        self
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, BrowserError> {
        self.requests.lock().unwrap().push(request.clone());

        let response = self
            .routes
            .iter()
            .find(|route| {
                request.url.contains(&route.url_contains)
                    && route
                        .wait
                        .as_ref()
                        .map_or(true, |wait| request.wait == WaitFor::Selector(wait.clone()))
            })
            .map(|route| route.response.clone());

        match response {
            Some(FakeResponse::Html(html)) => Ok(html),
            Some(FakeResponse::Fail) | None => Err(BrowserError::Timeout(request.timeout)),
            Some(FakeResponse::Hang) => {
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                Err(BrowserError::Timeout(request.timeout))
            }
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}
