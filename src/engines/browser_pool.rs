// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{BrowserError, FetchRequest, PageFetcher, WaitFor};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::emulation::SetScriptExecutionDisabledParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OnceCell, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, info, warn};

/// 默认桌面版 Chrome UA
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const CLICK_SETTLE: Duration = Duration::from_secs(1);

/// 浏览器池配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserOptions {
    /// 是否无头模式
    pub headless: bool,
    /// CDP 请求超时（秒）
    pub timeout_secs: u64,
    /// User-Agent
    pub user_agent: String,
    /// 代理地址
    pub proxy_url: Option<String>,
    /// 禁止加载图片
    pub disable_images: bool,
    /// 禁止执行脚本
    pub disable_javascript: bool,
    pub window_width: u32,
    pub window_height: u32,
    /// 最大并发上下文数
    pub max_contexts: usize,
    /// 远程调试地址，设置后连接已有的 Chrome 而不是启动新进程
    pub remote_debugging_url: Option<String>,
    /// Chrome 可执行文件路径
    pub chrome_executable: Option<String>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy_url: None,
            disable_images: true,
            disable_javascript: false,
            window_width: 1920,
            window_height: 1080,
            max_contexts: 4,
            remote_debugging_url: None,
            chrome_executable: None,
        }
    }
}

impl BrowserOptions {
    /// 附加的 Chrome 启动参数
    pub fn launch_args(&self) -> Vec<String> {
        let mut args = vec![
            "--disable-gpu".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
        ];
        if let Some(proxy) = self.proxy_url.as_deref().filter(|p| !p.is_empty()) {
            args.push(format!("--proxy-server={proxy}"));
        }
        if self.disable_images {
            args.push("--blink-settings=imagesEnabled=false".to_string());
        }
        args
    }

    /// 页面模拟的视口，与窗口大小一致
    ///
    /// 不设置时 chromiumoxide 使用 800x600，部分站点会切换到窄屏布局
    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.window_width,
            height: self.window_height,
            ..Default::default()
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(Duration::from_secs(self.timeout_secs))
            .window_size(self.window_width, self.window_height)
            .viewport(self.viewport());

        if !self.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        for arg in self.launch_args() {
            builder = builder.arg(arg);
        }

        builder.build().map_err(BrowserError::Launch)
    }
}

struct BrowserHandle {
    browser: Browser,
    handler: JoinHandle<()>,
}

/// 无头浏览器池
///
/// 浏览器在首次使用时启动并由池持有；上下文数量由信号量限制，
/// 每个上下文对应一个独占的页面。
pub struct BrowserPool {
    options: BrowserOptions,
    browser: OnceCell<BrowserHandle>,
    permits: Arc<Semaphore>,
}

impl BrowserPool {
    pub fn new(options: BrowserOptions) -> Self {
        let permits = Arc::new(Semaphore::new(options.max_contexts.max(1)));
        Self {
            options,
            browser: OnceCell::new(),
            permits,
        }
    }

    pub fn options(&self) -> &BrowserOptions {
        &self.options
    }

    async fn browser(&self) -> Result<&Browser, BrowserError> {
        let handle = self
            .browser
            .get_or_try_init(|| async {
                let (browser, mut handler) = match &self.options.remote_debugging_url {
                    Some(url) => {
                        info!("Connecting to remote Chrome instance at: {}", url);
                        Browser::connect(url)
                            .await
                            .map_err(|e| BrowserError::Launch(e.to_string()))?
                    }
                    None => {
                        info!(
                            headless = self.options.headless,
                            max_contexts = self.options.max_contexts,
                            "Launching Chrome"
                        );
                        Browser::launch(self.options.browser_config()?)
                            .await
                            .map_err(|e| BrowserError::Launch(e.to_string()))?
                    }
                };

                let handler = tokio::spawn(async move {
                    while let Some(event) = handler.next().await {
                        if event.is_err() {
                            break;
                        }
                    }
                });

                Ok::<_, BrowserError>(BrowserHandle { browser, handler })
            })
            .await?;
        Ok(&handle.browser)
    }

    /// 获取一个独占的执行上下文
    ///
    /// 等待空闲上下文的时间也计入 `timeout`；会话在离开作用域时自动释放
    pub async fn acquire(&self, timeout: Duration) -> Result<BrowserSession, BrowserError> {
        let deadline = Instant::now() + timeout;

        let permit = timeout_at(deadline, self.permits.clone().acquire_owned())
            .await
            .map_err(|_| BrowserError::Timeout(timeout))?
            .map_err(|_| BrowserError::PoolClosed)?;

        let browser = timeout_at(deadline, self.browser())
            .await
            .map_err(|_| BrowserError::Timeout(timeout))??;

        let page = timeout_at(deadline, browser.new_page("about:blank"))
            .await
            .map_err(|_| BrowserError::Timeout(timeout))?
            .map_err(|e| BrowserError::navigation("new page", e))?;

        let session = BrowserSession {
            page,
            deadline,
            timeout,
            closed: false,
            _permit: permit,
        };
        session.configure(&self.options).await?;
        Ok(session)
    }

    /// 关闭浏览器池
    ///
    /// 之后的 `acquire` 返回 [`BrowserError::PoolClosed`]
    pub fn shutdown(&self) {
        self.permits.close();
        if let Some(handle) = self.browser.get() {
            handle.handler.abort();
        }
        info!("Browser pool shut down");
    }
}

#[async_trait]
impl PageFetcher for BrowserPool {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, BrowserError> {
        let session = self.acquire(request.timeout).await?;
        session.navigate(&request.url).await?;
        session.wait_for(&request.wait).await?;
        if let Some(plan) = request.scroll {
            session.scroll_to_bottom(plan.times, plan.delay).await?;
        }
        let html = session.html().await?;
        session.close().await;
        Ok(html)
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}

/// 浏览器会话
///
/// 独占一个页面和一个上下文许可，所有操作都受会话截止时间约束
pub struct BrowserSession {
    page: Page,
    deadline: Instant,
    timeout: Duration,
    closed: bool,
    _permit: OwnedSemaphorePermit,
}

impl BrowserSession {
    async fn configure(&self, options: &BrowserOptions) -> Result<(), BrowserError> {
        self.bounded(self.page.set_user_agent(options.user_agent.as_str()))
            .await?
            .map_err(|e| BrowserError::navigation("set user agent", e))?;

        if options.disable_javascript {
            self.bounded(
                self.page
                    .execute(SetScriptExecutionDisabledParams::new(true)),
            )
            .await?
            .map_err(|e| BrowserError::navigation("disable javascript", e))?;
        }
        Ok(())
    }

    async fn bounded<F: Future>(&self, fut: F) -> Result<F::Output, BrowserError> {
        timeout_at(self.deadline, fut)
            .await
            .map_err(|_| BrowserError::Timeout(self.timeout))
    }

    /// 剩余时间
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// 导航到指定 URL
    pub async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        debug!("Navigating to {}", url);
        self.bounded(self.page.goto(url))
            .await?
            .map_err(|e| BrowserError::navigation(format!("goto {url}"), e))?;
        Ok(())
    }

    /// 等待页面条件满足
    pub async fn wait_for(&self, wait: &WaitFor) -> Result<(), BrowserError> {
        match wait {
            WaitFor::Selector(selector) => self.poll_until(&visible_script(selector), self.deadline).await,
            WaitFor::DocumentReady => {
                self.poll_until("document.readyState === 'complete'", self.deadline)
                    .await
            }
            WaitFor::Delay(delay) => self.bounded(sleep(*delay)).await,
        }
    }

    /// 在给定时间内等待元素可见（不超过会话截止时间）
    pub async fn wait_for_element(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let until = (Instant::now() + timeout).min(self.deadline);
        self.poll_until(&visible_script(selector), until).await
    }

    async fn poll_until(&self, script: &str, until: Instant) -> Result<(), BrowserError> {
        let limit = until.saturating_duration_since(Instant::now());
        let poll = async {
            loop {
                let satisfied = self
                    .page
                    .evaluate(script)
                    .await
                    .map_err(|e| BrowserError::navigation("evaluate wait condition", e))?
                    .into_value::<bool>()
                    .unwrap_or(false);
                if satisfied {
                    return Ok::<(), BrowserError>(());
                }
                sleep(POLL_INTERVAL).await;
            }
        };
        timeout_at(until, poll)
            .await
            .map_err(|_| BrowserError::Timeout(limit))?
    }

    /// 当前渲染后的完整 HTML
    pub async fn html(&self) -> Result<String, BrowserError> {
        self.bounded(self.page.content())
            .await?
            .map_err(|e| BrowserError::navigation("read content", e))
    }

    /// 导航、等待并返回 HTML
    pub async fn fetch_page(&self, url: &str, wait: &WaitFor) -> Result<String, BrowserError> {
        self.navigate(url).await?;
        self.wait_for(wait).await?;
        self.html().await
    }

    /// 滚动到底部若干次以触发懒加载
    pub async fn scroll_to_bottom(&self, times: u32, delay: Duration) -> Result<(), BrowserError> {
        for i in 0..times {
            self.bounded(
                self.page
                    .evaluate("window.scrollTo(0, document.body.scrollHeight)"),
            )
            .await?
            .map_err(|e| BrowserError::navigation("scroll", e))?;
            debug!("Scrolled to bottom ({}/{})", i + 1, times);
            self.bounded(sleep(delay)).await?;
        }
        Ok(())
    }

    /// 点击元素并等待目标选择器出现，未指定时固定等待 1 秒
    pub async fn click_and_wait(
        &self,
        selector: &str,
        wait_selector: Option<&str>,
    ) -> Result<(), BrowserError> {
        let element = self
            .bounded(self.page.find_element(selector))
            .await?
            .map_err(|e| BrowserError::navigation(format!("find {selector}"), e))?;
        self.bounded(element.click())
            .await?
            .map_err(|e| BrowserError::navigation(format!("click {selector}"), e))?;

        match wait_selector {
            Some(target) => self.wait_for(&WaitFor::selector(target)).await,
            None => self.bounded(sleep(CLICK_SETTLE)).await,
        }
    }

    /// 填写表单字段
    pub async fn fill_form(&self, selector: &str, value: &str) -> Result<(), BrowserError> {
        let element = self
            .bounded(self.page.find_element(selector))
            .await?
            .map_err(|e| BrowserError::navigation(format!("find {selector}"), e))?;
        self.bounded(element.click())
            .await?
            .map_err(|e| BrowserError::navigation(format!("focus {selector}"), e))?;
        self.bounded(element.type_str(value))
            .await?
            .map_err(|e| BrowserError::navigation(format!("type into {selector}"), e))?;
        Ok(())
    }

    /// 第一个匹配元素的文本，没有匹配时返回 `None`
    pub async fn text(&self, selector: &str) -> Result<Option<String>, BrowserError> {
        let elements = self
            .bounded(self.page.find_elements(selector))
            .await?
            .map_err(|e| BrowserError::navigation(format!("find {selector}"), e))?;
        match elements.first() {
            Some(element) => self
                .bounded(element.inner_text())
                .await?
                .map_err(|e| BrowserError::navigation(format!("text of {selector}"), e)),
            None => Ok(None),
        }
    }

    /// 第一个匹配元素的属性
    pub async fn attribute(
        &self,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        let elements = self
            .bounded(self.page.find_elements(selector))
            .await?
            .map_err(|e| BrowserError::navigation(format!("find {selector}"), e))?;
        match elements.first() {
            Some(element) => self
                .bounded(element.attribute(name))
                .await?
                .map_err(|e| BrowserError::navigation(format!("attribute {name} of {selector}"), e)),
            None => Ok(None),
        }
    }

    /// 所有匹配元素的 outer HTML
    pub async fn elements(&self, selector: &str) -> Result<Vec<String>, BrowserError> {
        let elements = self
            .bounded(self.page.find_elements(selector))
            .await?
            .map_err(|e| BrowserError::navigation(format!("find {selector}"), e))?;

        let mut out = Vec::with_capacity(elements.len());
        for element in &elements {
            if let Some(html) = self
                .bounded(element.outer_html())
                .await?
                .map_err(|e| BrowserError::navigation(format!("outer html of {selector}"), e))?
            {
                out.push(html);
            }
        }
        Ok(out)
    }

    /// 整页 PNG 截图，仅用于诊断
    pub async fn screenshot(&self) -> Result<Vec<u8>, BrowserError> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        self.bounded(self.page.screenshot(params))
            .await?
            .map_err(|e| BrowserError::navigation("screenshot", e))
    }

    /// 显式关闭页面
    pub async fn close(mut self) {
        self.closed = true;
        if let Err(e) = self.page.clone().close().await {
            warn!("Failed to close page: {}", e);
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let page = self.page.clone();
            handle.spawn(async move {
                let _ = page.close().await;
            });
        }
    }
}

/// 判断元素是否可见的脚本
fn visible_script(selector: &str) -> String {
    let quoted = serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        "(() => {{ const el = document.querySelector({quoted}); \
         if (!el) return false; \
         const r = el.getBoundingClientRect(); \
         const s = window.getComputedStyle(el); \
         return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none'; }})()"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = BrowserOptions::default();
        assert!(options.headless);
        assert_eq!(options.max_contexts, 4);
        assert!(options.disable_images);
        assert!(!options.disable_javascript);
    }

    #[test]
    fn test_launch_args() {
        let options = BrowserOptions {
            proxy_url: Some("http://127.0.0.1:8080".into()),
            ..Default::default()
        };
        let args = options.launch_args();
        assert!(args.contains(&"--proxy-server=http://127.0.0.1:8080".to_string()));
        assert!(args.contains(&"--blink-settings=imagesEnabled=false".to_string()));

        let options = BrowserOptions {
            disable_images: false,
            proxy_url: Some(String::new()),
            ..Default::default()
        };
        let args = options.launch_args();
        assert!(!args.iter().any(|a| a.starts_with("--proxy-server")));
        assert!(!args.iter().any(|a| a.starts_with("--blink-settings")));
    }

    #[test]
    fn test_viewport_follows_window_size() {
        let viewport = BrowserOptions::default().viewport();
        assert_eq!((viewport.width, viewport.height), (1920, 1080));
        assert!(!viewport.emulating_mobile);

        let options = BrowserOptions {
            window_width: 1366,
            window_height: 768,
            ..Default::default()
        };
        let viewport = options.viewport();
        assert_eq!((viewport.width, viewport.height), (1366, 768));
    }

    #[test]
    fn test_visible_script_escapes_selector() {
        let script = visible_script("[data-cy='card-title-link']");
        assert!(script.contains(r#"document.querySelector("[data-cy='card-title-link']")"#));
        let script = visible_script(r#"a[title="x"]"#);
        assert!(script.contains(r#""a[title=\"x\"]""#));
    }

    #[tokio::test]
    async fn test_acquire_after_shutdown_fails() {
        let pool = BrowserPool::new(BrowserOptions::default());
        pool.shutdown();
        let result = pool.acquire(Duration::from_secs(1)).await;
        assert!(matches!(result, Err(BrowserError::PoolClosed)));
    }
}
