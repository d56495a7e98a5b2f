//! 页面渲染模块
//!
//! 此模块负责：
//! - 使用无头Chrome打开页面，等待脚本执行后取回渲染后的HTML
//! - 在没有浏览器的环境下，使用Monolith做不执行脚本的静态抓取
//! - 按配置的次数重试，线性退避
//!
//! 每次渲染都启动独立的浏览器会话，取回HTML后立即关闭，会话不在页面之间复用。

// 标准库导入
use std::ffi::OsStr;

// 第三方crate导入
use anyhow::anyhow;
use headless_chrome::{Browser, LaunchOptionsBuilder};
use tracing::{debug, info, warn};

// 本地模块导入
use crate::api_constants::crawler_config;
use crate::config::RenderConfig;
use crate::error::{MirrorError, Result};

/// 把URL渲染成HTML的后端
#[allow(async_fn_in_trait)]
pub trait PageRenderer {
    /// 返回页面完整渲染后的HTML
    async fn render(&self, url: &str) -> Result<String>;
}

/// 无头Chrome渲染器
#[derive(Debug, Clone, Default)]
pub struct ChromeRenderer {
    config: RenderConfig,
}

impl ChromeRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }
}

/// 在blocking线程中完成一次完整的浏览器会话
fn render_with_chrome(url: &str, config: &RenderConfig) -> anyhow::Result<String> {
    let args: Vec<&OsStr> = vec![
        OsStr::new("--disable-gpu"),
        OsStr::new("--disable-dev-shm-usage"),
        OsStr::new("--no-first-run"),
        OsStr::new("--no-default-browser-check"),
        OsStr::new("--hide-scrollbars"),
    ];

    let launch_opts = LaunchOptionsBuilder::default()
        .headless(true)
        .path(config.chrome_path.clone())
        .idle_browser_timeout(config.timeout)
        .args(args)
        .build()
        .map_err(|e| anyhow!("浏览器启动参数无效: {}", e))?;

    let browser = Browser::new(launch_opts)?;
    let tab = browser.new_tab()?;
    tab.set_default_timeout(config.timeout);

    if let Some(user_agent) = &config.user_agent {
        tab.set_user_agent(user_agent, None, None)?;
    }

    tab.navigate_to(url)?;
    tab.wait_until_navigated()?;
    std::thread::sleep(config.settle);

    let html = tab.get_content()?;

    // 关闭浏览器进程，释放本页会话
    drop(tab);
    drop(browser);

    Ok(html)
}

impl PageRenderer for ChromeRenderer {
    async fn render(&self, url: &str) -> Result<String> {
        render_with_retry(url, self.config.attempts, move || async move {
            let target_url = url.to_string();
            let config = self.config.clone();

            let task =
                tokio::task::spawn_blocking(move || render_with_chrome(&target_url, &config));
            let result = task
                .await
                .map_err(|e| crate::mirror_error!(render, url, format!("渲染任务执行失败: {}", e)))?;

            let html = result.map_err(|e| crate::mirror_error!(render, url, e))?;
            info!("✅ 页面渲染完成，大小: {} 字节", html.len());
            Ok::<String, MirrorError>(html)
        })
        .await
    }
}

/// 使用Monolith的静态抓取渲染器（不执行JavaScript）
#[derive(Debug, Clone, Default)]
pub struct StaticRenderer {
    config: RenderConfig,
}

impl StaticRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let user_agent = self
            .config
            .user_agent
            .clone()
            .unwrap_or_else(|| crawler_config::DEFAULT_USER_AGENT.to_string());

        // 只取HTML本身，不内嵌任何资源
        let mut options = monolith::core::Options {
            no_css: true,
            no_js: true,
            no_images: true,
            user_agent: Some(user_agent),
            timeout: self.config.timeout.as_secs(),
            ignore_errors: false,
            silent: true,
            ..Default::default()
        };

        debug!("Monolith选项: timeout={}s", options.timeout);

        let target_url = url.to_string();
        let result = tokio::task::spawn_blocking(move || {
            use monolith::cache::Cache;
            use monolith::core::create_monolithic_document;

            let mut cache: Option<Cache> = Some(Cache::new(0, None));
            create_monolithic_document(target_url, &mut options, &mut cache)
        })
        .await
        .map_err(|e| crate::mirror_error!(render, url, format!("Monolith任务执行失败: {}", e)))?;

        let (html_bytes, title) =
            result.map_err(|e| crate::mirror_error!(render, url, format!("Monolith抓取失败: {}", e)))?;

        if let Some(page_title) = title {
            debug!("📄 网页标题: {}", page_title);
        }

        let html = String::from_utf8(html_bytes)
            .map_err(|e| crate::mirror_error!(render, url, format!("页面不是有效的UTF-8: {}", e)))?;
        info!("✅ 静态抓取完成，大小: {} 字节", html.len());

        Ok(html)
    }
}

impl PageRenderer for StaticRenderer {
    async fn render(&self, url: &str) -> Result<String> {
        render_with_retry(url, self.config.attempts, move || self.fetch(url)).await
    }
}

/// 带重试机制的渲染
///
/// `attempts` 为总尝试次数；第 n 次失败后等待 n × 基数 再试。
pub async fn render_with_retry<F, Fut>(
    url: &str,
    attempts: u32,
    mut render_once: F,
) -> Result<String>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<String>>,
{
    let attempts = attempts.max(1);
    let mut last_error: Option<MirrorError> = None;

    for attempt in 1..=attempts {
        debug!("🔄 渲染 {} (第 {} 次)", url, attempt);

        match render_once().await {
            Ok(html) => {
                if attempt > 1 {
                    info!("✅ 重试成功！");
                }
                return Ok(html);
            }
            Err(e) => {
                warn!("❌ 渲染失败 (尝试 {}/{}): {}", attempt, attempts, e);
                last_error = Some(e);

                if attempt < attempts {
                    let delay = std::time::Duration::from_millis(
                        attempt as u64 * crawler_config::RETRY_DELAY_BASE_MS,
                    );
                    info!("⏳ 等待 {:?} 后重试...", delay);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| crate::mirror_error!(render, url, "所有重试尝试均失败")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn test_single_attempt_propagates_first_error() {
        let calls = Cell::new(0);
        let result = render_with_retry("https://site.com", 1, || {
            calls.set(calls.get() + 1);
            async {
                Err::<String, MirrorError>(crate::mirror_error!(render, "https://site.com", "boom"))
            }
        })
        .await;

        assert_eq!(calls.get(), 1);
        assert!(matches!(result, Err(MirrorError::Render { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_after_failure() {
        let calls = Cell::new(0);
        let result = render_with_retry("https://site.com", 3, || {
            calls.set(calls.get() + 1);
            let attempt = calls.get();
            async move {
                if attempt < 2 {
                    Err(crate::mirror_error!(network, "connection reset"))
                } else {
                    Ok("<html></html>".to_string())
                }
            }
        })
        .await;

        assert_eq!(calls.get(), 2);
        assert_eq!(result.unwrap(), "<html></html>");
    }

    #[test]
    fn test_render_config_defaults() {
        let renderer = ChromeRenderer::default();

        assert_eq!(renderer.config().attempts, 1);
        assert!(renderer.config().chrome_path.is_none());
        assert!(renderer.config().user_agent.is_none());
    }
}
