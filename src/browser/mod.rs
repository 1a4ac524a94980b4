//! 浏览器获取
//!
//! 按配置启动无头浏览器或连接到已有浏览器，并为会话创建唯一的下单页面

pub mod connection;
pub mod headless;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{BrowserMode, Config};
use crate::error::{AppResult, DriverError, OrderError};
use crate::infrastructure::{ChromePage, PageFactory};

pub use connection::connect_to_browser;
pub use headless::launch_headless_browser;

/// Chrome 页面工厂
///
/// 浏览器在第一次 `open` 时才启动，订单数据校验失败时不会碰浏览器
pub struct ChromeFactory {
    mode: BrowserMode,
    debug_port: u16,
    executable: Option<PathBuf>,
}

impl ChromeFactory {
    pub fn new(config: &Config) -> Self {
        Self {
            mode: config.browser_mode,
            debug_port: config.browser_debug_port,
            executable: config.chrome_executable.clone(),
        }
    }
}

#[async_trait]
impl PageFactory for ChromeFactory {
    type Page = ChromePage;

    async fn open(&self) -> AppResult<ChromePage> {
        let browser = match self.mode {
            BrowserMode::Headless => launch_headless_browser(self.executable.as_deref()).await?,
            BrowserMode::Attach => connect_to_browser(self.debug_port).await?,
        };
        let browser = Arc::new(browser);

        let page = browser.new_page("about:blank").await.map_err(|e| {
            OrderError::browser("创建页面", DriverError::cdp("new_page", e))
        })?;
        info!("✓ 浏览器页面已就绪");

        Ok(ChromePage::new(browser, page))
    }
}
