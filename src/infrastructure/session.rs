//! 浏览器会话 - 基础设施层
//!
//! 整个批次只持有一个页面：第一次 `acquire` 时创建，之后一直返回同一个

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{AppResult, OrderError};
use crate::infrastructure::page_driver::PageDriver;

/// 页面工厂
#[async_trait]
pub trait PageFactory: Send + Sync {
    type Page: PageDriver;

    async fn open(&self) -> AppResult<Self::Page>;
}

/// 共享页面的缓存访问器
///
/// 不做重试，也不会在运行中重建页面
pub struct BrowserSession<F: PageFactory> {
    factory: F,
    page: OnceCell<F::Page>,
}

impl<F: PageFactory> BrowserSession<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            page: OnceCell::new(),
        }
    }

    /// 获取共享页面，首次调用时创建
    pub async fn acquire(&self) -> AppResult<&F::Page> {
        self.page
            .get_or_try_init(|| async {
                info!("🌐 正在创建浏览器页面...");
                self.factory.open().await
            })
            .await
    }

    /// 在共享页面中打开 URL
    pub async fn navigate(&self, url: &str) -> AppResult<()> {
        let page = self.acquire().await?;
        debug!("导航到: {}", url);
        page.navigate(url)
            .await
            .map_err(|e| OrderError::browser(format!("导航到 {}", url), e))
    }

    /// 页面是否已经创建
    pub fn is_acquired(&self) -> bool {
        self.page.initialized()
    }
}
