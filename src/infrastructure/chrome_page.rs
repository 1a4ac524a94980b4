//! Chrome 页面 - 基础设施层
//!
//! 持有唯一的下单页面，以及一个只用于渲染 PDF 的页面

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, PrintToPdfParams};
use chromiumoxide::element::Element;
use chromiumoxide::{Browser, Page};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::sync::OnceCell;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::{DriverError, ProbeError};
use crate::infrastructure::page_driver::{PageDriver, PdfRenderer};

/// 可见性轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Chrome 页面
///
/// 职责：
/// - 持有下单页面和浏览器句柄
/// - 实现页面能力和 PDF 渲染能力
/// - 不认识订单，不处理业务流程
pub struct ChromePage {
    browser: Arc<Browser>,
    page: Page,
    render_page: OnceCell<Page>,
}

impl ChromePage {
    pub fn new(browser: Arc<Browser>, page: Page) -> Self {
        Self {
            browser,
            page,
            render_page: OnceCell::new(),
        }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue, DriverError> {
        let result = self
            .page
            .evaluate(js_code.into())
            .await
            .map_err(|e| DriverError::cdp("执行脚本", e))?;
        result
            .into_value()
            .map_err(|e| DriverError::cdp("解析脚本结果", e))
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(
        &self,
        js_code: impl Into<String>,
    ) -> Result<T, DriverError> {
        let json_value = self.eval(js_code).await?;
        serde_json::from_value(json_value).map_err(|e| DriverError::cdp("解析脚本结果", e))
    }

    async fn element(&self, selector: &str) -> Result<Element, DriverError> {
        self.page
            .find_element(selector)
            .await
            .map_err(|_| DriverError::ElementNotFound {
                selector: selector.to_string(),
            })
    }

    /// 渲染用页面，首次使用时创建
    async fn render_page(&self) -> Result<&Page, DriverError> {
        self.render_page
            .get_or_try_init(|| async {
                debug!("创建 PDF 渲染页面");
                self.browser
                    .new_page("about:blank")
                    .await
                    .map_err(|e| DriverError::cdp("创建渲染页面", e))
            })
            .await
    }
}

fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

#[async_trait]
impl PageDriver for ChromePage {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| DriverError::cdp(format!("导航到 {}", url), e))?;
        Ok(())
    }

    async fn reload(&self) -> Result<(), DriverError> {
        self.page
            .reload()
            .await
            .map_err(|e| DriverError::cdp("重新加载页面", e))?;
        Ok(())
    }

    async fn exists(&self, selector: &str) -> Result<bool, DriverError> {
        self.eval_as(format!(
            "document.querySelector({}) !== null",
            js_string(selector)
        ))
        .await
    }

    async fn wait_visible(&self, selector: &str, timeout: Duration) -> Result<(), ProbeError> {
        let script = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                if (!el) return false;
                const rect = el.getBoundingClientRect();
                const style = window.getComputedStyle(el);
                return rect.width > 0 && rect.height > 0
                    && style.visibility !== 'hidden' && style.display !== 'none';
            }})()
            "#,
            js_string(selector)
        );

        let deadline = Instant::now() + timeout;
        loop {
            let visible: bool = self.eval_as(script.as_str()).await?;
            if visible {
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(ProbeError::Timeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            sleep(POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    async fn click(&self, selector: &str) -> Result<(), DriverError> {
        self.element(selector)
            .await?
            .click()
            .await
            .map_err(|e| DriverError::cdp(format!("点击 {}", selector), e))?;
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), DriverError> {
        let element = self.element(selector).await?;
        let action = format!("填写 {}", selector);

        element
            .click()
            .await
            .map_err(|e| DriverError::cdp(action.as_str(), e))?;
        element
            .call_js_fn(
                "function() { this.value = ''; this.dispatchEvent(new Event('input', { bubbles: true })); }",
                false,
            )
            .await
            .map_err(|e| DriverError::cdp(action.as_str(), e))?;
        element
            .type_str(value)
            .await
            .map_err(|e| DriverError::cdp(action.as_str(), e))?;

        let current = element
            .call_js_fn("function() { return this.value; }", false)
            .await
            .map_err(|e| DriverError::cdp(action.as_str(), e))?
            .result
            .value
            .and_then(|v| v.as_str().map(str::to_string));

        if current.as_deref() != Some(value) {
            return Err(DriverError::ValueRejected {
                selector: selector.to_string(),
                value: value.to_string(),
            });
        }
        Ok(())
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<(), DriverError> {
        let script = format!(
            r#"
            (() => {{
                const el = document.querySelector({sel});
                if (!el) return 'missing';
                const value = {val};
                if (!Array.from(el.options).some(o => o.value === value)) return 'rejected';
                const setter = Object.getOwnPropertyDescriptor(HTMLSelectElement.prototype, 'value').set;
                setter.call(el, value);
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return 'ok';
            }})()
            "#,
            sel = js_string(selector),
            val = js_string(value)
        );

        let status: String = self.eval_as(script).await?;
        match status.as_str() {
            "ok" => Ok(()),
            "missing" => Err(DriverError::ElementNotFound {
                selector: selector.to_string(),
            }),
            _ => Err(DriverError::ValueRejected {
                selector: selector.to_string(),
                value: value.to_string(),
            }),
        }
    }

    async fn inner_html(&self, selector: &str) -> Result<String, DriverError> {
        let html = self
            .element(selector)
            .await?
            .inner_html()
            .await
            .map_err(|e| DriverError::cdp(format!("读取 {}", selector), e))?;
        Ok(html.unwrap_or_default())
    }

    async fn screenshot(&self, selector: &str, path: &Path) -> Result<(), DriverError> {
        self.element(selector)
            .await?
            .save_screenshot(CaptureScreenshotFormat::Png, path)
            .await
            .map_err(|e| DriverError::cdp(format!("截图 {}", selector), e))?;
        Ok(())
    }
}

#[async_trait]
impl PdfRenderer for ChromePage {
    async fn html_to_pdf(&self, html: &str, output: &Path) -> Result<(), DriverError> {
        let page = self.render_page().await?;
        page.set_content(html)
            .await
            .map_err(|e| DriverError::cdp("写入回执 HTML", e))?;

        let params = PrintToPdfParams::builder().print_background(true).build();
        page.save_pdf(params, output)
            .await
            .map_err(|e| DriverError::cdp("生成 PDF", e))?;
        Ok(())
    }
}
