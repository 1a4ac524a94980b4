//! 页面能力契约 - 基础设施层
//!
//! 上层只通过这里的 trait 操作页面，不直接接触 chromiumoxide

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{DriverError, ProbeError};

/// 页面自动化能力
///
/// 所有方法都以 CSS 选择器定位元素，一个实现对应一个物理页面
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// 导航到 URL 并等待加载完成
    async fn navigate(&self, url: &str) -> Result<(), DriverError>;

    /// 重新加载当前页面（丢弃前端状态）
    async fn reload(&self) -> Result<(), DriverError>;

    /// 元素是否存在于当前文档
    async fn exists(&self, selector: &str) -> Result<bool, DriverError>;

    /// 在 `timeout` 内等待元素可见
    ///
    /// 超时返回 `ProbeError::Timeout`，其他失败返回 `ProbeError::Driver`
    async fn wait_visible(&self, selector: &str, timeout: Duration) -> Result<(), ProbeError>;

    async fn click(&self, selector: &str) -> Result<(), DriverError>;

    /// 清空输入框后写入文本
    async fn fill(&self, selector: &str, value: &str) -> Result<(), DriverError>;

    /// 按选项值选择下拉框
    async fn select_option(&self, selector: &str, value: &str) -> Result<(), DriverError>;

    async fn inner_html(&self, selector: &str) -> Result<String, DriverError>;

    /// 对单个元素截图并保存为 PNG
    async fn screenshot(&self, selector: &str, path: &Path) -> Result<(), DriverError>;
}

/// HTML 转 PDF 能力
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn html_to_pdf(&self, html: &str, output: &Path) -> Result<(), DriverError>;
}
