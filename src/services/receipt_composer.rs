//! 回执生成服务 - 业务能力层
//!
//! 截图 + 回执 HTML → PDF，文件名只由订单号决定，重复运行直接覆盖

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{AppResult, OrderError};
use crate::infrastructure::{PageDriver, PdfRenderer};
use crate::services::selectors;

/// 单个订单的产物
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptArtifact {
    pub order_number: u32,
    pub screenshot_path: PathBuf,
    pub pdf_path: PathBuf,
}

/// 回执生成服务
pub struct ReceiptComposer {
    screenshots_dir: PathBuf,
    receipts_dir: PathBuf,
}

impl ReceiptComposer {
    pub fn new(screenshots_dir: impl Into<PathBuf>, receipts_dir: impl Into<PathBuf>) -> Self {
        Self {
            screenshots_dir: screenshots_dir.into(),
            receipts_dir: receipts_dir.into(),
        }
    }

    pub fn screenshot_path(&self, order_number: u32) -> PathBuf {
        self.screenshots_dir
            .join(format!("screenshot_{}.png", order_number))
    }

    pub fn pdf_path(&self, order_number: u32) -> PathBuf {
        self.receipts_dir.join(format!("receipt_{}.pdf", order_number))
    }

    /// 删除该订单之前留下的截图和 PDF
    pub fn discard(&self, order_number: u32) -> AppResult<()> {
        for path in [self.screenshot_path(order_number), self.pdf_path(order_number)] {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!("已删除旧文件: {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(OrderError::io(path, e)),
            }
        }
        Ok(())
    }

    /// 读取页面上的回执 HTML
    pub async fn read_receipt_html<D: PageDriver>(
        &self,
        page: &D,
        order_number: u32,
    ) -> AppResult<String> {
        page.inner_html(selectors::RECEIPT)
            .await
            .map_err(|e| OrderError::CaptureFailed {
                order_number,
                reason: e.to_string(),
            })
    }

    /// 对机器人预览图截图
    pub async fn capture<D: PageDriver>(&self, page: &D, order_number: u32) -> AppResult<PathBuf> {
        let path = self.screenshot_path(order_number);
        page.screenshot(selectors::PREVIEW_IMAGE, &path)
            .await
            .map_err(|e| OrderError::CaptureFailed {
                order_number,
                reason: e.to_string(),
            })?;

        debug!("[订单 {}] 截图已保存: {}", order_number, path.display());
        Ok(path)
    }

    /// 合成回执 PDF
    pub async fn compose_pdf<R: PdfRenderer>(
        &self,
        renderer: &R,
        order_number: u32,
        receipt_html: &str,
        screenshot_path: &Path,
    ) -> AppResult<ReceiptArtifact> {
        let render_failed = |reason: String| OrderError::RenderFailed {
            order_number,
            reason,
        };

        let screenshot = tokio::fs::read(screenshot_path).await.map_err(|e| {
            render_failed(format!("无法读取截图 {}: {}", screenshot_path.display(), e))
        })?;

        let html = build_receipt_html(receipt_html, &screenshot);
        let pdf_path = self.pdf_path(order_number);

        renderer
            .html_to_pdf(&html, &pdf_path)
            .await
            .map_err(|e| render_failed(e.to_string()))?;

        info!("[订单 {}] ✓ 回执已保存: {}", order_number, pdf_path.display());

        Ok(ReceiptArtifact {
            order_number,
            screenshot_path: screenshot_path.to_path_buf(),
            pdf_path,
        })
    }
}

/// 拼接完整的回执 HTML，截图以 data URI 嵌入
pub fn build_receipt_html(receipt_html: &str, screenshot_png: &[u8]) -> String {
    let encoded = STANDARD.encode(screenshot_png);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
</head>
<body>
    <div>
        {receipt_html}
    </div>
    <div style="margin: 100px auto; display: flex; justify-content: center; width: 200px;">
        <img src="data:image/png;base64,{encoded}" alt="Robot Preview" style="max-width: 100%; height: auto;">
    </div>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::fake_page::FakePage;
    use tempfile::TempDir;

    fn composer(dir: &TempDir) -> ReceiptComposer {
        let composer = ReceiptComposer::new(dir.path().join("shots"), dir.path().join("pdf"));
        std::fs::create_dir_all(dir.path().join("shots")).unwrap();
        std::fs::create_dir_all(dir.path().join("pdf")).unwrap();
        composer
    }

    #[test]
    fn test_paths_derive_from_order_number() {
        let composer = ReceiptComposer::new("shots", "pdf");
        assert_eq!(composer.screenshot_path(12), PathBuf::from("shots/screenshot_12.png"));
        assert_eq!(composer.pdf_path(12), PathBuf::from("pdf/receipt_12.pdf"));
    }

    #[test]
    fn test_receipt_html_embeds_screenshot() {
        let html = build_receipt_html("<p>Receipt</p>", b"png-bytes");
        assert!(html.contains("<p>Receipt</p>"));
        assert!(html.contains(&format!("data:image/png;base64,{}", STANDARD.encode(b"png-bytes"))));
        assert!(html.contains("charset=\"UTF-8\""));
    }

    #[tokio::test]
    async fn test_capture_and_compose() {
        let dir = TempDir::new().unwrap();
        let composer = composer(&dir);
        let page = FakePage::storefront();

        let html = composer.read_receipt_html(&page, 3).await.unwrap();
        let shot = composer.capture(&page, 3).await.unwrap();
        let artifact = composer.compose_pdf(&page, 3, &html, &shot).await.unwrap();

        assert!(artifact.screenshot_path.ends_with("screenshot_3.png"));
        assert!(artifact.pdf_path.ends_with("receipt_3.pdf"));
        assert!(artifact.pdf_path.exists());
        assert_eq!(page.rendered_count(), 1);
    }

    #[tokio::test]
    async fn test_rerun_overwrites_same_files() {
        let dir = TempDir::new().unwrap();
        let composer = composer(&dir);
        let page = FakePage::storefront();

        for _ in 0..2 {
            let shot = composer.capture(&page, 8).await.unwrap();
            composer.compose_pdf(&page, 8, "<p/>", &shot).await.unwrap();
        }

        assert_eq!(std::fs::read_dir(dir.path().join("pdf")).unwrap().count(), 1);
        assert_eq!(std::fs::read_dir(dir.path().join("shots")).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_discard_removes_previous_outputs() {
        let dir = TempDir::new().unwrap();
        let composer = composer(&dir);
        let page = FakePage::storefront();

        let shot = composer.capture(&page, 5).await.unwrap();
        composer.compose_pdf(&page, 5, "<p/>", &shot).await.unwrap();

        composer.discard(5).unwrap();
        assert!(!composer.screenshot_path(5).exists());
        assert!(!composer.pdf_path(5).exists());

        // 文件不存在时也不报错
        composer.discard(5).unwrap();
    }

    #[tokio::test]
    async fn test_missing_preview_is_capture_failure() {
        let dir = TempDir::new().unwrap();
        let page = FakePage::storefront().with_missing(selectors::PREVIEW_IMAGE);

        let err = composer(&dir).capture(&page, 5).await.unwrap_err();
        assert!(matches!(err, OrderError::CaptureFailed { order_number: 5, .. }));
    }

    #[tokio::test]
    async fn test_renderer_error_is_render_failure() {
        let dir = TempDir::new().unwrap();
        let composer = composer(&dir);
        let page = FakePage::storefront().with_render_failure();

        let shot = composer.capture(&page, 6).await.unwrap();
        let err = composer.compose_pdf(&page, 6, "<p/>", &shot).await.unwrap_err();

        assert!(matches!(err, OrderError::RenderFailed { order_number: 6, .. }));
        assert!(!composer.pdf_path(6).exists());
    }
}
