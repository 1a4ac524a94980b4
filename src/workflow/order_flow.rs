//! 订单处理流程 - 流程层
//!
//! 核心职责：定义"一个订单"的完整处理流程
//!
//! 流程顺序：
//! 1. 关闭弹窗
//! 2. 填写表单 → 预览
//! 3. 提交（服务端临时错误时重试）
//! 4. 截图 → 合成回执 PDF

use std::time::Duration;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppResult, DriverError, OrderError, ProbeError};
use crate::infrastructure::{PageDriver, PdfRenderer};
use crate::models::OrderRecord;
use crate::services::{
    selectors, ModalGuard, OrderFormFiller, ReceiptArtifact, ReceiptComposer,
    SubmissionController,
};
use crate::workflow::order_ctx::OrderCtx;

/// 订单处理流程
///
/// - 编排单个订单的所有步骤
/// - 不持有任何资源（page）
/// - 只依赖业务能力（services）
pub struct OrderFlow {
    modal_guard: ModalGuard,
    form_filler: OrderFormFiller,
    submission: SubmissionController,
    composer: ReceiptComposer,
    preview_timeout: Duration,
}

impl OrderFlow {
    pub fn new(config: &Config) -> AppResult<Self> {
        Ok(Self {
            modal_guard: ModalGuard::new(config.modal_timeout()),
            form_filler: OrderFormFiller::new()?,
            submission: SubmissionController::from_config(config),
            composer: ReceiptComposer::new(&config.screenshots_dir, &config.receipts_dir),
            preview_timeout: config.preview_timeout(),
        })
    }

    /// 检查下单页面上的表单控件
    pub async fn verify_page<D: PageDriver>(&self, page: &D) -> AppResult<()> {
        self.form_filler.verify_targets(page).await
    }

    /// 处理一个订单，成功时返回回执产物
    pub async fn run<D>(&self, page: &D, record: &OrderRecord, ctx: &OrderCtx) -> AppResult<ReceiptArtifact>
    where
        D: PageDriver + PdfRenderer,
    {
        let order_number = record.order_number;

        self.modal_guard.dismiss_if_present(page).await?;

        self.form_filler.fill(page, record).await?;
        debug!("{} 表单已填写", ctx);

        self.preview(page).await?;

        let outcome = self.submission.submit(page, order_number).await?;
        info!("{} ✓ 下单成功 (尝试 {} 次)", ctx, outcome.attempts_used);

        let receipt_html = self.composer.read_receipt_html(page, order_number).await?;
        let screenshot_path = self.composer.capture(page, order_number).await?;
        self.composer
            .compose_pdf(page, order_number, &receipt_html, &screenshot_path)
            .await
    }

    /// 清除该订单上一次运行留下的截图和回执
    pub fn discard_outputs(&self, order_number: u32) -> AppResult<()> {
        self.composer.discard(order_number)
    }

    /// 点击"再下一单"，回到空白表单
    pub async fn order_another<D: PageDriver>(&self, page: &D) -> AppResult<()> {
        page.click(selectors::ORDER_ANOTHER)
            .await
            .map_err(|e| OrderError::browser("再下一单", e))
    }

    /// 点击预览并等待预览图出现
    async fn preview<D: PageDriver>(&self, page: &D) -> AppResult<()> {
        page.click(selectors::PREVIEW)
            .await
            .map_err(|e| OrderError::browser("预览", e))?;

        match page
            .wait_visible(selectors::PREVIEW_IMAGE, self.preview_timeout)
            .await
        {
            Ok(()) => Ok(()),
            Err(ProbeError::Timeout { selector, .. }) => Err(OrderError::browser(
                "等待预览图",
                DriverError::ElementNotFound { selector },
            )),
            Err(ProbeError::Driver(e)) => Err(OrderError::browser("等待预览图", e)),
        }
    }
}
