//! 订单批次处理器 - 编排层
//!
//! 顺序处理所有订单：单个订单失败只记录，不中断批次；
//! 循环结束后无条件打包回执并输出报告

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::{Config, ScreenshotPolicy};
use crate::error::{AppResult, OrderError};
use crate::infrastructure::{BrowserSession, PageDriver, PageFactory, PdfRenderer};
use crate::models::OrderRecord;
use crate::orchestrator::report::BatchReport;
use crate::services::{ArchiveBuilder, FailureWriter};
use crate::utils::logging::{log_order_start, print_final_report};
use crate::workflow::{OrderCtx, OrderFlow};

/// 订单批次处理器
pub struct Orchestrator {
    flow: OrderFlow,
    failure_writer: FailureWriter,
    target_url: String,
    screenshots_dir: PathBuf,
    receipts_dir: PathBuf,
    archive_path: PathBuf,
    report_path: PathBuf,
    screenshot_policy: ScreenshotPolicy,
    cancel: Arc<AtomicBool>,
}

impl Orchestrator {
    pub fn new(config: &Config) -> AppResult<Self> {
        Ok(Self {
            flow: OrderFlow::new(config)?,
            failure_writer: FailureWriter::new(&config.failure_log_file),
            target_url: config.target_url.clone(),
            screenshots_dir: config.screenshots_dir.clone(),
            receipts_dir: config.receipts_dir.clone(),
            archive_path: config.archive_path.clone(),
            report_path: config.report_path.clone(),
            screenshot_policy: config.screenshot_policy,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// 使用外部的停止标志（每个订单开始前检查）
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// 处理整个批次
    ///
    /// 批次级错误发生在循环中时，剩余订单记为跳过，仍然打包并写报告，然后返回该错误
    pub async fn run<F>(&self, session: &BrowserSession<F>, orders: &[OrderRecord]) -> AppResult<BatchReport>
    where
        F: PageFactory,
        F::Page: PdfRenderer,
    {
        ensure_unique(orders)?;
        self.prepare_output_dirs()?;
        self.failure_writer.reset()?;
        // 压缩包只能包含本次成功的订单
        for record in orders {
            self.flow.discard_outputs(record.order_number)?;
        }

        let mut report = BatchReport::start();

        let fatal = if orders.is_empty() {
            warn!("⚠️ 没有需要处理的订单");
            None
        } else {
            self.process_orders(session, orders, &mut report).await.err()
        };

        let archived = ArchiveBuilder::build(&self.receipts_dir, &self.archive_path);
        let archive_error = match archived {
            Ok(summary) => {
                report.record_archive(summary);
                self.apply_screenshot_policy(&report);
                None
            }
            Err(e) => {
                error!("❌ {}", e);
                Some(e)
            }
        };

        report.finish();
        if let Err(e) = report.write_json(&self.report_path) {
            warn!("⚠️ 写入运行报告失败: {}", e);
        }
        print_final_report(&report, &self.report_path);

        match fatal.or(archive_error) {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    fn prepare_output_dirs(&self) -> AppResult<()> {
        for dir in [&self.screenshots_dir, &self.receipts_dir] {
            fs::create_dir_all(dir).map_err(|e| OrderError::io(dir, e))?;
        }
        Ok(())
    }

    async fn process_orders<F>(
        &self,
        session: &BrowserSession<F>,
        orders: &[OrderRecord],
        report: &mut BatchReport,
    ) -> AppResult<()>
    where
        F: PageFactory,
        F::Page: PdfRenderer,
    {
        let page = match self.open_storefront(session).await {
            Ok(page) => page,
            Err(e) => {
                report.skip(orders);
                return Err(e);
            }
        };

        let total = orders.len();
        for (idx, record) in orders.iter().enumerate() {
            if self.cancel.load(Ordering::SeqCst) {
                warn!("🛑 收到停止信号，跳过剩余 {} 个订单", total - idx);
                report.skip(&orders[idx..]);
                return Ok(());
            }

            let ctx = OrderCtx::new(record.order_number, idx + 1, total);
            log_order_start(&ctx);

            let outcome = match self.flow.run(page, record, &ctx).await {
                Ok(artifact) => {
                    report.record_success(artifact);
                    self.reset_form(page, &ctx).await
                }
                Err(e) if e.is_per_order() => {
                    error!("{} ❌ {}", ctx, e);
                    if let Err(w) = self.failure_writer.write(record.order_number, &e.to_string()) {
                        warn!("{} 写入失败记录出错: {}", ctx, w);
                    }
                    report.record_failure(record.order_number, e.to_string());
                    self.recover(page, &ctx).await
                }
                Err(e) => {
                    report.record_failure(record.order_number, e.to_string());
                    Err(e)
                }
            };

            if let Err(e) = outcome {
                error!("{} ❌ 批次终止: {}", ctx, e);
                report.skip(&orders[idx + 1..]);
                return Err(e);
            }
        }

        Ok(())
    }

    /// 打开下单页面并检查表单控件
    async fn open_storefront<'s, F>(&self, session: &'s BrowserSession<F>) -> AppResult<&'s F::Page>
    where
        F: PageFactory,
    {
        session
            .navigate(&self.target_url)
            .await
            .map_err(|e| self.storefront_unavailable(e))?;
        let page = session.acquire().await?;
        self.flow.verify_page(page).await?;
        info!("✓ 下单页面已就绪: {}", self.target_url);
        Ok(page)
    }

    /// 成功后点击"再下一单"，不行就重新打开页面
    async fn reset_form<D: PageDriver>(&self, page: &D, ctx: &OrderCtx) -> AppResult<()> {
        if let Err(e) = self.flow.order_another(page).await {
            warn!("{} ⚠️ {}，重新加载下单页面", ctx, e);
            return self.recover(page, ctx).await;
        }
        Ok(())
    }

    /// 失败后重新加载下单页面，保证下一个订单从空白表单开始
    ///
    /// 下单页面的 URL 只有 hash 部分，再次导航不会重新加载，所以这里用 reload
    async fn recover<D: PageDriver>(&self, page: &D, ctx: &OrderCtx) -> AppResult<()> {
        page.reload().await.map_err(|e| {
            error!("{} 无法恢复下单页面", ctx);
            self.storefront_unavailable(OrderError::browser("重新加载", e))
        })
    }

    fn storefront_unavailable(&self, err: OrderError) -> OrderError {
        OrderError::StorefrontUnavailable {
            url: self.target_url.clone(),
            reason: err.to_string(),
        }
    }

    fn apply_screenshot_policy(&self, report: &BatchReport) {
        if self.screenshot_policy != ScreenshotPolicy::Delete {
            return;
        }
        for artifact in &report.receipts {
            if let Err(e) = fs::remove_file(&artifact.screenshot_path) {
                warn!(
                    "⚠️ 删除截图失败 ({}): {}",
                    artifact.screenshot_path.display(),
                    e
                );
            }
        }
    }
}

/// 同一批次的订单号必须唯一，否则输出文件会互相覆盖
fn ensure_unique(orders: &[OrderRecord]) -> AppResult<()> {
    let mut seen: HashMap<u32, usize> = HashMap::new();
    for (idx, record) in orders.iter().enumerate() {
        let row = idx + 1;
        if let Some(first_row) = seen.insert(record.order_number, row) {
            return Err(OrderError::DuplicateOrderNumber {
                order_number: record.order_number,
                first_row,
                row,
            });
        }
    }
    Ok(())
}
