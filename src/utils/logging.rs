/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use std::path::Path;

use tracing::{info, warn};

use crate::config::Config;
use crate::orchestrator::report::BatchReport;
use crate::workflow::OrderCtx;

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 机器人批量下单");
    info!("🌐 下单页面: {}", config.target_url);
    info!("🔁 单个订单最多提交: {} 次", config.max_submit_attempts);
    info!("{}", "=".repeat(60));
}

/// 记录订单加载信息
///
/// # 参数
/// - `total`: 订单总数
/// - `location`: 订单数据位置
pub fn log_orders_loaded(total: usize, location: &str) {
    info!("✓ 从 {} 读取到 {} 个订单", location, total);
    info!("💡 订单将逐个顺序处理\n");
}

/// 记录单个订单开始
pub fn log_order_start(ctx: &OrderCtx) {
    info!("\n{}", "─".repeat(60));
    info!("{} 开始处理", ctx);
}

/// 打印最终统计信息
pub fn print_final_report(report: &BatchReport, report_path: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", report.succeeded.len(), report.total());

    if report.failed.is_empty() {
        info!("❌ 失败: 0");
    } else {
        warn!("❌ 失败: {}", report.failed.len());
        for failed in &report.failed {
            warn!("   订单 {} - {}", failed.order_number, truncate_text(&failed.reason, 80));
        }
    }
    if !report.skipped.is_empty() {
        warn!("⏭️ 跳过: {:?}", report.skipped);
    }

    match &report.archive {
        Some(path) => info!("📦 压缩包: {} ({} 个文件)", path.display(), report.archive_entries.len()),
        None => warn!("📦 压缩包未生成"),
    }
    info!("{}", "=".repeat(60));
    info!("\n报告已保存至: {}", report_path.display());
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
