//! 批次运行报告
//!
//! 记录每个订单的结果，最终写成 JSON

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::debug;

use crate::error::{AppResult, OrderError};
use crate::models::OrderRecord;
use crate::services::{ArchiveSummary, ReceiptArtifact};

/// 失败的订单及原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedOrder {
    pub order_number: u32,
    pub reason: String,
}

/// 批次运行报告
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
    pub succeeded: Vec<u32>,
    pub failed: Vec<FailedOrder>,
    /// 因停止信号或批次级错误而没有处理的订单
    pub skipped: Vec<u32>,
    pub receipts: Vec<ReceiptArtifact>,
    /// 压缩包路径，写入失败时为 None
    pub archive: Option<PathBuf>,
    pub archive_entries: Vec<String>,
}

impl BatchReport {
    pub fn start() -> Self {
        Self {
            started_at: Local::now(),
            finished_at: None,
            succeeded: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
            receipts: Vec::new(),
            archive: None,
            archive_entries: Vec::new(),
        }
    }

    pub fn record_success(&mut self, artifact: ReceiptArtifact) {
        self.succeeded.push(artifact.order_number);
        self.receipts.push(artifact);
    }

    pub fn record_failure(&mut self, order_number: u32, reason: impl Into<String>) {
        self.failed.push(FailedOrder {
            order_number,
            reason: reason.into(),
        });
    }

    pub fn skip(&mut self, orders: &[OrderRecord]) {
        self.skipped.extend(orders.iter().map(|r| r.order_number));
    }

    pub fn record_archive(&mut self, summary: ArchiveSummary) {
        self.archive = Some(summary.path);
        self.archive_entries = summary.entries;
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Local::now());
    }

    pub fn failed_order_numbers(&self) -> Vec<u32> {
        self.failed.iter().map(|f| f.order_number).collect()
    }

    /// 已处理（成功 + 失败）和跳过的订单总数
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len() + self.skipped.len()
    }

    /// 所有订单都成功且压缩包已写入
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty() && self.archive.is_some()
    }

    /// 以格式化 JSON 写入报告文件（覆盖）
    pub fn write_json(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| OrderError::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| OrderError::io(path, std::io::Error::from(e)))?;
        fs::write(path, json).map_err(|e| OrderError::io(path, e))?;

        debug!("运行报告已写入: {}", path.display());
        Ok(())
    }
}
