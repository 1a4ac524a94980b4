//! 失败记录服务 - 业务能力层
//!
//! 只负责"写 failed_orders.txt"能力，不关心流程

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{AppResult, OrderError};

/// 失败记录服务
///
/// 职责：
/// - 批次开始时清空记录文件并写入表头
/// - 每个失败订单追加一行
pub struct FailureWriter {
    path: PathBuf,
}

impl FailureWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 清空记录文件并写入带时间的表头
    pub fn reset(&self) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| OrderError::io(parent, e))?;
        }

        let header = format!(
            "{}\n失败订单记录 - {}\n{}\n",
            "=".repeat(60),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            "=".repeat(60)
        );
        fs::write(&self.path, header).map_err(|e| OrderError::io(&self.path, e))
    }

    /// 追加一条失败记录
    pub fn write(&self, order_number: u32, reason: &str) -> AppResult<()> {
        debug!("写入失败记录: 订单 {} | {}", order_number, reason);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| OrderError::io(&self.path, e))?;

        writeln!(file, "订单 {} | 原因: {}", order_number, reason)
            .map_err(|e| OrderError::io(&self.path, e))
    }
}
