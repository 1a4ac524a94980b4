//! 弹窗处理服务 - 业务能力层
//!
//! 只负责"有弹窗就关掉"，不关心流程

use std::time::Duration;

use tracing::{debug, info};

use crate::error::{AppResult, OrderError, ProbeError};
use crate::infrastructure::PageDriver;
use crate::services::selectors;

/// 弹窗探测结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalStatus {
    /// 超时内没有出现
    Absent,
    /// 出现并已关闭
    Dismissed,
}

/// 弹窗守卫
pub struct ModalGuard {
    modal_selector: &'static str,
    dismiss_selector: &'static str,
    timeout: Duration,
}

impl ModalGuard {
    pub fn new(timeout: Duration) -> Self {
        Self {
            modal_selector: selectors::MODAL,
            dismiss_selector: selectors::MODAL_DISMISS,
            timeout,
        }
    }

    /// 使用配置的超时探测并关闭弹窗
    pub async fn dismiss_if_present<D: PageDriver>(&self, page: &D) -> AppResult<ModalStatus> {
        self.dismiss_within(page, self.timeout).await
    }

    /// 在 `timeout` 内探测弹窗
    ///
    /// 只有"超时未出现"会被当作没有弹窗，其余探测失败原样返回
    pub async fn dismiss_within<D: PageDriver>(
        &self,
        page: &D,
        timeout: Duration,
    ) -> AppResult<ModalStatus> {
        match page.wait_visible(self.modal_selector, timeout).await {
            Ok(()) => {
                page.click(self.dismiss_selector)
                    .await
                    .map_err(|e| OrderError::browser("关闭弹窗", e))?;
                info!("✓ 已关闭弹窗");
                Ok(ModalStatus::Dismissed)
            }
            Err(ProbeError::Timeout { .. }) => {
                debug!("{:?} 内未出现弹窗", timeout);
                Ok(ModalStatus::Absent)
            }
            Err(ProbeError::Driver(e)) => Err(OrderError::browser("探测弹窗", e)),
        }
    }
}
