//! 订单提交服务 - 业务能力层
//!
//! 点击下单 → 等待页面稳定 → 检查服务端临时错误，出错则在次数预算内重试。
//! 重试只重复点击，不重新填写表单。

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppResult, OrderError, ProbeError};
use crate::infrastructure::PageDriver;
use crate::services::selectors;

/// 提交状态机
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    /// 正在进行第 `attempt` 次提交（从 1 开始）
    Attempting { attempt: u32 },
    Succeeded { attempts: u32 },
    Failed { attempts: u32 },
}

/// 一次提交的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub success: bool,
    pub transient_server_error: bool,
    pub attempts_used: u32,
}

/// 订单提交控制器
pub struct SubmissionController {
    submit_selector: &'static str,
    error_selector: &'static str,
    max_attempts: u32,
    settle: Duration,
    error_probe_timeout: Duration,
}

impl SubmissionController {
    pub fn new(max_attempts: u32, settle: Duration, error_probe_timeout: Duration) -> Self {
        Self {
            submit_selector: selectors::SUBMIT,
            error_selector: selectors::SERVER_ERROR,
            max_attempts: max_attempts.max(1),
            settle,
            error_probe_timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.max_submit_attempts,
            config.submit_settle(),
            config.error_probe_timeout(),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// 提交当前表单
    ///
    /// 成功返回最后一次尝试的结果；次数用尽返回 `OrderSubmissionFailed`
    pub async fn submit<D: PageDriver>(
        &self,
        page: &D,
        order_number: u32,
    ) -> AppResult<SubmissionOutcome> {
        let mut state = SubmissionState::Attempting { attempt: 1 };

        loop {
            state = match state {
                SubmissionState::Attempting { attempt } => {
                    let outcome = self.attempt(page, attempt).await?;
                    if outcome.success {
                        SubmissionState::Succeeded { attempts: attempt }
                    } else if attempt >= self.max_attempts {
                        SubmissionState::Failed { attempts: attempt }
                    } else {
                        warn!(
                            "[订单 {}] 服务端错误，正在重试... ({}/{})",
                            order_number, attempt, self.max_attempts
                        );
                        SubmissionState::Attempting {
                            attempt: attempt + 1,
                        }
                    }
                }
                SubmissionState::Succeeded { attempts } => {
                    if attempts > 1 {
                        info!("[订单 {}] 第 {} 次提交成功", order_number, attempts);
                    }
                    return Ok(SubmissionOutcome {
                        success: true,
                        transient_server_error: false,
                        attempts_used: attempts,
                    });
                }
                SubmissionState::Failed { attempts } => {
                    return Err(OrderError::OrderSubmissionFailed {
                        order_number,
                        attempts,
                    });
                }
            };
        }
    }

    /// 单次尝试：点击、等待、检查
    async fn attempt<D: PageDriver>(&self, page: &D, attempt: u32) -> AppResult<SubmissionOutcome> {
        debug!("第 {} 次点击 {}", attempt, self.submit_selector);
        page.click(self.submit_selector)
            .await
            .map_err(|e| OrderError::browser("点击下单", e))?;

        sleep(self.settle).await;

        let transient_server_error = self.server_error_visible(page).await?;
        Ok(SubmissionOutcome {
            success: !transient_server_error,
            transient_server_error,
            attempts_used: attempt,
        })
    }

    async fn server_error_visible<D: PageDriver>(&self, page: &D) -> AppResult<bool> {
        match page
            .wait_visible(self.error_selector, self.error_probe_timeout)
            .await
        {
            Ok(()) => Ok(true),
            Err(ProbeError::Timeout { .. }) => Ok(false),
            Err(ProbeError::Driver(e)) => Err(OrderError::browser("检查服务端错误", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::fake_page::FakePage;

    fn controller(max_attempts: u32) -> SubmissionController {
        SubmissionController::new(max_attempts, Duration::ZERO, Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let page = FakePage::storefront();

        let outcome = controller(5).submit(&page, 1).await.unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.attempts_used, 1);
        assert_eq!(page.submit_clicks(), 1);
    }

    #[tokio::test]
    async fn test_error_clears_after_k_attempts() {
        for k in 1..=4u32 {
            let page = FakePage::storefront().with_submit_errors(k - 1);

            let outcome = controller(4).submit(&page, 9).await.unwrap();

            assert_eq!(outcome.attempts_used, k);
            assert_eq!(page.submit_clicks(), k);
        }
    }

    #[tokio::test]
    async fn test_persistent_error_fails_after_max_attempts() {
        let page = FakePage::storefront().with_submit_errors(u32::MAX);

        let err = controller(3).submit(&page, 2).await.unwrap_err();

        assert!(matches!(
            err,
            OrderError::OrderSubmissionFailed {
                order_number: 2,
                attempts: 3
            }
        ));
        assert_eq!(page.submit_clicks(), 3);
    }

    #[tokio::test]
    async fn test_retry_does_not_refill_form() {
        let page = FakePage::storefront().with_submit_errors(2);

        controller(5).submit(&page, 1).await.unwrap();

        assert_eq!(page.fill_count(), 0);
    }

    #[tokio::test]
    async fn test_probe_failure_is_not_success() {
        let page = FakePage::storefront().with_probe_failure(selectors::SERVER_ERROR);

        let err = controller(3).submit(&page, 4).await.unwrap_err();

        assert!(matches!(err, OrderError::Browser { .. }));
        assert_eq!(page.submit_clicks(), 1);
    }

    #[test]
    fn test_zero_budget_clamped_to_one() {
        assert_eq!(controller(0).max_attempts(), 1);
    }
}
