//! 测试用的内存页面
//!
//! 模拟下单页面的行为：弹窗、表单、带临时错误的提交按钮、回执和 PDF 渲染

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{DriverError, ProbeError};
use crate::infrastructure::{PageDriver, PdfRenderer};
use crate::services::{selectors, FIELD_TARGETS};

#[derive(Default)]
struct FakeState {
    modal_on_load: bool,
    modal_visible: bool,
    missing: HashSet<String>,
    probe_failures: HashSet<String>,
    rejected: HashSet<String>,
    render_fails: bool,
    /// 按收货地址指定失败的订单
    capture_fails_for: HashSet<String>,
    render_fails_for: HashSet<String>,
    /// 下拉框不接受的选项值
    rejected_values: HashSet<String>,
    /// 导航 + 重新加载超过这个次数后全部失败
    navigation_limit: Option<usize>,
    loads: usize,
    /// 每次填写地址后，前 N 次提交都会出现服务端错误
    default_submit_errors: u32,
    submit_errors_by_address: HashMap<String, u32>,
    current_errors: u32,
    clicks_since_fill: u32,
    alert_visible: bool,
    submit_clicks: u32,
    fill_count: u32,
    values: HashMap<String, String>,
    clicks: Vec<String>,
    navigations: Vec<String>,
    reloads: u32,
    rendered: Vec<String>,
}

pub(crate) struct FakePage {
    state: Mutex<FakeState>,
}

impl FakePage {
    /// 打开时带弹窗、所有控件都存在、提交一次成功
    pub fn storefront() -> Self {
        Self {
            state: Mutex::new(FakeState {
                modal_on_load: true,
                modal_visible: true,
                ..FakeState::default()
            }),
        }
    }

    fn with(self, f: impl FnOnce(&mut FakeState)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub fn without_modal(self) -> Self {
        self.with(|s| {
            s.modal_on_load = false;
            s.modal_visible = false;
        })
    }

    pub fn with_missing(self, selector: &str) -> Self {
        self.with(|s| {
            s.missing.insert(selector.to_string());
        })
    }

    pub fn with_probe_failure(self, selector: &str) -> Self {
        self.with(|s| {
            s.probe_failures.insert(selector.to_string());
        })
    }

    pub fn with_rejected(self, selector: &str) -> Self {
        self.with(|s| {
            s.rejected.insert(selector.to_string());
        })
    }

    pub fn with_render_failure(self) -> Self {
        self.with(|s| s.render_fails = true)
    }

    /// 收货地址为 `address` 的订单截图失败
    pub fn with_capture_failure_for(self, address: &str) -> Self {
        self.with(|s| {
            s.capture_fails_for.insert(address.to_string());
        })
    }

    /// 收货地址为 `address` 的订单 PDF 渲染失败
    pub fn with_render_failure_for(self, address: &str) -> Self {
        self.with(|s| {
            s.render_fails_for.insert(address.to_string());
        })
    }

    /// 任何下拉框都不接受选项值 `value`
    pub fn with_rejected_value(self, value: &str) -> Self {
        self.with(|s| {
            s.rejected_values.insert(value.to_string());
        })
    }

    /// 所有订单在成功前都先遇到 `errors` 次服务端错误（u32::MAX 表示永不恢复）
    pub fn with_submit_errors(self, errors: u32) -> Self {
        self.with(|s| {
            s.default_submit_errors = errors;
            s.current_errors = errors;
        })
    }

    /// 收货地址为 `address` 的订单先遇到 `errors` 次服务端错误
    pub fn with_submit_errors_for(self, address: &str, errors: u32) -> Self {
        self.with(|s| {
            s.submit_errors_by_address.insert(address.to_string(), errors);
        })
    }

    pub fn with_navigation_limit(self, limit: usize) -> Self {
        self.with(|s| s.navigation_limit = Some(limit))
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    pub fn reloads(&self) -> u32 {
        self.state.lock().unwrap().reloads
    }

    pub fn submit_clicks(&self) -> u32 {
        self.state.lock().unwrap().submit_clicks
    }

    pub fn fill_count(&self) -> u32 {
        self.state.lock().unwrap().fill_count
    }

    pub fn rendered_count(&self) -> usize {
        self.state.lock().unwrap().rendered.len()
    }

    pub fn value_of(&self, selector: &str) -> Option<String> {
        self.state.lock().unwrap().values.get(selector).cloned()
    }

    fn check_present(state: &FakeState, selector: &str) -> Result<(), DriverError> {
        if state.missing.contains(selector) {
            return Err(DriverError::ElementNotFound {
                selector: selector.to_string(),
            });
        }
        Ok(())
    }

    fn current_address(state: &FakeState) -> String {
        state
            .values
            .get(FIELD_TARGETS["address"].selector)
            .cloned()
            .unwrap_or_default()
    }

    /// 页面加载（导航或重新加载）
    ///
    /// `fresh_document` 为 false 时只是同一文档内的跳转，页面上的弹窗和错误提示保持原样
    fn load(state: &mut FakeState, fresh_document: bool) -> Result<(), DriverError> {
        if state.navigation_limit.is_some_and(|limit| state.loads >= limit) {
            return Err(DriverError::cdp("导航", "connection closed"));
        }
        state.loads += 1;
        if fresh_document {
            state.modal_visible = state.modal_on_load;
            state.alert_visible = false;
        }
        Ok(())
    }

    fn write_value(&self, selector: &str, value: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        Self::check_present(&state, selector)?;
        if state.rejected.contains(selector) {
            return Err(DriverError::ValueRejected {
                selector: selector.to_string(),
                value: value.to_string(),
            });
        }

        state.fill_count += 1;
        state.values.insert(selector.to_string(), value.to_string());

        if selector == FIELD_TARGETS["address"].selector {
            let errors = state
                .submit_errors_by_address
                .get(value)
                .copied()
                .unwrap_or(state.default_submit_errors);
            state.current_errors = errors;
            state.clicks_since_fill = 0;
            state.alert_visible = false;
        }
        Ok(())
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        // 只改 hash 的导航不会重新加载单页应用
        let same_document = state.navigations.last().is_some_and(|last| last == url);
        Self::load(&mut state, !same_document)?;
        state.navigations.push(url.to_string());
        Ok(())
    }

    async fn reload(&self) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        Self::load(&mut state, true)?;
        state.reloads += 1;
        Ok(())
    }

    async fn exists(&self, selector: &str) -> Result<bool, DriverError> {
        Ok(!self.state.lock().unwrap().missing.contains(selector))
    }

    async fn wait_visible(&self, selector: &str, timeout: Duration) -> Result<(), ProbeError> {
        let state = self.state.lock().unwrap();
        if state.probe_failures.contains(selector) {
            return Err(ProbeError::Driver(DriverError::cdp("探测", "target crashed")));
        }

        let visible = match selector {
            selectors::MODAL => state.modal_visible,
            selectors::SERVER_ERROR => state.alert_visible,
            other => !state.missing.contains(other),
        };

        if visible {
            Ok(())
        } else {
            Err(ProbeError::Timeout {
                selector: selector.to_string(),
                timeout,
            })
        }
    }

    async fn click(&self, selector: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        Self::check_present(&state, selector)?;
        state.clicks.push(selector.to_string());

        match selector {
            selectors::MODAL_DISMISS => state.modal_visible = false,
            selectors::SUBMIT => {
                state.submit_clicks += 1;
                state.clicks_since_fill += 1;
                state.alert_visible = state.clicks_since_fill <= state.current_errors;
            }
            selectors::ORDER_ANOTHER => {
                state.modal_visible = state.modal_on_load;
                state.alert_visible = false;
            }
            _ => {}
        }
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), DriverError> {
        self.write_value(selector, value)
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<(), DriverError> {
        if self.state.lock().unwrap().rejected_values.contains(value) {
            return Err(DriverError::ValueRejected {
                selector: selector.to_string(),
                value: value.to_string(),
            });
        }
        self.write_value(selector, value)
    }

    async fn inner_html(&self, selector: &str) -> Result<String, DriverError> {
        let state = self.state.lock().unwrap();
        Self::check_present(&state, selector)?;
        let address = Self::current_address(&state);
        Ok(format!("<h3>Receipt</h3><p>{}</p>", address))
    }

    async fn screenshot(&self, selector: &str, path: &Path) -> Result<(), DriverError> {
        {
            let state = self.state.lock().unwrap();
            Self::check_present(&state, selector)?;
            if state.capture_fails_for.contains(&Self::current_address(&state)) {
                return Err(DriverError::cdp("截图", "element detached"));
            }
        }
        std::fs::write(path, b"\x89PNG fake").map_err(|e| DriverError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

#[async_trait]
impl PdfRenderer for FakePage {
    async fn html_to_pdf(&self, html: &str, output: &Path) -> Result<(), DriverError> {
        let fails = {
            let state = self.state.lock().unwrap();
            state.render_fails || state.render_fails_for.contains(&Self::current_address(&state))
        };
        if fails {
            return Err(DriverError::cdp("生成 PDF", "printToPDF failed"));
        }
        std::fs::write(output, html).map_err(|e| DriverError::Io {
            path: output.to_path_buf(),
            source: e,
        })?;
        self.state.lock().unwrap().rendered.push(html.to_string());
        Ok(())
    }
}
