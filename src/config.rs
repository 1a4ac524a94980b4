use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::error::{AppResult, OrderError};

/// 截图在归档之后的保留策略
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotPolicy {
    /// 保留截图
    Keep,
    /// 压缩包写入成功后删除已嵌入 PDF 的截图
    Delete,
}

impl FromStr for ScreenshotPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" => Ok(ScreenshotPolicy::Keep),
            "delete" => Ok(ScreenshotPolicy::Delete),
            other => Err(format!("未知的截图策略: {}", other)),
        }
    }
}

/// 浏览器获取方式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserMode {
    /// 启动无头浏览器
    Headless,
    /// 连接到已打开调试端口的浏览器
    Attach,
}

impl FromStr for BrowserMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "headless" => Ok(BrowserMode::Headless),
            "attach" => Ok(BrowserMode::Attach),
            other => Err(format!("未知的浏览器模式: {}", other)),
        }
    }
}

/// CSV 列名
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub order_number: String,
    pub head: String,
    pub body: String,
    pub legs: String,
    pub address: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            order_number: "Order number".to_string(),
            head: "Head".to_string(),
            body: "Body".to_string(),
            legs: "Legs".to_string(),
            address: "Address".to_string(),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 下单页面 URL
    pub target_url: String,
    /// 订单数据位置（URL 或本地路径）
    pub orders_source: String,
    /// 下载的订单数据本地副本
    pub orders_csv_file: PathBuf,
    /// 单个订单最多提交次数
    pub max_submit_attempts: u32,
    /// 点击提交后等待页面稳定的时间（毫秒）
    pub submit_settle_ms: u64,
    /// 探测服务端错误提示的超时（毫秒）
    pub error_probe_timeout_ms: u64,
    /// 探测弹窗的超时（毫秒）
    pub modal_timeout_ms: u64,
    /// 点击预览后等待预览图的超时（毫秒）
    pub preview_timeout_ms: u64,
    /// 截图目录
    pub screenshots_dir: PathBuf,
    /// 回执 PDF 目录
    pub receipts_dir: PathBuf,
    /// 压缩包路径
    pub archive_path: PathBuf,
    /// 运行报告路径
    pub report_path: PathBuf,
    /// 失败订单记录文件
    pub failure_log_file: PathBuf,
    pub screenshot_policy: ScreenshotPolicy,
    pub browser_mode: BrowserMode,
    /// 浏览器调试端口（attach 模式）
    pub browser_debug_port: u16,
    /// 浏览器可执行文件，不设置时自动查找
    pub chrome_executable: Option<PathBuf>,
    pub columns: ColumnNames,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_url: "https://robotsparebinindustries.com/#/robot-order".to_string(),
            orders_source: "https://robotsparebinindustries.com/orders.csv".to_string(),
            orders_csv_file: PathBuf::from("orders.csv"),
            max_submit_attempts: 10,
            submit_settle_ms: 300,
            error_probe_timeout_ms: 2000,
            modal_timeout_ms: 1000,
            preview_timeout_ms: 5000,
            screenshots_dir: PathBuf::from("output/orders_screenshots"),
            receipts_dir: PathBuf::from("output/receipt_pdf"),
            archive_path: PathBuf::from("output/receipts_zip.zip"),
            report_path: PathBuf::from("output/run_report.json"),
            failure_log_file: PathBuf::from("output/failed_orders.txt"),
            screenshot_policy: ScreenshotPolicy::Keep,
            browser_mode: BrowserMode::Headless,
            browser_debug_port: 9222,
            chrome_executable: None,
            columns: ColumnNames::default(),
        }
    }
}

impl Config {
    /// 加载配置：默认值 → TOML 文件（ROBOT_CONFIG，默认 robot.toml）→ 环境变量
    pub fn load() -> AppResult<Self> {
        let path = std::env::var("ROBOT_CONFIG").unwrap_or_else(|_| "robot.toml".to_string());
        let base = if Path::new(&path).exists() {
            Self::from_toml_file(Path::new(&path))?
        } else {
            Self::default()
        };

        let config = base.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 只使用默认值和环境变量
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| OrderError::io(path, e))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| OrderError::ConfigInvalid {
            reason: format!("TOML 解析失败: {}", e),
        })
    }

    fn with_env_overrides(self) -> Self {
        Self {
            target_url: std::env::var("TARGET_URL").unwrap_or(self.target_url),
            orders_source: std::env::var("ORDERS_SOURCE").unwrap_or(self.orders_source),
            orders_csv_file: env_path("ORDERS_CSV_FILE").unwrap_or(self.orders_csv_file),
            max_submit_attempts: env_parse("MAX_SUBMIT_ATTEMPTS").unwrap_or(self.max_submit_attempts),
            submit_settle_ms: env_parse("SUBMIT_SETTLE_MS").unwrap_or(self.submit_settle_ms),
            error_probe_timeout_ms: env_parse("ERROR_PROBE_TIMEOUT_MS")
                .unwrap_or(self.error_probe_timeout_ms),
            modal_timeout_ms: env_parse("MODAL_TIMEOUT_MS").unwrap_or(self.modal_timeout_ms),
            preview_timeout_ms: env_parse("PREVIEW_TIMEOUT_MS").unwrap_or(self.preview_timeout_ms),
            screenshots_dir: env_path("SCREENSHOTS_DIR").unwrap_or(self.screenshots_dir),
            receipts_dir: env_path("RECEIPTS_DIR").unwrap_or(self.receipts_dir),
            archive_path: env_path("ARCHIVE_PATH").unwrap_or(self.archive_path),
            report_path: env_path("REPORT_PATH").unwrap_or(self.report_path),
            failure_log_file: env_path("FAILURE_LOG_FILE").unwrap_or(self.failure_log_file),
            screenshot_policy: env_parse("SCREENSHOT_POLICY").unwrap_or(self.screenshot_policy),
            browser_mode: env_parse("BROWSER_MODE").unwrap_or(self.browser_mode),
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT").unwrap_or(self.browser_debug_port),
            chrome_executable: env_path("CHROME_EXECUTABLE").or(self.chrome_executable),
            columns: self.columns,
        }
    }

    /// 校验配置
    pub fn validate(&self) -> AppResult<()> {
        if self.max_submit_attempts == 0 {
            return Err(OrderError::ConfigInvalid {
                reason: "max_submit_attempts 必须大于 0".to_string(),
            });
        }
        if self.target_url.trim().is_empty() || self.orders_source.trim().is_empty() {
            return Err(OrderError::ConfigInvalid {
                reason: "target_url 和 orders_source 不能为空".to_string(),
            });
        }
        let paths = [
            ("screenshots_dir", &self.screenshots_dir),
            ("receipts_dir", &self.receipts_dir),
            ("archive_path", &self.archive_path),
        ];
        for (name, path) in paths {
            if path.as_os_str().is_empty() {
                return Err(OrderError::ConfigInvalid {
                    reason: format!("{} 不能为空", name),
                });
            }
        }
        Ok(())
    }

    pub fn submit_settle(&self) -> Duration {
        Duration::from_millis(self.submit_settle_ms)
    }

    pub fn error_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.error_probe_timeout_ms)
    }

    pub fn modal_timeout(&self) -> Duration {
        Duration::from_millis(self.modal_timeout_ms)
    }

    pub fn preview_timeout(&self) -> Duration {
        Duration::from_millis(self.preview_timeout_ms)
    }
}

/// 读取并解析环境变量；值无法解析时记录警告并忽略
fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("⚠️ 环境变量 {}={} 无法解析，使用配置文件或默认值", name, raw);
            None
        }
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name).ok().filter(|v| !v.is_empty()).map(PathBuf::from)
}
