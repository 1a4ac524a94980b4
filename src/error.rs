use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// 页面驱动错误
///
/// 由基础设施层返回，不认识订单，只描述"哪个元素、哪个动作"出了问题
#[derive(Debug, Error)]
pub enum DriverError {
    /// 页面上找不到目标元素
    #[error("未找到元素: {selector}")]
    ElementNotFound { selector: String },

    /// 元素存在，但写入的值没有生效
    #[error("元素 {selector} 不接受值 '{value}'")]
    ValueRejected { selector: String, value: String },

    /// CDP 调用失败
    #[error("{action} 失败: {message}")]
    Cdp { action: String, message: String },

    /// 本地文件读写失败
    #[error("文件操作失败 ({}): {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DriverError {
    pub fn cdp(action: impl Into<String>, err: impl std::fmt::Display) -> Self {
        DriverError::Cdp {
            action: action.into(),
            message: err.to_string(),
        }
    }
}

/// 元素可见性探测结果
///
/// 超时是"没看到"，属于正常的否定结果；其余错误必须继续向上传播
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("等待元素 {selector} 可见超时 ({timeout:?})")]
    Timeout { selector: String, timeout: Duration },

    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum OrderError {
    /// 无法获取订单数据
    #[error("无法获取订单数据 ({location}): {reason}")]
    SourceUnavailable { location: String, reason: String },

    /// 订单数据格式错误（row = 0 表示表头）
    #[error("订单数据第 {row} 行格式错误: {reason}")]
    MalformedRecord { row: usize, reason: String },

    /// 同一批次中订单号重复，输出文件会互相覆盖
    #[error("订单号 {order_number} 重复 (第 {first_row} 行与第 {row} 行)")]
    DuplicateOrderNumber {
        order_number: u32,
        first_row: usize,
        row: usize,
    },

    /// 表单字段无法填写
    #[error("无法填写字段 {field}: {reason}")]
    FieldNotFillable { field: &'static str, reason: String },

    /// 重试次数用尽后订单仍然提交失败
    #[error("订单 {order_number} 提交失败，已尝试 {attempts} 次")]
    OrderSubmissionFailed { order_number: u32, attempts: u32 },

    /// 截图失败
    #[error("订单 {order_number} 截图失败: {reason}")]
    CaptureFailed { order_number: u32, reason: String },

    /// PDF 渲染失败
    #[error("订单 {order_number} 生成 PDF 失败: {reason}")]
    RenderFailed { order_number: u32, reason: String },

    /// 压缩包写入失败
    #[error("写入压缩包失败 ({}): {reason}", .path.display())]
    ArchiveWriteFailed { path: PathBuf, reason: String },

    /// 下单页面无法打开或无法恢复
    #[error("下单页面不可用 ({url}): {reason}")]
    StorefrontUnavailable { url: String, reason: String },

    /// 配置错误
    #[error("配置无效: {reason}")]
    ConfigInvalid { reason: String },

    /// 其他浏览器操作失败（导航、点击按钮等）
    #[error("浏览器操作失败 ({action}): {source}")]
    Browser {
        action: String,
        #[source]
        source: DriverError,
    },

    /// 本地目录/文件操作失败
    #[error("文件操作失败 ({}): {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl OrderError {
    /// 创建浏览器操作错误
    pub fn browser(action: impl Into<String>, source: DriverError) -> Self {
        OrderError::Browser {
            action: action.into(),
            source,
        }
    }

    /// 创建文件操作错误
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OrderError::Io {
            path: path.into(),
            source,
        }
    }

    /// 只影响单个订单的错误，批次继续处理下一个订单
    pub fn is_per_order(&self) -> bool {
        matches!(
            self,
            OrderError::FieldNotFillable { .. }
                | OrderError::OrderSubmissionFailed { .. }
                | OrderError::CaptureFailed { .. }
                | OrderError::RenderFailed { .. }
                | OrderError::Browser { .. }
        )
    }

    /// 终止整个批次的错误
    pub fn is_batch_fatal(&self) -> bool {
        !self.is_per_order()
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, OrderError>;
