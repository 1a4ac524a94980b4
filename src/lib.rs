//! # Robot Order Submit
//!
//! 一个用于机器人批量下单的 Rust 应用程序：读取订单 CSV，逐个在下单页面填写并提交，
//! 为每个成功的订单生成带截图的 PDF 回执，最后打包成一个 zip
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `BrowserSession` - 整个批次唯一的页面，第一次使用时创建
//! - `ChromePage` - `PageDriver` / `PdfRenderer` 的 chromiumoxide 实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个订单
//! - `ModalGuard` - 关闭弹窗
//! - `OrderFormFiller` - 按静态字段表填写表单
//! - `SubmissionController` - 有上限的提交重试
//! - `ReceiptComposer` - 截图 + 回执 → PDF
//! - `ArchiveBuilder` / `FailureWriter` - 打包回执 / 写失败记录
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个订单"的完整处理流程
//! - `OrderCtx` - 上下文封装（订单号 + 批次位置）
//! - `OrderFlow` - 流程编排（modal → fill → preview → submit → receipt）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/order_batch` - 顺序处理所有订单，隔离单个订单的失败
//! - `orchestrator/batch_processor` - 应用入口，加载订单、创建浏览器会话
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::ChromeFactory;
pub use config::Config;
pub use error::{AppResult, OrderError};
pub use infrastructure::{BrowserSession, PageDriver, PdfRenderer};
pub use models::{OrderRecord, OrderSource};
pub use orchestrator::{App, BatchReport, Orchestrator};
pub use workflow::{OrderCtx, OrderFlow};
