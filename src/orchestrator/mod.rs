//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 应用入口
//! - 管理应用生命周期（初始化、运行）
//! - 加载订单数据
//! - 创建浏览器会话，注册 Ctrl-C 停止标志
//!
//! ### `order_batch` - 订单批次处理器
//! - 顺序遍历所有订单（Vec<OrderRecord>）
//! - 单个订单失败只记录，失败后重新打开下单页面
//! - 循环结束后打包回执、写报告
//!
//! ### `report` - 运行报告
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (App)
//!     ↓
//! order_batch (处理 Vec<OrderRecord>)
//!     ↓
//! workflow::OrderFlow (处理单个订单)
//!     ↓
//! services (能力层：modal / form / submission / receipt / archive)
//!     ↓
//! infrastructure (基础设施：BrowserSession / ChromePage)
//! ```
//!
//! ## 设计原则
//!
//! 1. **顺序执行**：同一时间只有一个订单占用页面
//! 2. **资源隔离**：只有编排层持有浏览器会话
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure

pub mod batch_processor;
pub mod order_batch;
pub mod report;

pub use batch_processor::App;
pub use order_batch::Orchestrator;
pub use report::{BatchReport, FailedOrder};
