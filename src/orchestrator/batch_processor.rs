//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：输出启动信息、注册 Ctrl-C 停止标志
//! 2. **加载订单**：下载或读取订单 CSV，格式错误时在打开浏览器之前终止
//! 3. **资源管理**：创建浏览器会话（页面在第一次使用时才创建）
//! 4. **向下委托**：委托 Orchestrator 处理整个批次

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::browser::ChromeFactory;
use crate::config::Config;
use crate::infrastructure::BrowserSession;
use crate::models::OrderSource;
use crate::orchestrator::order_batch::Orchestrator;
use crate::orchestrator::report::BatchReport;
use crate::utils::logging::{log_orders_loaded, log_startup};

/// 应用主结构
pub struct App {
    config: Config,
    cancel: Arc<AtomicBool>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let cancel = Arc::new(AtomicBool::new(false));
        listen_for_ctrl_c(cancel.clone());

        Ok(Self { config, cancel })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<BatchReport> {
        let source = OrderSource::from_config(&self.config);
        info!("\n📁 正在加载订单数据: {}", source.location());
        let orders = source.load().await?;
        log_orders_loaded(orders.len(), source.location());

        let session = BrowserSession::new(ChromeFactory::new(&self.config));
        let orchestrator = Orchestrator::new(&self.config)?.with_cancel_flag(self.cancel.clone());

        let report = orchestrator.run(&session, &orders).await?;
        Ok(report)
    }
}

fn listen_for_ctrl_c(cancel: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 收到 Ctrl-C，当前订单完成后停止");
            cancel.store(true, Ordering::SeqCst);
        }
    });
}
