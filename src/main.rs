use anyhow::Result;
use robot_order_submit::{logger, App, Config};
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logger::init();

    // 加载配置
    let config = Config::load()?;

    // 初始化并运行应用
    let report = App::initialize(config).await?.run().await?;

    if !report.is_clean() {
        warn!("⚠️ 部分订单未成功: {:?}", report.failed_order_numbers());
    }

    Ok(())
}
