use anyhow::Context;
use evm_kit::config::Config;
use evm_kit::log_info;
use evm_kit::startup::Application;
use evm_kit::utils::logger::init_logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志（全局只需调用一次）
    init_logger();

    log_info!("Starting evm-kit...");

    // 1. 加载配置
    let config = Config::load().context("Failed to load application configuration")?;

    // 2. 组装 Provider / Signer / Kit
    let application = Application::build(config)
        .await
        .context("Application building failed (provider/wallet initialization)")?;

    // 3. 输出网络状态与余额
    application
        .run()
        .await
        .context("Failed to query network status")?;

    Ok(())
}
