use anyhow::{Context, Result};
use clap::{Arg, Command};
use taskplane::{wait_for_shutdown_signal, Application, ShutdownManager};
use taskplane_core::{init_logging, AppConfig, LogConfig, LogFormat};
use tracing::{error, info, warn};

const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("taskplane")
        .version(env!("CARGO_PKG_VERSION"))
        .about("定时任务控制面")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径，未指定时依次查找默认位置"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别，覆盖配置文件")
                .value_parser(["trace", "debug", "info", "warn", "error"]),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式，覆盖配置文件")
                .value_parser(["json", "pretty"]),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").map(String::as_str);
    let config = AppConfig::load(config_path).context("加载配置失败")?;

    let log_config = resolve_log_config(
        &config,
        matches.get_one::<String>("log-level"),
        matches.get_one::<String>("log-format"),
    )?;
    init_logging(&log_config)?;

    info!("启动任务控制面 v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = config_path {
        info!("配置文件: {}", path);
    }

    let app = Application::new(config)
        .await
        .context("创建应用程序失败")?;

    let shutdown_manager = ShutdownManager::new();
    let shutdown_rx = shutdown_manager.subscribe().await;

    let mut app_handle = tokio::spawn(async move { app.run(shutdown_rx).await });

    tokio::select! {
        result = &mut app_handle => {
            // 服务在收到关闭信号前就已退出
            return match result {
                Ok(Ok(())) => {
                    info!("应用程序已退出");
                    Ok(())
                }
                Ok(Err(e)) => Err(e.context("应用程序运行失败")),
                Err(e) => Err(anyhow::anyhow!("应用程序任务异常退出: {e}")),
            };
        }
        _ = wait_for_shutdown_signal() => {}
    }

    info!("开始优雅关闭...");
    shutdown_manager.shutdown().await;

    match tokio::time::timeout(
        std::time::Duration::from_secs(SHUTDOWN_TIMEOUT_SECS),
        app_handle,
    )
    .await
    {
        Ok(Ok(Ok(()))) => info!("任务控制面已关闭"),
        Ok(Ok(Err(e))) => {
            error!("关闭过程中应用程序出错: {:#}", e);
            return Err(e.context("应用程序运行失败"));
        }
        Ok(Err(e)) => return Err(anyhow::anyhow!("应用程序任务异常退出: {e}")),
        Err(_) => warn!("关闭超时，强制退出"),
    }

    Ok(())
}

fn resolve_log_config(
    config: &AppConfig,
    level: Option<&String>,
    format: Option<&String>,
) -> Result<LogConfig> {
    let mut log_config = LogConfig::try_from(&config.observability)?;

    if let Some(level) = level {
        log_config.level = level.clone();
    }
    if let Some(format) = format {
        log_config.format = format.parse::<LogFormat>()?;
    }

    Ok(log_config)
}
