use std::sync::Arc;

use anyhow::{Context, Result};
use taskplane_api::{create_app, AppState};
use taskplane_controller::{StatusView, TaskController};
use taskplane_core::AppConfig;
use taskplane_domain::Dispatcher;
use taskplane_infrastructure::{build_dispatcher, build_stores, DatabaseManager, StoreSet};
use tokio::{net::TcpListener, sync::broadcast};
use tracing::info;

/// 主应用程序
pub struct Application {
    config: AppConfig,
    state: AppState,
    database: Option<DatabaseManager>,
}

impl Application {
    /// 按配置装配存储、分发器与控制器
    pub async fn new(config: AppConfig) -> Result<Self> {
        info!(
            "初始化应用程序: 存储后端 {:?}, 分发后端 {:?}",
            config.database.backend, config.pubsub.backend
        );

        let (stores, database) = build_stores(&config.database)
            .await
            .context("初始化存储失败")?;
        let dispatcher = build_dispatcher(&config.pubsub)
            .await
            .context("初始化分发器失败")?;

        info!("分发通道: {}", dispatcher.channel());

        Ok(Self {
            state: build_state(stores, dispatcher),
            config,
            database,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// 运行 API 服务直到收到关闭信号
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        if !self.config.api.enabled {
            info!("API服务未启用，等待关闭信号");
            let _ = shutdown_rx.recv().await;
            self.close().await;
            return Ok(());
        }

        let app = create_app(self.state.clone(), &self.config.api);
        let listener = TcpListener::bind(&self.config.api.bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {}", self.config.api.bind_address))?;

        info!("API服务器启动在 http://{}", self.config.api.bind_address);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("API服务器收到关闭信号");
            })
            .await
            .context("API服务器运行失败")?;

        self.close().await;
        info!("API服务器已停止");
        Ok(())
    }

    async fn close(&self) {
        if let Some(database) = &self.database {
            database.close().await;
            info!("数据库连接池已关闭");
        }
    }
}

/// 由存储和分发器构建 API 状态
pub fn build_state(stores: StoreSet, dispatcher: Arc<dyn Dispatcher>) -> AppState {
    let controller = TaskController::new(
        stores.task_store.clone(),
        stores.group_registry.clone(),
        stores.job_registry.clone(),
        dispatcher,
    );
    let status_view = StatusView::new(
        stores.task_store,
        stores.job_registry,
        stores.execution_log.clone(),
    );

    AppState {
        controller: Arc::new(controller),
        status_view: Arc::new(status_view),
        group_registry: stores.group_registry,
        execution_log: stores.execution_log,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskplane_core::config::models::{PubSubBackend, StoreBackend};
    use taskplane_domain::{ExecStrategy, TaskCommand, TaskSpec};

    fn memory_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.database.backend = StoreBackend::Memory;
        config.pubsub.backend = PubSubBackend::Memory;
        config.api.bind_address = "127.0.0.1:0".to_string();
        config
    }

    #[tokio::test]
    async fn test_memory_backends_wire_up() {
        let app = Application::new(memory_config()).await.unwrap();
        let state = app.state();

        let outcome = state
            .controller
            .create_task(TaskCommand {
                spec: TaskSpec {
                    name: "cleanup".to_string(),
                    job_class: "Cleanup".to_string(),
                    exec_strategy: ExecStrategy::Once,
                    expression: None,
                    start_date: None,
                    end_date: None,
                    group: "ops".to_string(),
                },
                is_active: true,
            })
            .await
            .unwrap();
        assert_eq!(outcome.subscriber_count, 0);

        let groups = state.group_registry.list().await.unwrap();
        assert_eq!(groups.len(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let app = Application::new(memory_config()).await.unwrap();
        let (tx, rx) = broadcast::channel(1);

        let handle = tokio::spawn(async move { app.run(rx).await });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        tx.send(()).unwrap();

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_run_fails_when_address_in_use() {
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = memory_config();
        config.api.bind_address = occupied.local_addr().unwrap().to_string();

        let app = Application::new(config).await.unwrap();
        let (_tx, rx) = broadcast::channel(1);

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), app.run(rx))
            .await
            .unwrap();
        assert!(result.is_err());
    }
}
