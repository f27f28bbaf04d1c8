pub mod database;
pub mod memory;
pub mod pubsub;

use std::sync::Arc;

use taskplane_core::{
    config::models::{DatabaseConfig, StoreBackend},
    TaskPlaneResult,
};
use taskplane_domain::{ExecutionLog, GroupRegistry, JobRegistry, TaskStore};
use tracing::info;

pub use database::{DatabaseManager, mask_database_url};
pub use memory::*;
pub use pubsub::{build_dispatcher, InMemoryDispatcher, RedisDispatcher};

/// 控制面使用的四类存储
#[derive(Clone)]
pub struct StoreSet {
    pub task_store: Arc<dyn TaskStore>,
    pub group_registry: Arc<dyn GroupRegistry>,
    pub job_registry: Arc<dyn JobRegistry>,
    pub execution_log: Arc<dyn ExecutionLog>,
}

impl StoreSet {
    /// 全部使用内存实现
    pub fn in_memory() -> Self {
        Self {
            task_store: Arc::new(InMemoryTaskStore::new()),
            group_registry: Arc::new(InMemoryGroupRegistry::new()),
            job_registry: Arc::new(InMemoryJobRegistry::new()),
            execution_log: Arc::new(InMemoryExecutionLog::new()),
        }
    }
}

/// 按配置构建存储；PostgreSQL 后端同时返回连接池管理器
pub async fn build_stores(
    config: &DatabaseConfig,
) -> TaskPlaneResult<(StoreSet, Option<DatabaseManager>)> {
    match config.backend {
        StoreBackend::Memory => {
            info!("使用内存存储");
            Ok((StoreSet::in_memory(), None))
        }
        StoreBackend::Postgres => {
            let manager = DatabaseManager::connect(config).await?;
            if config.run_migrations {
                manager.migrate().await?;
            }
            Ok((manager.stores(), Some(manager)))
        }
    }
}
