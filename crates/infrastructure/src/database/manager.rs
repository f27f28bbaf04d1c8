use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use taskplane_core::{config::models::DatabaseConfig, TaskPlaneError, TaskPlaneResult};
use tracing::{debug, info};

use super::postgres::{
    PostgresExecutionLog, PostgresGroupRegistry, PostgresJobRegistry, PostgresTaskStore,
};
use crate::StoreSet;

/// 数据库连接池管理器
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    /// 按配置建立连接池
    pub async fn connect(config: &DatabaseConfig) -> TaskPlaneResult<Self> {
        info!("连接数据库: {}", mask_database_url(&config.url));

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 运行数据库迁移
    pub async fn migrate(&self) -> TaskPlaneResult<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| TaskPlaneError::DatabaseOperation(format!("运行数据库迁移失败: {e}")))?;
        info!("数据库迁移完成");
        Ok(())
    }

    pub async fn health_check(&self) -> TaskPlaneResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        debug!("数据库健康检查通过");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// 基于当前连接池构建四类存储
    pub fn stores(&self) -> StoreSet {
        StoreSet {
            task_store: Arc::new(PostgresTaskStore::new(self.pool.clone())),
            group_registry: Arc::new(PostgresGroupRegistry::new(self.pool.clone())),
            job_registry: Arc::new(PostgresJobRegistry::new(self.pool.clone())),
            execution_log: Arc::new(PostgresExecutionLog::new(self.pool.clone())),
        }
    }
}

/// 隐藏连接串中的密码
pub fn mask_database_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let rest = &url[scheme_end + 3..];
    let Some(at) = rest.find('@') else {
        return url.to_string();
    };
    let credentials = &rest[..at];
    match credentials.find(':') {
        Some(colon) => format!(
            "{}{}:***{}",
            &url[..scheme_end + 3],
            &credentials[..colon],
            &rest[at..]
        ),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_database_url() {
        assert_eq!(
            mask_database_url("postgresql://admin:secret@db:5432/taskplane"),
            "postgresql://admin:***@db:5432/taskplane"
        );
        assert_eq!(
            mask_database_url("postgresql://localhost/taskplane"),
            "postgresql://localhost/taskplane"
        );
        assert_eq!(
            mask_database_url("postgresql://admin@db/taskplane"),
            "postgresql://admin@db/taskplane"
        );
    }
}
