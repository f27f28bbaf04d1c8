use std::collections::BTreeSet;

use async_trait::async_trait;
use taskplane_core::{TaskPlaneError, TaskPlaneResult};
use taskplane_domain::{JobRegistration, JobRegistry};
use tokio::sync::RwLock;
use tracing::debug;

/// 内存运行中任务表
#[derive(Debug, Default)]
pub struct InMemoryJobRegistry {
    keys: RwLock<BTreeSet<String>>,
}

impl InMemoryJobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 模拟执行端登记任务
    pub async fn register(&self, key: impl Into<String>) {
        self.keys.write().await.insert(key.into());
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.keys.read().await.contains(key)
    }
}

#[async_trait]
impl JobRegistry for InMemoryJobRegistry {
    async fn find_by_ids(&self, keys: &[String]) -> TaskPlaneResult<Vec<JobRegistration>> {
        let registered = self.keys.read().await;
        Ok(keys
            .iter()
            .filter(|k| registered.contains(k.as_str()))
            .map(|k| JobRegistration { id: k.clone() })
            .collect())
    }

    async fn remove(&self, key: &str) -> TaskPlaneResult<()> {
        if self.keys.write().await.remove(key) {
            debug!("删除执行端任务记录: {}", key);
            Ok(())
        } else {
            Err(TaskPlaneError::job_not_found(key))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_find_remove() {
        let registry = InMemoryJobRegistry::new();
        registry.register("1").await;
        registry.register("3").await;

        let found = registry
            .find_by_ids(&["1".to_string(), "2".to_string(), "3".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);

        registry.remove("1").await.unwrap();
        assert!(!registry.contains("1").await);
        assert!(matches!(
            registry.remove("1").await,
            Err(TaskPlaneError::JobNotFound { .. })
        ));
    }
}
