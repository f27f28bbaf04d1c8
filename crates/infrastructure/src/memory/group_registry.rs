use std::collections::HashSet;

use async_trait::async_trait;
use taskplane_core::TaskPlaneResult;
use taskplane_domain::{GroupRegistry, GroupTag};
use tokio::sync::RwLock;
use tracing::info;

/// 内存分组存储，与数据库一样不做唯一约束
#[derive(Debug, Default)]
pub struct InMemoryGroupRegistry {
    tags: RwLock<Vec<GroupTag>>,
}

impl InMemoryGroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 原始记录数（含重复）
    pub async fn raw_count(&self) -> usize {
        self.tags.read().await.len()
    }
}

#[async_trait]
impl GroupRegistry for InMemoryGroupRegistry {
    async fn find(&self, value: &str) -> TaskPlaneResult<Option<GroupTag>> {
        let tags = self.tags.read().await;
        Ok(tags.iter().find(|t| t.value == value).cloned())
    }

    async fn insert(&self, value: &str) -> TaskPlaneResult<GroupTag> {
        let mut tags = self.tags.write().await;
        let tag = GroupTag {
            id: tags.len() as i64 + 1,
            value: value.to_string(),
        };
        tags.push(tag.clone());

        info!("新建任务分组: {}", value);
        Ok(tag)
    }

    async fn list(&self) -> TaskPlaneResult<Vec<GroupTag>> {
        let tags = self.tags.read().await;
        let mut seen = HashSet::new();
        let mut distinct: Vec<GroupTag> = tags
            .iter()
            .filter(|t| seen.insert(t.value.clone()))
            .cloned()
            .collect();
        distinct.sort_by(|a, b| a.value.cmp(&b.value));
        Ok(distinct)
    }
}
