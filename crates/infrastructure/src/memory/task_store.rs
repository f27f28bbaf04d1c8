use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use taskplane_core::{TaskPlaneError, TaskPlaneResult};
use taskplane_domain::{TaskDefinition, TaskId, TaskSpec, TaskStore};
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct TaskTable {
    rows: BTreeMap<i64, TaskDefinition>,
    next_id: i64,
    last_created: Option<DateTime<Utc>>,
}

impl TaskTable {
    /// 保证创建时间严格递增
    fn next_create_datetime(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let created = match self.last_created {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_created = Some(created);
        created
    }
}

/// 内存任务存储，按 ID 升序即为存储顺序
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    table: RwLock<TaskTable>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, spec: &TaskSpec) -> TaskPlaneResult<TaskDefinition> {
        let mut table = self.table.write().await;
        table.next_id += 1;
        let id = TaskId(table.next_id);
        let definition = TaskDefinition {
            id,
            spec: spec.clone(),
            create_datetime: table.next_create_datetime(),
        };
        table.rows.insert(id.0, definition.clone());

        info!("写入任务定义: {} (ID: {})", spec.name, id);
        Ok(definition)
    }

    async fn replace(&self, id: TaskId, spec: &TaskSpec) -> TaskPlaneResult<TaskDefinition> {
        let mut table = self.table.write().await;
        let row = table
            .rows
            .get_mut(&id.0)
            .ok_or_else(|| TaskPlaneError::task_not_found(id))?;
        row.spec = spec.clone();

        info!("替换任务定义: {} (ID: {})", spec.name, id);
        Ok(row.clone())
    }

    async fn remove(&self, id: TaskId) -> TaskPlaneResult<()> {
        let mut table = self.table.write().await;
        table
            .rows
            .remove(&id.0)
            .map(|_| info!("删除任务定义: {}", id))
            .ok_or_else(|| TaskPlaneError::task_not_found(id))
    }

    async fn get(&self, id: TaskId) -> TaskPlaneResult<Option<TaskDefinition>> {
        let table = self.table.read().await;
        debug!("查询任务定义 {}", id);
        Ok(table.rows.get(&id.0).cloned())
    }

    async fn scan(&self) -> TaskPlaneResult<Vec<TaskDefinition>> {
        let table = self.table.read().await;
        Ok(table.rows.values().cloned().collect())
    }
}
