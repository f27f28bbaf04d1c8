use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use taskplane_core::{TaskPlaneError, TaskPlaneResult};
use taskplane_domain::{
    ExecutionLog, JobRegistry, Pagination, TaskDefinition, TaskId, TaskQuery, TaskSort,
    TaskStatusView, TaskStore,
};
use tracing::{debug, instrument};

/// 任务状态视图
///
/// 以任务 ID 的字符串形式为关联键：
/// - `job_registry` 中存在记录即 `is_active`
/// - `execution_log` 中按存储顺序最后一条记录的时间即 `last_run_datetime`
///
/// 调用方的过滤条件在合并之后生效，因此可以引用这两个计算字段。
pub struct StatusView {
    task_store: Arc<dyn TaskStore>,
    job_registry: Arc<dyn JobRegistry>,
    execution_log: Arc<dyn ExecutionLog>,
}

impl StatusView {
    pub fn new(
        task_store: Arc<dyn TaskStore>,
        job_registry: Arc<dyn JobRegistry>,
        execution_log: Arc<dyn ExecutionLog>,
    ) -> Self {
        Self {
            task_store,
            job_registry,
            execution_log,
        }
    }

    /// 单条查询，返回第一条匹配
    ///
    /// 无匹配时 `return_none` 为真返回 `None`，否则返回 `TaskNotFound`。
    #[instrument(skip(self, query))]
    pub async fn find_one(
        &self,
        query: &TaskQuery,
        return_none: bool,
    ) -> TaskPlaneResult<Option<TaskStatusView>> {
        let first = self.resolve(query).await?.into_iter().next();

        match first {
            Some(view) => Ok(Some(view)),
            None if return_none => Ok(None),
            None => {
                let id = query
                    .id_hint()?
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "匹配条件".to_string());
                Err(TaskPlaneError::task_not_found(id))
            }
        }
    }

    /// 按 ID 查询单个任务
    pub async fn get(&self, id: TaskId) -> TaskPlaneResult<TaskStatusView> {
        self.find_one(&TaskQuery::by_id(id), false)
            .await?
            .ok_or_else(|| TaskPlaneError::task_not_found(id))
    }

    /// 列表查询，返回当前页与过滤后、分页前的总数
    #[instrument(skip(self, query))]
    pub async fn list(
        &self,
        query: &TaskQuery,
        sort: TaskSort,
        pagination: Pagination,
    ) -> TaskPlaneResult<(Vec<TaskStatusView>, u64)> {
        let mut views = self.resolve(query).await?;
        let total = views.len() as u64;

        sort.apply(&mut views);
        let page = pagination.window(views);

        debug!("任务列表查询: 返回 {} 条, 共 {} 条", page.len(), total);
        Ok((page, total))
    }

    /// 读取候选定义、合并执行端数据并应用过滤条件，结果保持存储顺序
    async fn resolve(&self, query: &TaskQuery) -> TaskPlaneResult<Vec<TaskStatusView>> {
        query.validate()?;

        let definitions = match query.id_hint()? {
            Some(id) => self.task_store.get(id).await?.into_iter().collect(),
            None => self.task_store.scan().await?,
        };

        let views = self.merge(definitions).await?;

        let mut matched = Vec::with_capacity(views.len());
        for view in views {
            if query.matches(&view)? {
                matched.push(view);
            }
        }
        Ok(matched)
    }

    async fn merge(&self, definitions: Vec<TaskDefinition>) -> TaskPlaneResult<Vec<TaskStatusView>> {
        if definitions.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = definitions.iter().map(|d| d.id.join_key()).collect();

        let registered: HashSet<String> = self
            .job_registry
            .find_by_ids(&keys)
            .await?
            .into_iter()
            .map(|registration| registration.id)
            .collect();

        let last_run: HashMap<String, DateTime<Utc>> = self
            .execution_log
            .last_runs(&keys)
            .await?
            .into_iter()
            .collect();

        Ok(definitions
            .into_iter()
            .map(|definition| {
                let key = definition.id.join_key();
                TaskStatusView {
                    is_active: registered.contains(&key),
                    last_run_datetime: last_run.get(&key).copied(),
                    definition,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use taskplane_domain::{ExecStrategy, JobRegistration, SortField, SortOrder, TaskSpec};
    use taskplane_infrastructure::{InMemoryExecutionLog, InMemoryJobRegistry, InMemoryTaskStore};

    fn spec(name: &str, group: &str) -> TaskSpec {
        TaskSpec {
            name: name.to_string(),
            job_class: "Job".to_string(),
            exec_strategy: ExecStrategy::Interval,
            expression: Some("60".to_string()),
            start_date: None,
            end_date: None,
            group: group.to_string(),
        }
    }

    struct Fixture {
        tasks: Arc<InMemoryTaskStore>,
        registry: Arc<InMemoryJobRegistry>,
        log: Arc<InMemoryExecutionLog>,
        view: StatusView,
    }

    fn fixture() -> Fixture {
        let tasks = Arc::new(InMemoryTaskStore::new());
        let registry = Arc::new(InMemoryJobRegistry::new());
        let log = Arc::new(InMemoryExecutionLog::new());
        let view = StatusView::new(tasks.clone(), registry.clone(), log.clone());
        Fixture {
            tasks,
            registry,
            log,
            view,
        }
    }

    #[tokio::test]
    async fn test_join_uses_registry_and_last_log_entry() {
        let f = fixture();
        let task = f.tasks.insert(&spec("sync", "g")).await.unwrap();
        let key = task.id.join_key();

        let base = Utc::now();
        f.registry.register(key.clone()).await;
        f.log.append(key.clone(), None, base + Duration::minutes(10)).await;
        // 存储顺序最后一条，时间更早
        f.log.append(key.clone(), None, base).await;
        f.log.append("999", None, base + Duration::hours(1)).await;

        let view = f.view.get(task.id).await.unwrap();
        assert!(view.is_active);
        assert_eq!(view.last_run_datetime, Some(base));
    }

    #[tokio::test]
    async fn test_unregistered_task_is_inactive_without_runs() {
        let f = fixture();
        let task = f.tasks.insert(&spec("idle", "g")).await.unwrap();

        let view = f.view.get(task.id).await.unwrap();
        assert!(!view.is_active);
        assert_eq!(view.last_run_datetime, None);
    }

    #[tokio::test]
    async fn test_find_one_return_none_flag() {
        let f = fixture();
        let query = TaskQuery::by_id(TaskId(404));

        assert_eq!(f.view.find_one(&query, true).await.unwrap(), None);
        let err = f.view.find_one(&query, false).await.unwrap_err();
        assert!(matches!(err, TaskPlaneError::TaskNotFound { ref id } if id == "404"));
    }

    #[tokio::test]
    async fn test_filter_on_is_active_after_join() {
        let f = fixture();
        let running = f.tasks.insert(&spec("a", "g")).await.unwrap();
        f.tasks.insert(&spec("b", "g")).await.unwrap();
        f.registry.register(running.id.join_key()).await;

        let query = TaskQuery::new().eq("is_active", true);
        let (views, total) = f
            .view
            .list(&query, TaskSort::default(), Pagination::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(views[0].id(), running.id);
    }

    #[tokio::test]
    async fn test_list_sorts_then_pages_with_total() {
        let f = fixture();
        for i in 0..25 {
            f.tasks.insert(&spec(&format!("t{i:02}"), "g")).await.unwrap();
        }

        let (page, total) = f
            .view
            .list(&TaskQuery::new(), TaskSort::default(), Pagination::new(2, 10))
            .await
            .unwrap();
        assert_eq!(total, 25);
        // 默认按创建时间倒序，第二页从第 11 新的任务开始
        let ids: Vec<i64> = page.iter().map(|v| v.id().0).collect();
        assert_eq!(ids, (6..=15).rev().collect::<Vec<_>>());

        let (all, _) = f
            .view
            .list(
                &TaskQuery::new(),
                TaskSort::new(SortField::Name, SortOrder::Asc),
                Pagination::unpaged(),
            )
            .await
            .unwrap();
        assert_eq!(all.len(), 25);
        assert_eq!(all[0].definition.spec.name, "t00");
    }

    #[tokio::test]
    async fn test_malformed_id_is_invalid_not_missing() {
        let f = fixture();
        let query = TaskQuery::new().object_id("id", "not-a-number");
        let err = f.view.find_one(&query, true).await.unwrap_err();
        assert!(matches!(err, TaskPlaneError::InvalidTaskId(_)));
    }

    struct FailingRegistry;

    #[async_trait]
    impl JobRegistry for FailingRegistry {
        async fn find_by_ids(&self, _keys: &[String]) -> TaskPlaneResult<Vec<JobRegistration>> {
            Err(TaskPlaneError::DatabaseOperation("registry offline".to_string()))
        }

        async fn remove(&self, _key: &str) -> TaskPlaneResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_registry_errors_propagate() {
        let tasks = Arc::new(InMemoryTaskStore::new());
        tasks.insert(&spec("a", "g")).await.unwrap();
        let view = StatusView::new(
            tasks,
            Arc::new(FailingRegistry),
            Arc::new(InMemoryExecutionLog::new()),
        );

        let result = view
            .list(&TaskQuery::new(), TaskSort::default(), Pagination::default())
            .await;
        assert!(matches!(result, Err(TaskPlaneError::DatabaseOperation(_))));
    }
}
