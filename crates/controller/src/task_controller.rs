use std::sync::Arc;

use taskplane_core::{TaskPlaneError, TaskPlaneResult};
use taskplane_domain::{
    validate_task_spec, DispatchMessage, DispatchOutcome, Dispatcher, GroupRegistry, JobRegistry,
    TaskCommand, TaskDefinition, TaskId, TaskStore,
};
use tracing::{debug, info, warn};

/// 任务控制器
///
/// 先持久化意图，再尽力通知执行端。各步骤之间没有事务，
/// 中途失败时已完成的写入保留，不做补偿。
pub struct TaskController {
    task_store: Arc<dyn TaskStore>,
    group_registry: Arc<dyn GroupRegistry>,
    job_registry: Arc<dyn JobRegistry>,
    dispatcher: Arc<dyn Dispatcher>,
}

impl TaskController {
    pub fn new(
        task_store: Arc<dyn TaskStore>,
        group_registry: Arc<dyn GroupRegistry>,
        job_registry: Arc<dyn JobRegistry>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        Self {
            task_store,
            group_registry,
            job_registry,
            dispatcher,
        }
    }

    /// 创建任务
    pub async fn create_task(&self, command: TaskCommand) -> TaskPlaneResult<DispatchOutcome> {
        let (spec, is_active) = command.into_parts();
        validate_task_spec(&spec)?;

        let definition = self.task_store.insert(&spec).await?;
        self.ensure_group(&definition.spec.group).await?;

        info!(
            "创建任务: {} (ID: {}, is_active: {})",
            definition.spec.name, definition.id, is_active
        );

        self.schedule_if_active(&definition, is_active).await
    }

    /// 整体更新任务
    ///
    /// 先删除执行端的运行记录，再按需重新下发调度，两步之间执行端
    /// 上没有该任务。
    pub async fn put_task(
        &self,
        id: TaskId,
        command: TaskCommand,
    ) -> TaskPlaneResult<DispatchOutcome> {
        let (spec, is_active) = command.into_parts();
        validate_task_spec(&spec)?;

        let definition = self.task_store.replace(id, &spec).await?;
        self.ensure_group(&definition.spec.group).await?;
        self.unregister_job(id).await?;

        info!(
            "更新任务: {} (ID: {}, is_active: {})",
            definition.spec.name, id, is_active
        );

        self.schedule_if_active(&definition, is_active).await
    }

    /// 删除任务，并尽力移除执行端的运行记录
    pub async fn delete_task(&self, id: TaskId) -> TaskPlaneResult<bool> {
        self.task_store.remove(id).await?;
        self.unregister_job(id).await?;

        info!("删除任务: {}", id);
        Ok(true)
    }

    /// 立即执行一次，不修改任何存储字段
    pub async fn run_once_task(&self, id: TaskId) -> TaskPlaneResult<i64> {
        let definition = self
            .task_store
            .get(id)
            .await?
            .ok_or_else(|| TaskPlaneError::task_not_found(id))?;

        let message = DispatchMessage::run_once(definition.id, definition.spec.job_class.clone());
        let subscribers = self.publish(&message).await?;

        info!(
            "单次执行任务: {} (ID: {}), 订阅者: {}",
            definition.spec.name, id, subscribers
        );
        Ok(subscribers)
    }

    async fn ensure_group(&self, group: &str) -> TaskPlaneResult<()> {
        if self.group_registry.ensure(group).await? {
            info!("新增任务分组: {}", group);
        }
        Ok(())
    }

    /// 删除执行端运行记录，只忽略记录不存在
    async fn unregister_job(&self, id: TaskId) -> TaskPlaneResult<()> {
        match self.job_registry.remove(&id.join_key()).await {
            Ok(()) => {
                debug!("已移除执行端任务记录: {}", id);
                Ok(())
            }
            Err(TaskPlaneError::JobNotFound { .. }) => {
                debug!("执行端没有任务 {} 的运行记录", id);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn schedule_if_active(
        &self,
        definition: &TaskDefinition,
        is_active: bool,
    ) -> TaskPlaneResult<DispatchOutcome> {
        if !is_active {
            return Ok(DispatchOutcome::not_dispatched());
        }

        let subscribers = self.publish(&DispatchMessage::schedule(definition)).await?;
        Ok(DispatchOutcome {
            subscriber_count: subscribers,
            is_active,
        })
    }

    /// 发布失败时之前的存储写入不回滚，不一致只记录不修复
    async fn publish(&self, message: &DispatchMessage) -> TaskPlaneResult<i64> {
        self.dispatcher.publish(message).await.map_err(|e| {
            warn!(
                "任务 {} 分发失败 (通道: {}): {}",
                message.job_name(),
                self.dispatcher.channel(),
                e
            );
            e
        })
    }
}
