//! 领域仓储抽象
//!
//! 控制面读写四类存储：
//! - [`TaskStore`]：任务定义，控制面独占写入
//! - [`GroupRegistry`]：分组标签，追加写入
//! - [`JobRegistry`]：执行端的运行中任务记录，控制面只读取和删除
//! - [`ExecutionLog`]：执行端的执行日志，控制面只读

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use taskplane_core::TaskPlaneResult;

use crate::entities::{
    ExecutionRecord, GroupTag, JobRegistration, TaskDefinition, TaskId, TaskSpec,
};
use crate::query::RecordQuery;

/// 任务定义存储
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// 写入新任务，由存储分配 ID 和创建时间
    async fn insert(&self, spec: &TaskSpec) -> TaskPlaneResult<TaskDefinition>;

    /// 整体替换可编辑字段，保留 `id` 与 `create_datetime`
    ///
    /// 任务不存在时返回 `TaskNotFound`。
    async fn replace(&self, id: TaskId, spec: &TaskSpec) -> TaskPlaneResult<TaskDefinition>;

    /// 删除任务，任务不存在时返回 `TaskNotFound`
    async fn remove(&self, id: TaskId) -> TaskPlaneResult<()>;

    async fn get(&self, id: TaskId) -> TaskPlaneResult<Option<TaskDefinition>>;

    /// 按存储顺序返回全部任务
    async fn scan(&self) -> TaskPlaneResult<Vec<TaskDefinition>>;
}

/// 分组标签存储
#[async_trait]
pub trait GroupRegistry: Send + Sync {
    async fn find(&self, value: &str) -> TaskPlaneResult<Option<GroupTag>>;

    async fn insert(&self, value: &str) -> TaskPlaneResult<GroupTag>;

    /// 去重后的全部分组
    async fn list(&self) -> TaskPlaneResult<Vec<GroupTag>>;

    /// 分组不存在时创建，返回是否新建
    ///
    /// 先查后写，并发创建同名分组时可能产生重复记录，`list` 负责去重。
    async fn ensure(&self, value: &str) -> TaskPlaneResult<bool> {
        if self.find(value).await?.is_some() {
            return Ok(false);
        }
        self.insert(value).await?;
        Ok(true)
    }
}

/// 执行端的运行中任务注册表
#[async_trait]
pub trait JobRegistry: Send + Sync {
    /// 返回 `id` 在给定键集合中的记录
    async fn find_by_ids(&self, keys: &[String]) -> TaskPlaneResult<Vec<JobRegistration>>;

    /// 删除记录，不存在时返回 `JobNotFound`
    async fn remove(&self, key: &str) -> TaskPlaneResult<()>;
}

/// 执行端的执行日志
#[async_trait]
pub trait ExecutionLog: Send + Sync {
    /// 每个键按存储顺序最后一条记录的 `(job_id, create_datetime)`
    ///
    /// 没有记录的键不出现在结果中。
    async fn last_runs(&self, keys: &[String]) -> TaskPlaneResult<Vec<(String, DateTime<Utc>)>>;

    /// 执行记录分页查询，按时间倒序，同时返回过滤后的总数
    async fn list(&self, query: &RecordQuery) -> TaskPlaneResult<(Vec<ExecutionRecord>, u64)>;
}
