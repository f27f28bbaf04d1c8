//! 内存存储实现
//!
//! 用于嵌入式运行与测试，语义与 PostgreSQL 实现一致。执行端拥有的
//! `JobRegistry` 与 `ExecutionLog` 额外提供写入方法，用于模拟执行端。

mod execution_log;
mod group_registry;
mod job_registry;
mod task_store;

pub use execution_log::InMemoryExecutionLog;
pub use group_registry::InMemoryGroupRegistry;
pub use job_registry::InMemoryJobRegistry;
pub use task_store::InMemoryTaskStore;
