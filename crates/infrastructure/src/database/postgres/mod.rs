mod execution_log;
mod group_registry;
mod job_registry;
mod task_store;

pub use execution_log::PostgresExecutionLog;
pub use group_registry::PostgresGroupRegistry;
pub use job_registry::PostgresJobRegistry;
pub use task_store::PostgresTaskStore;
