pub mod health;
pub mod task_groups;
pub mod task_records;
pub mod tasks;
