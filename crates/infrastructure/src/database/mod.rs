//! PostgreSQL 存储实现
//!
//! 表名与列名是和执行端共享的进程间契约，见 `migrations/`。

pub mod manager;
pub mod postgres;

pub use manager::{mask_database_url, DatabaseManager};
pub use postgres::*;
