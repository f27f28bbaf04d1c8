pub mod config;
pub mod errors;
pub mod logging;

pub use config::models::AppConfig;
pub use errors::*;
pub use logging::{init_logging, LogConfig, LogFormat};

/// 统一的Result类型
pub type TaskPlaneResult<T> = std::result::Result<T, TaskPlaneError>;
