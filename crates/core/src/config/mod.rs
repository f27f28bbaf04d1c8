//! 配置管理
//!
//! 配置加载顺序：
//! 1. 内置默认值
//! 2. TOML 配置文件
//! 3. 环境变量覆盖（前缀 `TASKPLANE_`，分隔符 `__`）
//!
//! 各配置段都提供 `validate()`，由 [`models::AppConfig::validate`] 统一调用。

pub mod models;

pub use models::*;
