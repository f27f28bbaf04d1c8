//! 任务控制面
//!
//! [`TaskController`] 负责写路径：持久化任务定义后尽力通知执行端。
//! [`StatusView`] 负责读路径：把任务定义与执行端数据合并成状态视图。

pub mod status_view;
pub mod task_controller;

pub use status_view::StatusView;
pub use task_controller::TaskController;
