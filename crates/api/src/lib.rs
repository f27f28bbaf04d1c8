//! # Taskplane API
//!
//! 任务控制面的 REST 接口，基于 Axum。
//!
//! ## API 端点
//!
//! - `GET /health` - 健康检查
//! - `GET /api/tasks` - 任务列表（`id`、`name`、`group`、`is_active`、`page`、`limit`、`order_field`、`order`）
//! - `POST /api/tasks` - 创建任务
//! - `GET /api/tasks/{id}` - 任务详情，含 `is_active` 与 `last_run_datetime`
//! - `PUT /api/tasks/{id}` - 整体更新任务
//! - `DELETE /api/tasks/{id}` - 删除任务
//! - `POST /api/tasks/{id}/run` - 立即执行一次
//! - `GET /api/task-groups/options` - 分组选择项
//! - `GET /api/task-records` - 执行记录（`job_id`、`name`、`page`、`limit`）
//!
//! 成功响应统一为 [`response::ApiResponse`] 信封，错误响应见 [`error::ApiError`]。

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use routes::{create_app, create_routes, AppState};
