use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use taskplane_controller::{StatusView, TaskController};
use taskplane_core::config::models::ApiConfig;
use taskplane_domain::{ExecutionLog, GroupRegistry};
use tower_http::timeout::TimeoutLayer;

use crate::handlers::{
    health::health_check,
    task_groups::group_options,
    task_records::list_records,
    tasks::{create_task, delete_task, get_task, list_tasks, put_task, run_once_task},
};
use crate::middleware::{cors_layer, request_logging, trace_layer};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<TaskController>,
    pub status_view: Arc<StatusView>,
    pub group_registry: Arc<dyn GroupRegistry>,
    pub execution_log: Arc<dyn ExecutionLog>,
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(put_task).delete(delete_task),
        )
        .route("/api/tasks/{id}/run", post(run_once_task))
        .route("/api/task-groups/options", get(group_options))
        .route("/api/task-records", get(list_records))
        .with_state(state)
}

/// 路由加上日志、追踪、超时与 CORS 中间件
pub fn create_app(state: AppState, config: &ApiConfig) -> Router {
    let mut app = create_routes(state)
        .layer(axum::middleware::from_fn(request_logging))
        .layer(trace_layer());

    if config.request_timeout_seconds > 0 {
        app = app.layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_seconds,
        )));
    }

    if config.cors_enabled {
        app = app.layer(cors_layer(config));
    }

    app
}
