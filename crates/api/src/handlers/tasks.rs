use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    response::IntoResponse,
    Json,
};
use serde_json::json;
use taskplane_domain::{parse_task_id, TaskCommand, TaskListParams};
use tracing::debug;

use crate::{
    error::ApiResult,
    response::{created, success, ApiResponse, PaginatedResponse},
    routes::AppState,
};

/// 获取任务列表
pub async fn list_tasks(
    State(state): State<AppState>,
    params: Result<Query<TaskListParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(params) = params?;
    let query = params.to_query()?;
    let sort = params.sort()?;
    let pagination = params.pagination();

    let (items, total) = state.status_view.list(&query, sort, pagination).await?;

    Ok(success(PaginatedResponse::new(
        items,
        total,
        pagination.page,
        pagination.limit,
    )))
}

/// 创建任务
pub async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<TaskCommand>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(command) = payload?;
    let outcome = state.controller.create_task(command).await?;
    Ok(created(outcome))
}

/// 获取任务详情（含运行状态）
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_task_id(&id)?;
    let view = state.status_view.get(id).await?;
    Ok(success(view))
}

/// 整体更新任务
pub async fn put_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TaskCommand>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_task_id(&id)?;
    let Json(command) = payload?;
    let outcome = state.controller.put_task(id, command).await?;
    Ok(success(outcome))
}

/// 删除任务
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_task_id(&id)?;
    let deleted = state.controller.delete_task(id).await?;
    Ok(ApiResponse::success_with_message(
        deleted,
        format!("任务 {id} 已删除"),
    ))
}

/// 立即执行一次
pub async fn run_once_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_task_id(&id)?;
    let subscriber_count = state.controller.run_once_task(id).await?;
    debug!("任务 {} 单次执行消息送达 {} 个订阅者", id, subscriber_count);
    Ok(success(json!({ "subscriber_count": subscriber_count })))
}
