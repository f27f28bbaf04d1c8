use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::IntoResponse,
};
use taskplane_domain::RecordQuery;

use crate::{
    error::ApiResult,
    response::{success, PaginatedResponse},
    routes::AppState,
};

/// 执行记录列表，按时间倒序
pub async fn list_records(
    State(state): State<AppState>,
    query: Result<Query<RecordQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;
    let pagination = query.pagination();
    let (items, total) = state.execution_log.list(&query).await?;

    Ok(success(PaginatedResponse::new(
        items,
        total,
        pagination.page,
        pagination.limit,
    )))
}
