use axum::{extract::State, response::IntoResponse};

use crate::{error::ApiResult, response::success, routes::AppState};

/// 分组选择项，不分页
pub async fn group_options(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let groups = state.group_registry.list().await?;
    Ok(success(groups))
}
