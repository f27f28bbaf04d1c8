use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use taskplane_core::TaskPlaneError;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("控制面错误: {0}")]
    TaskPlane(#[from] TaskPlaneError),

    /// 请求体或查询串无法解析
    #[error("请求参数错误: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn classify(&self) -> (StatusCode, String, &'static str) {
        match self {
            ApiError::TaskPlane(TaskPlaneError::TaskNotFound { id }) => (
                StatusCode::NOT_FOUND,
                format!("任务 {id} 不存在"),
                "TASK_NOT_FOUND",
            ),
            ApiError::TaskPlane(TaskPlaneError::JobNotFound { id }) => (
                StatusCode::NOT_FOUND,
                format!("执行端任务 {id} 不存在"),
                "JOB_NOT_FOUND",
            ),
            ApiError::TaskPlane(TaskPlaneError::InvalidTaskId(raw)) => (
                StatusCode::BAD_REQUEST,
                format!("无效的任务 ID: {raw}"),
                "INVALID_TASK_ID",
            ),
            ApiError::TaskPlane(TaskPlaneError::InvalidTaskParams(msg)) => (
                StatusCode::BAD_REQUEST,
                format!("任务参数无效: {msg}"),
                "INVALID_TASK_PARAMS",
            ),
            ApiError::TaskPlane(TaskPlaneError::Configuration(msg)) => (
                StatusCode::BAD_REQUEST,
                format!("查询参数无效: {msg}"),
                "INVALID_QUERY",
            ),
            ApiError::TaskPlane(
                err @ (TaskPlaneError::MessageQueue(_) | TaskPlaneError::PublishTimeout { .. }),
            ) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("任务已保存，但分发失败: {err}"),
                "DISPATCH_FAILED",
            ),
            ApiError::TaskPlane(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "系统内部错误".to_string(),
                "INTERNAL_ERROR",
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                format!("请求参数错误: {msg}"),
                "BAD_REQUEST",
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, error_type) = self.classify();

        if status.is_server_error() {
            error!("请求处理失败: {}", self);
        }

        let body = Json(json!({
            "success": false,
            "error": {
                "message": message,
                "type": error_type,
                "code": status.as_u16(),
            },
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(error: impl Into<ApiError>) -> StatusCode {
        error.into().into_response().status()
    }

    #[test]
    fn test_not_found_maps_to_404() {
        assert_eq!(
            status_of(TaskPlaneError::task_not_found(5)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_client_errors_map_to_400() {
        assert_eq!(
            status_of(TaskPlaneError::InvalidTaskId("abc".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(TaskPlaneError::InvalidTaskParams("name".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(TaskPlaneError::Configuration("regex".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ApiError::BadRequest("x".to_string())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_dispatch_failures_map_to_503() {
        assert_eq!(
            status_of(TaskPlaneError::PublishTimeout {
                channel: "q".to_string(),
                timeout_ms: 100,
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_storage_errors_map_to_500() {
        assert_eq!(
            status_of(TaskPlaneError::DatabaseOperation("down".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
