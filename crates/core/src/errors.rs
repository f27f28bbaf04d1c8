use thiserror::Error;

/// 控制面错误类型定义
#[derive(Debug, Error)]
pub enum TaskPlaneError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("数据库操作错误: {0}")]
    DatabaseOperation(String),

    #[error("任务未找到: {id}")]
    TaskNotFound { id: String },

    /// 执行端的运行中任务记录不存在
    #[error("运行中任务记录未找到: {id}")]
    JobNotFound { id: String },

    #[error("无效的任务ID: {0}")]
    InvalidTaskId(String),

    #[error("无效的任务参数: {0}")]
    InvalidTaskParams(String),

    #[error("消息队列错误: {0}")]
    MessageQueue(String),

    #[error("消息发布超时: 通道 {channel} 在 {timeout_ms}ms 内未响应")]
    PublishTimeout { channel: String, timeout_ms: u64 },

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl TaskPlaneError {
    pub fn task_not_found(id: impl ToString) -> Self {
        Self::TaskNotFound { id: id.to_string() }
    }

    pub fn job_not_found(id: impl ToString) -> Self {
        Self::JobNotFound { id: id.to_string() }
    }

    /// 是否为"记录不存在"类错误
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TaskPlaneError::TaskNotFound { .. } | TaskPlaneError::JobNotFound { .. }
        )
    }
}

impl From<serde_json::Error> for TaskPlaneError {
    fn from(err: serde_json::Error) -> Self {
        TaskPlaneError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(TaskPlaneError::task_not_found(7).is_not_found());
        assert!(TaskPlaneError::job_not_found("7").is_not_found());
        assert!(!TaskPlaneError::MessageQueue("down".to_string()).is_not_found());
        assert!(!TaskPlaneError::InvalidTaskId("abc".to_string()).is_not_found());
    }

    #[test]
    fn test_error_display() {
        let err = TaskPlaneError::task_not_found(42);
        assert_eq!(err.to_string(), "任务未找到: 42");

        let err = TaskPlaneError::PublishTimeout {
            channel: "queue".to_string(),
            timeout_ms: 500,
        };
        assert!(err.to_string().contains("500ms"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: TaskPlaneError = json_err.into();
        assert!(matches!(err, TaskPlaneError::Serialization(_)));
    }
}
