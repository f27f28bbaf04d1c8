//! 控制面与执行端之间的分发消息
//!
//! 消息以 UTF-8 JSON 发布到一个固定通道，按 `operation` 字段区分类型：
//!
//! ```json
//! { "operation": "add_job",
//!   "task": { "exec_strategy": "cron",
//!             "job_params": { "name": "42", "job_class": "SyncPrices",
//!                             "expression": "0 9 * * 1-5",
//!                             "start_date": "2024-01-01", "end_date": null } } }
//! ```
//!
//! 这是无版本号的跨进程契约，字段名不得单方面修改；结构变化时同步提升
//! [`SCHEMA_VERSION`] 并协调执行端。

use async_trait::async_trait;
use serde::Serialize;
use taskplane_core::TaskPlaneResult;

use crate::entities::{ExecStrategy, TaskDefinition, TaskId};

/// 当前消息结构版本
pub const SCHEMA_VERSION: u32 = 1;

/// 分发消息
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum DispatchMessage {
    AddJob { task: DispatchTask },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchTask {
    pub exec_strategy: ExecStrategy,
    pub job_params: JobParams,
}

/// 执行端添加任务所需的参数
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobParams {
    /// 任务 ID 的字符串形式，执行端以此作为 job id
    pub name: String,
    pub job_class: String,
    /// 单次立即执行时为 `None`，此时不输出任何调度字段
    #[serde(flatten)]
    pub schedule: Option<JobSchedule>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSchedule {
    pub expression: Option<String>,
    /// 仅 interval / cron 输出起止时间（可为 null）
    #[serde(flatten)]
    pub window: Option<ScheduleWindow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleWindow {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DispatchMessage {
    /// 按任务定义构造调度消息
    pub fn schedule(definition: &TaskDefinition) -> Self {
        let spec = &definition.spec;
        let window = spec.exec_strategy.uses_window().then(|| ScheduleWindow {
            start_date: spec.start_date.clone(),
            end_date: spec.end_date.clone(),
        });

        DispatchMessage::AddJob {
            task: DispatchTask {
                exec_strategy: spec.exec_strategy,
                job_params: JobParams {
                    name: definition.id.join_key(),
                    job_class: spec.job_class.clone(),
                    schedule: Some(JobSchedule {
                        expression: spec.expression.clone(),
                        window,
                    }),
                },
            },
        }
    }

    /// 构造单次立即执行消息，只携带身份与代码引用
    pub fn run_once(id: TaskId, job_class: impl Into<String>) -> Self {
        DispatchMessage::AddJob {
            task: DispatchTask {
                exec_strategy: ExecStrategy::Once,
                job_params: JobParams {
                    name: id.join_key(),
                    job_class: job_class.into(),
                    schedule: None,
                },
            },
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            DispatchMessage::AddJob { .. } => "add_job",
        }
    }

    pub fn job_name(&self) -> &str {
        match self {
            DispatchMessage::AddJob { task } => &task.job_params.name,
        }
    }

    /// 序列化为发布负载
    pub fn to_payload(&self) -> TaskPlaneResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// 分发器接口
///
/// 发后即忘：返回值是发布瞬间在线的订阅者数量，0 表示消息已丢失。
/// 实现只等待 broker 受理，不等待任何消费确认，也不重试。
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn publish(&self, message: &DispatchMessage) -> TaskPlaneResult<i64>;

    /// 发布使用的通道名
    fn channel(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::TaskSpec;
    use chrono::Utc;
    use serde_json::json;

    fn definition(strategy: ExecStrategy) -> TaskDefinition {
        TaskDefinition {
            id: TaskId(17),
            spec: TaskSpec {
                name: "sync-prices".to_string(),
                job_class: "SyncPrices".to_string(),
                exec_strategy: strategy,
                expression: Some("0 9 * * 1-5".to_string()),
                start_date: Some("2024-01-01".to_string()),
                end_date: None,
                group: "market-data".to_string(),
            },
            create_datetime: Utc::now(),
        }
    }

    #[test]
    fn test_cron_schedule_message_includes_window() {
        let message = DispatchMessage::schedule(&definition(ExecStrategy::Cron));
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(
            value,
            json!({
                "operation": "add_job",
                "task": {
                    "exec_strategy": "cron",
                    "job_params": {
                        "name": "17",
                        "job_class": "SyncPrices",
                        "expression": "0 9 * * 1-5",
                        "start_date": "2024-01-01",
                        "end_date": null
                    }
                }
            })
        );
    }

    #[test]
    fn test_once_schedule_message_omits_window() {
        let message = DispatchMessage::schedule(&definition(ExecStrategy::Once));
        let value = serde_json::to_value(&message).unwrap();
        let params = &value["task"]["job_params"];

        assert_eq!(value["task"]["exec_strategy"], json!("once"));
        assert_eq!(params["expression"], json!("0 9 * * 1-5"));
        assert!(params.get("start_date").is_none());
        assert!(params.get("end_date").is_none());
    }

    #[test]
    fn test_run_once_message_carries_identity_only() {
        let message = DispatchMessage::run_once(TaskId(5), "Cleanup");
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(
            value,
            json!({
                "operation": "add_job",
                "task": {
                    "exec_strategy": "once",
                    "job_params": { "name": "5", "job_class": "Cleanup" }
                }
            })
        );
        assert_eq!(message.operation(), "add_job");
        assert_eq!(message.job_name(), "5");
    }

    #[test]
    fn test_payload_is_json_text() {
        let payload = DispatchMessage::run_once(TaskId(1), "J").to_payload().unwrap();
        assert!(payload.starts_with('{'));
        assert!(payload.contains("\"operation\":\"add_job\""));
    }
}
