//! 控制面领域实体
//!
//! 三类存储各自拥有的数据形状：
//! - `tasks`：控制面写入的任务定义 [`TaskDefinition`]
//! - `job_registry`：执行端写入的运行中任务记录 [`JobRegistration`]
//! - `execution_log`：执行端写入的执行完成日志 [`ExecutionRecord`]
//!
//! 另有分组标签 [`GroupTag`]，以及只读视图 [`TaskStatusView`]。

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskplane_core::{TaskPlaneError, TaskPlaneResult};

/// 任务的存储原生标识
///
/// 执行端维护的集合以字符串形式引用任务，见 [`TaskId::join_key`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl TaskId {
    /// 与 `job_registry.id`、`execution_log.job_id` 关联使用的字符串键
    pub fn join_key(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = TaskPlaneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .map(TaskId)
            .ok_or_else(|| TaskPlaneError::InvalidTaskId(s.to_string()))
    }
}

/// 执行策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecStrategy {
    Interval,
    Cron,
    Once,
}

impl ExecStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecStrategy::Interval => "interval",
            ExecStrategy::Cron => "cron",
            ExecStrategy::Once => "once",
        }
    }

    /// 是否携带起止时间窗口（仅周期性策略有意义）
    pub fn uses_window(&self) -> bool {
        matches!(self, ExecStrategy::Interval | ExecStrategy::Cron)
    }
}

impl FromStr for ExecStrategy {
    type Err = TaskPlaneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "interval" => Ok(ExecStrategy::Interval),
            "cron" => Ok(ExecStrategy::Cron),
            "once" => Ok(ExecStrategy::Once),
            _ => Err(TaskPlaneError::InvalidTaskParams(format!(
                "不支持的执行策略: {s}"
            ))),
        }
    }
}

/// 任务定义中可由用户编辑的字段
///
/// 这是 `tasks` 表中除 `id`、`create_datetime` 外的全部存储字段。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    /// 执行端可解析的任务代码引用
    pub job_class: String,
    pub exec_strategy: ExecStrategy,
    /// cron 表达式或间隔描述，由执行端解析
    #[serde(default)]
    pub expression: Option<String>,
    /// ISO 日期或日期时间，原样透传给执行端
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    pub group: String,
}

/// 已持久化的任务定义
///
/// 该类型没有 `is_active` 字段：任务是否在运行只由执行端的
/// `job_registry` 决定，见 [`TaskStatusView`]。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub id: TaskId,
    #[serde(flatten)]
    pub spec: TaskSpec,
    pub create_datetime: DateTime<Utc>,
}

/// 创建/更新任务的输入
///
/// `is_active` 只决定本次写入后是否向执行端发送调度消息，从不落库。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCommand {
    #[serde(flatten)]
    pub spec: TaskSpec,
    #[serde(default)]
    pub is_active: bool,
}

impl TaskCommand {
    /// 拆分为存储字段与瞬态的激活意图
    pub fn into_parts(self) -> (TaskSpec, bool) {
        (self.spec, self.is_active)
    }
}

/// 任务状态视图：任务定义 + 由执行端数据推导出的状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatusView {
    #[serde(flatten)]
    pub definition: TaskDefinition,
    /// `job_registry` 中存在该任务的记录
    pub is_active: bool,
    /// 最近一次执行完成时间
    pub last_run_datetime: Option<DateTime<Utc>>,
}

impl TaskStatusView {
    pub fn id(&self) -> TaskId {
        self.definition.id
    }
}

/// 执行端的运行中任务记录
///
/// 控制面只会删除这些记录，从不创建。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRegistration {
    /// 任务 ID 的字符串形式
    pub id: String,
}

/// 执行端写入的执行完成记录（只追加）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// 存储顺序号
    pub seq: i64,
    pub job_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub create_datetime: DateTime<Utc>,
    /// 执行端私有字段，对控制面不透明
    #[serde(default)]
    pub details: serde_json::Value,
}

/// 任务分组标签
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTag {
    pub id: i64,
    pub value: String,
}

/// 写操作的分发结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    /// 发布时在线的订阅者数量；未发布时为 0
    pub subscriber_count: i64,
    pub is_active: bool,
}

impl DispatchOutcome {
    pub fn not_dispatched() -> Self {
        Self {
            subscriber_count: 0,
            is_active: false,
        }
    }
}

/// 解析路径或查询参数中的任务 ID
pub fn parse_task_id(raw: &str) -> TaskPlaneResult<TaskId> {
    raw.parse()
}
