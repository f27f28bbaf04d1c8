//! 任务查询条件
//!
//! 条件值要么是精确匹配，要么带操作符标签：
//! - `like`：子串匹配
//! - `in`：集合成员
//! - `ObjectId`：把字符串强制转换为任务 ID 后比较
//!
//! 条件作用在状态视图合并之后的文档上，因此可以引用 `is_active`、
//! `last_run_datetime` 等计算字段。未知的操作符标签在构造阶段直接报错。

use std::cmp::Ordering;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;
use taskplane_core::{TaskPlaneError, TaskPlaneResult};

use crate::entities::{ExecutionRecord, TaskId, TaskStatusView};

/// 条件操作符
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    Eq(Value),
    Like(String),
    In(Vec<Value>),
    ObjectId(String),
}

impl FilterOp {
    /// 由 `(标签, 值)` 形式构造操作符
    pub fn from_tagged(tag: &str, value: Value) -> TaskPlaneResult<Self> {
        match tag {
            "like" => match value {
                Value::String(s) => Ok(FilterOp::Like(s)),
                other => Err(TaskPlaneError::Configuration(format!(
                    "like 操作符需要字符串值, 实际为: {other}"
                ))),
            },
            "in" => match value {
                Value::Array(items) => Ok(FilterOp::In(items)),
                other => Err(TaskPlaneError::Configuration(format!(
                    "in 操作符需要数组值, 实际为: {other}"
                ))),
            },
            "ObjectId" => match value {
                Value::String(s) => Ok(FilterOp::ObjectId(s)),
                Value::Number(n) => Ok(FilterOp::ObjectId(n.to_string())),
                other => Err(TaskPlaneError::Configuration(format!(
                    "ObjectId 操作符需要字符串值, 实际为: {other}"
                ))),
            },
            _ => Err(TaskPlaneError::Configuration(format!(
                "不支持的过滤操作符: {tag}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    pub field: String,
    pub op: FilterOp,
}

impl FilterCondition {
    fn matches(&self, doc: &Value) -> TaskPlaneResult<bool> {
        // 缺失字段按 null 处理
        let actual = doc.get(&self.field).unwrap_or(&Value::Null);

        let matched = match &self.op {
            FilterOp::Eq(expected) => actual == expected,
            FilterOp::Like(needle) => actual
                .as_str()
                .map(|s| s.contains(needle.as_str()))
                .unwrap_or(false),
            FilterOp::In(candidates) => candidates.iter().any(|c| c == actual),
            FilterOp::ObjectId(raw) => {
                let id: TaskId = raw.parse()?;
                actual.as_i64() == Some(id.0)
            }
        };

        Ok(matched)
    }
}

/// 作用于任务状态视图的条件集合，所有条件取交集
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskQuery {
    conditions: Vec<FilterCondition>,
}

impl TaskQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按 ID 精确查询
    pub fn by_id(id: TaskId) -> Self {
        Self::new().object_id("id", id.to_string())
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(field, FilterOp::Eq(value.into()));
        self
    }

    pub fn like(mut self, field: impl Into<String>, needle: impl Into<String>) -> Self {
        self.push(field, FilterOp::Like(needle.into()));
        self
    }

    pub fn one_of(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.push(field, FilterOp::In(values));
        self
    }

    pub fn object_id(mut self, field: impl Into<String>, raw: impl Into<String>) -> Self {
        self.push(field, FilterOp::ObjectId(raw.into()));
        self
    }

    /// 以 `(标签, 值)` 形式追加条件，未知标签立即失败
    pub fn tagged(
        mut self,
        field: impl Into<String>,
        tag: &str,
        value: Value,
    ) -> TaskPlaneResult<Self> {
        let op = FilterOp::from_tagged(tag, value)?;
        self.push(field, op);
        Ok(self)
    }

    fn push(&mut self, field: impl Into<String>, op: FilterOp) {
        self.conditions.push(FilterCondition {
            field: field.into(),
            op,
        });
    }

    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// 校验所有 ID 条件可解析，供读路径在访问存储前快速失败
    pub fn validate(&self) -> TaskPlaneResult<()> {
        for condition in &self.conditions {
            if let FilterOp::ObjectId(raw) = &condition.op {
                raw.parse::<TaskId>()?;
            }
        }
        Ok(())
    }

    /// 若存在 `id` 的精确条件，返回该 ID，用于缩小任务读取范围
    pub fn id_hint(&self) -> TaskPlaneResult<Option<TaskId>> {
        for condition in &self.conditions {
            if condition.field != "id" {
                continue;
            }
            match &condition.op {
                FilterOp::ObjectId(raw) => return raw.parse().map(Some),
                FilterOp::Eq(Value::Number(n)) => {
                    if let Some(id) = n.as_i64() {
                        return Ok(Some(TaskId(id)));
                    }
                }
                _ => {}
            }
        }
        Ok(None)
    }

    pub fn matches(&self, view: &TaskStatusView) -> TaskPlaneResult<bool> {
        if self.conditions.is_empty() {
            return Ok(true);
        }
        let doc = serde_json::to_value(view)?;
        self.matches_document(&doc)
    }

    pub fn matches_document(&self, doc: &Value) -> TaskPlaneResult<bool> {
        for condition in &self.conditions {
            if !condition.matches(doc)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// 可排序字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Id,
    Name,
    JobClass,
    ExecStrategy,
    Group,
    #[default]
    CreateDatetime,
    IsActive,
    LastRunDatetime,
}

impl FromStr for SortField {
    type Err = TaskPlaneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(SortField::Id),
            "name" => Ok(SortField::Name),
            "job_class" => Ok(SortField::JobClass),
            "exec_strategy" => Ok(SortField::ExecStrategy),
            "group" => Ok(SortField::Group),
            "create_datetime" => Ok(SortField::CreateDatetime),
            "is_active" => Ok(SortField::IsActive),
            "last_run_datetime" => Ok(SortField::LastRunDatetime),
            _ => Err(TaskPlaneError::Configuration(format!(
                "不支持的排序字段: {s}"
            ))),
        }
    }
}

impl SortField {
    fn compare(&self, a: &TaskStatusView, b: &TaskStatusView) -> Ordering {
        let (da, db) = (&a.definition, &b.definition);
        match self {
            SortField::Id => da.id.cmp(&db.id),
            SortField::Name => da.spec.name.cmp(&db.spec.name),
            SortField::JobClass => da.spec.job_class.cmp(&db.spec.job_class),
            SortField::ExecStrategy => da
                .spec
                .exec_strategy
                .as_str()
                .cmp(db.spec.exec_strategy.as_str()),
            SortField::Group => da.spec.group.cmp(&db.spec.group),
            SortField::CreateDatetime => da.create_datetime.cmp(&db.create_datetime),
            SortField::IsActive => a.is_active.cmp(&b.is_active),
            // None 排在最前
            SortField::LastRunDatetime => a.last_run_datetime.cmp(&b.last_run_datetime),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = TaskPlaneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            _ => Err(TaskPlaneError::Configuration(format!(
                "不支持的排序方向: {s}"
            ))),
        }
    }
}

/// 排序方式，默认按创建时间倒序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl TaskSort {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    /// 稳定排序，相等元素保持存储顺序
    pub fn apply(&self, views: &mut [TaskStatusView]) {
        views.sort_by(|a, b| {
            let ordering = self.field.compare(a, b);
            match self.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
    }
}

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

/// 分页窗口，`limit == 0` 表示不分页
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: page.max(1),
            limit,
        }
    }

    pub fn unpaged() -> Self {
        Self { page: 1, limit: 0 }
    }

    pub fn skip(&self) -> u64 {
        (self.page.max(1) - 1).saturating_mul(self.limit)
    }

    /// 截取当前页
    pub fn window<T>(&self, items: Vec<T>) -> Vec<T> {
        if self.limit == 0 {
            return items;
        }
        items
            .into_iter()
            .skip(usize::try_from(self.skip()).unwrap_or(usize::MAX))
            .take(usize::try_from(self.limit).unwrap_or(usize::MAX))
            .collect()
    }
}

/// 任务列表/详情的查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskListParams {
    pub id: Option<String>,
    pub name: Option<String>,
    pub group: Option<String>,
    pub is_active: Option<bool>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub order_field: Option<String>,
    pub order: Option<String>,
}

impl TaskListParams {
    /// 转换为查询条件，空值参数不参与过滤
    pub fn to_query(&self) -> TaskPlaneResult<TaskQuery> {
        let mut query = TaskQuery::new();

        if let Some(id) = non_empty(&self.id) {
            query = query.tagged("id", "ObjectId", Value::String(id.to_string()))?;
        }
        if let Some(name) = non_empty(&self.name) {
            query = query.tagged("name", "like", Value::String(name.to_string()))?;
        }
        if let Some(group) = non_empty(&self.group) {
            query = query.eq("group", group);
        }
        if let Some(is_active) = self.is_active {
            query = query.eq("is_active", is_active);
        }

        Ok(query)
    }

    pub fn sort(&self) -> TaskPlaneResult<TaskSort> {
        let field = match non_empty(&self.order_field) {
            Some(f) => f.parse()?,
            None => SortField::default(),
        };
        let order = match non_empty(&self.order) {
            Some(o) => o.parse()?,
            None => SortOrder::default(),
        };
        Ok(TaskSort::new(field, order))
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::new(
            self.page.unwrap_or(DEFAULT_PAGE),
            self.limit.unwrap_or(DEFAULT_LIMIT),
        )
    }
}

/// 执行记录查询参数，`job_id` 与 `name` 均为子串匹配
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordQuery {
    pub job_id: Option<String>,
    pub name: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl RecordQuery {
    pub fn job_id_filter(&self) -> Option<&str> {
        non_empty(&self.job_id)
    }

    pub fn name_filter(&self) -> Option<&str> {
        non_empty(&self.name)
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::new(
            self.page.unwrap_or(DEFAULT_PAGE),
            self.limit.unwrap_or(DEFAULT_LIMIT),
        )
    }

    /// 内存实现使用的匹配逻辑
    pub fn matches(&self, record: &ExecutionRecord) -> bool {
        let job_id_ok = self
            .job_id_filter()
            .map(|needle| record.job_id.contains(needle))
            .unwrap_or(true);
        let name_ok = self
            .name_filter()
            .map(|needle| {
                record
                    .name
                    .as_deref()
                    .map(|name| name.contains(needle))
                    .unwrap_or(false)
            })
            .unwrap_or(true);
        job_id_ok && name_ok
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
