//! 任务命令校验

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use taskplane_core::{TaskPlaneError, TaskPlaneResult};

use crate::entities::TaskSpec;

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// 写入前校验任务定义
pub fn validate_task_spec(spec: &TaskSpec) -> TaskPlaneResult<()> {
    if spec.name.trim().is_empty() {
        return Err(invalid("任务名称不能为空"));
    }
    if spec.job_class.trim().is_empty() {
        return Err(invalid("job_class 不能为空"));
    }
    if spec.group.trim().is_empty() {
        return Err(invalid("任务分组不能为空"));
    }

    let has_expression = spec
        .expression
        .as_deref()
        .map(|e| !e.trim().is_empty())
        .unwrap_or(false);
    if spec.exec_strategy.uses_window() && !has_expression {
        return Err(invalid(format!(
            "执行策略 {} 需要 expression",
            spec.exec_strategy.as_str()
        )));
    }

    let start = parse_optional_date("start_date", spec.start_date.as_deref())?;
    let end = parse_optional_date("end_date", spec.end_date.as_deref())?;
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(invalid("start_date 不能晚于 end_date"));
        }
    }

    Ok(())
}

fn parse_optional_date(field: &str, raw: Option<&str>) -> TaskPlaneResult<Option<NaiveDateTime>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => parse_date(value)
            .map(Some)
            .ok_or_else(|| invalid(format!("{field} 不是合法的日期: {value}"))),
    }
}

/// 接受 `YYYY-MM-DD`、常见日期时间格式以及 RFC3339
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Some(datetime);
        }
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.naive_utc())
}

fn invalid(message: impl Into<String>) -> TaskPlaneError {
    TaskPlaneError::InvalidTaskParams(message.into())
}
