use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use taskplane_core::TaskPlaneResult;
use taskplane_domain::{ExecutionLog, ExecutionRecord, RecordQuery};
use tokio::sync::RwLock;

/// 内存执行日志，只追加
#[derive(Debug, Default)]
pub struct InMemoryExecutionLog {
    records: RwLock<Vec<ExecutionRecord>>,
}

impl InMemoryExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 模拟执行端写入一条执行完成记录
    pub async fn append(
        &self,
        job_id: impl Into<String>,
        name: Option<&str>,
        create_datetime: DateTime<Utc>,
    ) -> ExecutionRecord {
        let mut records = self.records.write().await;
        let record = ExecutionRecord {
            seq: records.len() as i64 + 1,
            job_id: job_id.into(),
            name: name.map(str::to_string),
            create_datetime,
            details: serde_json::json!({}),
        };
        records.push(record.clone());
        record
    }
}

#[async_trait]
impl ExecutionLog for InMemoryExecutionLog {
    async fn last_runs(&self, keys: &[String]) -> TaskPlaneResult<Vec<(String, DateTime<Utc>)>> {
        let wanted: HashSet<&str> = keys.iter().map(String::as_str).collect();
        let records = self.records.read().await;

        // 按存储顺序折叠，后写入的覆盖先写入的
        let mut last: HashMap<&str, DateTime<Utc>> = HashMap::new();
        for record in records.iter().filter(|r| wanted.contains(r.job_id.as_str())) {
            last.insert(record.job_id.as_str(), record.create_datetime);
        }

        Ok(last
            .into_iter()
            .map(|(job_id, at)| (job_id.to_string(), at))
            .collect())
    }

    async fn list(&self, query: &RecordQuery) -> TaskPlaneResult<(Vec<ExecutionRecord>, u64)> {
        let records = self.records.read().await;
        let mut matched: Vec<ExecutionRecord> =
            records.iter().filter(|r| query.matches(r)).cloned().collect();
        matched.sort_by(|a, b| {
            b.create_datetime
                .cmp(&a.create_datetime)
                .then(b.seq.cmp(&a.seq))
        });

        let total = matched.len() as u64;
        Ok((query.pagination().window(matched), total))
    }
}
