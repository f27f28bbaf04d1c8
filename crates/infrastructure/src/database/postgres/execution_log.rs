use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use taskplane_core::TaskPlaneResult;
use taskplane_domain::{ExecutionLog, ExecutionRecord, RecordQuery};
use tracing::{debug, instrument};

/// 执行日志表，只读
pub struct PostgresExecutionLog {
    pool: PgPool,
}

impl PostgresExecutionLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_record(row: &PgRow) -> TaskPlaneResult<ExecutionRecord> {
        Ok(ExecutionRecord {
            seq: row.try_get("seq")?,
            job_id: row.try_get("job_id")?,
            name: row.try_get("name")?,
            create_datetime: row.try_get("create_datetime")?,
            details: row.try_get("details")?,
        })
    }
}

// strpos 做子串匹配，避免 LIKE 通配符转义
const RECORD_FILTER: &str = "($1::text IS NULL OR strpos(job_id, $1) > 0) \
                             AND ($2::text IS NULL OR strpos(name, $2) > 0)";

/// LIMIT/OFFSET 参数，超出 i64 时取上限
fn to_sql_bound(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl ExecutionLog for PostgresExecutionLog {
    #[instrument(skip(self, keys), fields(key_count = keys.len()))]
    async fn last_runs(&self, keys: &[String]) -> TaskPlaneResult<Vec<(String, DateTime<Utc>)>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT DISTINCT ON (job_id) job_id, create_datetime FROM execution_log \
             WHERE job_id = ANY($1) ORDER BY job_id, seq DESC",
        )
        .bind(keys)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> TaskPlaneResult<(String, DateTime<Utc>)> {
                Ok((row.try_get("job_id")?, row.try_get("create_datetime")?))
            })
            .collect()
    }

    #[instrument(skip(self))]
    async fn list(&self, query: &RecordQuery) -> TaskPlaneResult<(Vec<ExecutionRecord>, u64)> {
        let job_id = query.job_id_filter();
        let name = query.name_filter();
        let pagination = query.pagination();
        // LIMIT NULL 等价于不限制
        let limit = (pagination.limit > 0).then_some(to_sql_bound(pagination.limit));

        let total: i64 = sqlx::query(&format!(
            "SELECT COUNT(*) AS total FROM execution_log WHERE {RECORD_FILTER}"
        ))
        .bind(job_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?
        .try_get("total")?;

        let rows = sqlx::query(&format!(
            "SELECT seq, job_id, name, create_datetime, details FROM execution_log \
             WHERE {RECORD_FILTER} \
             ORDER BY create_datetime DESC, seq DESC LIMIT $3 OFFSET $4"
        ))
        .bind(job_id)
        .bind(name)
        .bind(limit)
        .bind(to_sql_bound(pagination.skip()))
        .fetch_all(&self.pool)
        .await?;

        debug!("查询执行记录: {} / {}", rows.len(), total);
        let records = rows
            .iter()
            .map(Self::row_to_record)
            .collect::<TaskPlaneResult<Vec<_>>>()?;
        Ok((records, total.max(0) as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_bound_clamps_to_i64() {
        assert_eq!(to_sql_bound(0), 0);
        assert_eq!(to_sql_bound(20), 20);
        assert_eq!(to_sql_bound(i64::MAX as u64), i64::MAX);
        assert_eq!(to_sql_bound(u64::MAX), i64::MAX);
    }
}
