use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use taskplane_core::{TaskPlaneError, TaskPlaneResult};
use taskplane_domain::{ExecStrategy, TaskDefinition, TaskId, TaskSpec, TaskStore};
use tracing::{debug, info, instrument};

const TASK_COLUMNS: &str = r#"id, name, job_class, exec_strategy, expression, start_date, end_date, "group", create_datetime"#;

pub struct PostgresTaskStore {
    pool: PgPool,
}

impl PostgresTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_definition(row: &PgRow) -> TaskPlaneResult<TaskDefinition> {
        let strategy: String = row.try_get("exec_strategy")?;
        let exec_strategy: ExecStrategy = strategy.parse().map_err(|_| {
            TaskPlaneError::DatabaseOperation(format!("无法识别的执行策略: {strategy}"))
        })?;

        Ok(TaskDefinition {
            id: TaskId(row.try_get("id")?),
            spec: TaskSpec {
                name: row.try_get("name")?,
                job_class: row.try_get("job_class")?,
                exec_strategy,
                expression: row.try_get("expression")?,
                start_date: row.try_get("start_date")?,
                end_date: row.try_get("end_date")?,
                group: row.try_get("group")?,
            },
            create_datetime: row.try_get("create_datetime")?,
        })
    }
}

#[async_trait]
impl TaskStore for PostgresTaskStore {
    #[instrument(skip(self, spec), fields(task_name = %spec.name))]
    async fn insert(&self, spec: &TaskSpec) -> TaskPlaneResult<TaskDefinition> {
        let sql = format!(
            r#"INSERT INTO tasks (name, job_class, exec_strategy, expression, start_date, end_date, "group")
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING {TASK_COLUMNS}"#
        );
        let row = sqlx::query(&sql)
            .bind(&spec.name)
            .bind(&spec.job_class)
            .bind(spec.exec_strategy.as_str())
            .bind(&spec.expression)
            .bind(&spec.start_date)
            .bind(&spec.end_date)
            .bind(&spec.group)
            .fetch_one(&self.pool)
            .await?;

        let definition = Self::row_to_definition(&row)?;
        info!("写入任务定义: {} (ID: {})", definition.spec.name, definition.id);
        Ok(definition)
    }

    #[instrument(skip(self, spec), fields(task_id = %id))]
    async fn replace(&self, id: TaskId, spec: &TaskSpec) -> TaskPlaneResult<TaskDefinition> {
        let sql = format!(
            r#"UPDATE tasks
               SET name = $2, job_class = $3, exec_strategy = $4, expression = $5,
                   start_date = $6, end_date = $7, "group" = $8
               WHERE id = $1
               RETURNING {TASK_COLUMNS}"#
        );
        let row = sqlx::query(&sql)
            .bind(id.0)
            .bind(&spec.name)
            .bind(&spec.job_class)
            .bind(spec.exec_strategy.as_str())
            .bind(&spec.expression)
            .bind(&spec.start_date)
            .bind(&spec.end_date)
            .bind(&spec.group)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| TaskPlaneError::task_not_found(id))?;

        let definition = Self::row_to_definition(&row)?;
        info!("替换任务定义: {} (ID: {})", definition.spec.name, id);
        Ok(definition)
    }

    #[instrument(skip(self), fields(task_id = %id))]
    async fn remove(&self, id: TaskId) -> TaskPlaneResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(TaskPlaneError::task_not_found(id));
        }
        info!("删除任务定义: {}", id);
        Ok(())
    }

    #[instrument(skip(self), fields(task_id = %id))]
    async fn get(&self, id: TaskId) -> TaskPlaneResult<Option<TaskDefinition>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        debug!("查询任务定义 {}: found={}", id, row.is_some());
        row.as_ref().map(Self::row_to_definition).transpose()
    }

    #[instrument(skip(self))]
    async fn scan(&self) -> TaskPlaneResult<Vec<TaskDefinition>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY id");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        debug!("扫描任务定义: {} 条", rows.len());
        rows.iter().map(Self::row_to_definition).collect()
    }
}
