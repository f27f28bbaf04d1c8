use async_trait::async_trait;
use sqlx::{PgPool, Row};
use taskplane_core::TaskPlaneResult;
use taskplane_domain::{GroupRegistry, GroupTag};
use tracing::{debug, info, instrument};

pub struct PostgresGroupRegistry {
    pool: PgPool,
}

impl PostgresGroupRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_tag(row: &sqlx::postgres::PgRow) -> TaskPlaneResult<GroupTag> {
        Ok(GroupTag {
            id: row.try_get("id")?,
            value: row.try_get("value")?,
        })
    }
}

#[async_trait]
impl GroupRegistry for PostgresGroupRegistry {
    #[instrument(skip(self))]
    async fn find(&self, value: &str) -> TaskPlaneResult<Option<GroupTag>> {
        let row = sqlx::query("SELECT id, value FROM task_groups WHERE value = $1 ORDER BY id LIMIT 1")
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_tag).transpose()
    }

    #[instrument(skip(self))]
    async fn insert(&self, value: &str) -> TaskPlaneResult<GroupTag> {
        let row = sqlx::query("INSERT INTO task_groups (value) VALUES ($1) RETURNING id, value")
            .bind(value)
            .fetch_one(&self.pool)
            .await?;

        info!("新建任务分组: {}", value);
        Self::row_to_tag(&row)
    }

    #[instrument(skip(self))]
    async fn list(&self) -> TaskPlaneResult<Vec<GroupTag>> {
        let rows = sqlx::query(
            "SELECT DISTINCT ON (value) id, value FROM task_groups ORDER BY value, id",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!("查询任务分组: {} 个", rows.len());
        rows.iter().map(Self::row_to_tag).collect()
    }
}
