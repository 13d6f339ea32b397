//! Scheduled job claims

use sqlx::PgPool;

use crate::{DbJobRun, DbResult};

pub struct JobRepo {
    pool: PgPool,
}

impl JobRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the `(job, period)` row; `false` if it already existed
    pub async fn claim(&self, job: &str, period: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO job_runs (job, period, status)
            VALUES ($1, $2, 'running')
            ON CONFLICT (job, period) DO NOTHING
            "#,
        )
        .bind(job)
        .bind(period)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn complete(&self, job: &str, period: &str, summary: &serde_json::Value) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE job_runs SET status = 'completed', summary = $3, completed_at = NOW()
            WHERE job = $1 AND period = $2
            "#,
        )
        .bind(job)
        .bind(period)
        .bind(summary)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find(&self, job: &str, period: &str) -> DbResult<Option<DbJobRun>> {
        let run = sqlx::query_as::<_, DbJobRun>("SELECT * FROM job_runs WHERE job = $1 AND period = $2")
            .bind(job)
            .bind(period)
            .fetch_optional(&self.pool)
            .await?;
        Ok(run)
    }
}
