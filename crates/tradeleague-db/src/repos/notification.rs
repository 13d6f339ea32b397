//! Notification repository

use sqlx::PgPool;
use uuid::Uuid;

use crate::{DbNotification, DbResult};

pub struct NotificationRepo {
    pool: PgPool,
}

impl NotificationRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, n: &DbNotification) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, account_id, kind, payload, read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(n.id)
        .bind(n.account_id)
        .bind(&n.kind)
        .bind(&n.payload)
        .bind(n.read)
        .bind(n.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list(&self, account_id: Uuid, limit: i64) -> DbResult<Vec<DbNotification>> {
        let notifications = sqlx::query_as::<_, DbNotification>(
            "SELECT * FROM notifications WHERE account_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(account_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(notifications)
    }
}
