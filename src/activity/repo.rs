use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ActivityLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub async fn insert_activity(db: &PgPool, user_id: Uuid, action: &str) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO activity_logs (user_id, action) VALUES ($1, $2)")
        .bind(user_id)
        .bind(action)
        .execute(db)
        .await?;
    Ok(())
}

/// Newest first.
pub async fn recent_activity(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> anyhow::Result<Vec<ActivityLog>> {
    let rows = sqlx::query_as::<_, ActivityLog>(
        r#"
        SELECT id, user_id, action, created_at
          FROM activity_logs
         WHERE user_id = $1
         ORDER BY created_at DESC, seq DESC
         LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn insert_profile_view(db: &PgPool, user_id: Uuid, viewer_ip: &str) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO profile_views (user_id, viewer_ip) VALUES ($1, $2)")
        .bind(user_id)
        .bind(viewer_ip)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn count_profile_views(db: &PgPool, user_id: Uuid) -> anyhow::Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profile_views WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await?;
    Ok(count)
}
