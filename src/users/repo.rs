use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{NewUser, ProfileChanges, User};

pub const USERNAME_CONSTRAINT: &str = "users_username_key";
pub const GOOGLE_ID_CONSTRAINT: &str = "users_google_id_key";

const USER_COLUMNS: &str = "id, google_id, name, email, image, username, bio, phone, location, \
     is_public, login_count, last_login_at, created_at, updated_at";

/// True when `err` is a unique violation of the named constraint.
pub fn is_unique_violation(err: &anyhow::Error, constraint: &str) -> bool {
    match err.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db_err)) => {
            db_err.is_unique_violation() && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

pub async fn find_by_google_id(db: &PgPool, google_id: &str) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE google_id = $1"
    ))
    .bind(google_id)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
    ))
    .bind(username)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn username_taken(db: &PgPool, username: &str) -> anyhow::Result<bool> {
    let taken: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
        .bind(username)
        .fetch_one(db)
        .await?;
    Ok(taken)
}

/// Insert a first-time user with one recorded login.
pub async fn create(db: &PgPool, new: &NewUser<'_>) -> anyhow::Result<User> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (google_id, name, email, image, username, login_count, last_login_at)
        VALUES ($1, $2, $3, $4, $5, 1, NOW())
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(new.google_id)
    .bind(new.name)
    .bind(new.email)
    .bind(new.image)
    .bind(new.username)
    .fetch_one(db)
    .await?;
    Ok(user)
}

pub async fn record_login(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
           SET login_count = login_count + 1, last_login_at = NOW(), updated_at = NOW()
         WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn update_profile(
    db: &PgPool,
    id: Uuid,
    changes: &ProfileChanges,
) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
           SET name = COALESCE($2, name),
               bio = COALESCE($3, bio),
               phone = COALESCE($4, phone),
               location = COALESCE($5, location),
               is_public = COALESCE($6, is_public),
               updated_at = NOW()
         WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(changes.name.as_deref())
    .bind(changes.bio.as_deref())
    .bind(changes.phone.as_deref())
    .bind(changes.location.as_deref())
    .bind(changes.is_public)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

/// Fails with a unique violation on [`USERNAME_CONSTRAINT`] when another user owns `username`.
pub async fn update_username(db: &PgPool, id: Uuid, username: &str) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users SET username = $2, updated_at = NOW()
         WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(username)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn toggle_public(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users SET is_public = NOT is_public, updated_at = NOW()
         WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

/// Hard delete; activity and profile views go with it via ON DELETE CASCADE.
pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}
