use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub google_id: String,
    pub name: String,
    pub email: String,
    pub image: String,
    pub username: String,
    pub bio: String,
    pub phone: String,
    pub location: String,
    pub is_public: bool,
    pub login_count: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub last_login_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Fields supplied by the provider when an account is first created.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub google_id: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub image: &'a str,
    pub username: &'a str,
}

/// Partial profile update; `None` leaves the column untouched.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub is_public: Option<bool>,
}
