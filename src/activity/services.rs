use std::fmt;

use sqlx::PgPool;
use tracing::{debug, error};
use uuid::Uuid;

use super::repo;

/// Events recorded in a user's activity log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activity {
    AccountCreated,
    LoggedIn,
    UpdatedProfile,
    ChangedUsername(String),
    Visibility { public: bool },
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activity::AccountCreated => f.write_str("Account created"),
            Activity::LoggedIn => f.write_str("Logged in"),
            Activity::UpdatedProfile => f.write_str("Updated profile"),
            Activity::ChangedUsername(name) => write!(f, "Changed username to {}", name),
            Activity::Visibility { public: true } => f.write_str("Set profile to public"),
            Activity::Visibility { public: false } => f.write_str("Set profile to private"),
        }
    }
}

/// Best-effort: a failed write is logged and never propagated to the caller.
pub async fn log_activity(db: &PgPool, user_id: Uuid, activity: Activity) {
    let action = activity.to_string();
    match repo::insert_activity(db, user_id, &action).await {
        Ok(()) => debug!(%user_id, action = %action, "activity recorded"),
        Err(e) => error!(error = %e, %user_id, action = %action, "failed to record activity"),
    }
}

/// Best-effort, same contract as [`log_activity`].
pub async fn record_profile_view(db: &PgPool, user_id: Uuid, viewer_ip: &str) {
    match repo::insert_profile_view(db, user_id, viewer_ip).await {
        Ok(()) => debug!(%user_id, viewer_ip, "profile view recorded"),
        Err(e) => error!(error = %e, %user_id, viewer_ip, "failed to record profile view"),
    }
}
