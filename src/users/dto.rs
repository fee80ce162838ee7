use serde::{Deserialize, Serialize};

use super::repo_types::User;
use crate::activity::repo::ActivityLog;

/// Request body for `PUT /api/users/me/username`.
#[derive(Debug, Deserialize)]
pub struct UpdateUsernameRequest {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct UserStats {
    pub user: User,
    pub profile_views: i64,
    pub recent_activity: Vec<ActivityLog>,
    pub profile_completion: u8,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
