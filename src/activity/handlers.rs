use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::repo::{self, ActivityLog};
use crate::{auth::extractors::AuthUser, error::AppResult, state::AppState};

const ACTIVITY_PAGE: i64 = 10;

pub fn activity_routes() -> Router<AppState> {
    Router::new().route("/api/activity", get(list_activity))
}

#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn list_activity(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> AppResult<Json<Vec<ActivityLog>>> {
    let items = repo::recent_activity(&state.db, claims.user_id(), ACTIVITY_PAGE).await?;
    Ok(Json(items))
}
