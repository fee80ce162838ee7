use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use axum_extra::extract::{cookie::CookieJar, WithRejection};
use tracing::{info, instrument, warn};

use super::{
    dto::{MessageResponse, UpdateUsernameRequest, UserStats},
    repo::{self, USERNAME_CONSTRAINT},
    repo_types::{ProfileChanges, User},
    services::{profile_completion, validate_username},
};
use crate::{
    activity::{self, log_activity, Activity},
    auth::{
        cookies::{expired, SESSION_COOKIE},
        extractors::AuthUser,
    },
    error::{AppError, AppResult},
    state::AppState,
};

const STATS_ACTIVITY: i64 = 5;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/me", get(get_user).put(update_user).delete(delete_user))
        .route("/api/users/me/username", put(update_username))
        .route("/api/users/me/toggle-public", put(toggle_public))
        .route("/api/users/me/stats", get(get_stats))
}

#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> AppResult<Json<User>> {
    let user = repo::find_by_id(&state.db, claims.user_id())
        .await?
        .ok_or_else(AppError::user_not_found)?;
    Ok(Json(user))
}

#[instrument(skip(state, claims, changes), fields(user_id = %claims.sub))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    WithRejection(Json(changes), _): WithRejection<Json<ProfileChanges>, AppError>,
) -> AppResult<Json<User>> {
    let user = repo::update_profile(&state.db, claims.user_id(), &changes)
        .await?
        .ok_or_else(AppError::user_not_found)?;

    log_activity(&state.db, user.id, Activity::UpdatedProfile).await;
    Ok(Json(user))
}

#[instrument(skip(state, claims, body), fields(user_id = %claims.sub))]
pub async fn update_username(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    WithRejection(Json(body), _): WithRejection<Json<UpdateUsernameRequest>, AppError>,
) -> AppResult<Json<MessageResponse>> {
    validate_username(&body.username)?;

    let updated = match repo::update_username(&state.db, claims.user_id(), &body.username).await {
        Ok(u) => u,
        Err(e) if repo::is_unique_violation(&e, USERNAME_CONSTRAINT) => {
            warn!(username = %body.username, "username already taken");
            return Err(AppError::Conflict("username already taken".into()));
        }
        Err(e) => return Err(e.into()),
    };
    let user = updated.ok_or_else(AppError::user_not_found)?;

    log_activity(&state.db, user.id, Activity::ChangedUsername(user.username.clone())).await;
    info!(username = %user.username, "username updated");
    Ok(Json(MessageResponse::new("username updated")))
}

#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn toggle_public(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> AppResult<Json<User>> {
    let user = repo::toggle_public(&state.db, claims.user_id())
        .await?
        .ok_or_else(AppError::user_not_found)?;

    log_activity(&state.db, user.id, Activity::Visibility { public: user.is_public }).await;
    Ok(Json(user))
}

#[instrument(skip(state, claims, jar), fields(user_id = %claims.sub))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<MessageResponse>)> {
    if !repo::delete(&state.db, claims.user_id()).await? {
        return Err(AppError::user_not_found());
    }
    info!("account permanently deleted");
    Ok((
        jar.add(expired(SESSION_COOKIE)),
        Json(MessageResponse::new("account permanently deleted")),
    ))
}

#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn get_stats(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> AppResult<Json<UserStats>> {
    let user = repo::find_by_id(&state.db, claims.user_id())
        .await?
        .ok_or_else(AppError::user_not_found)?;

    let profile_views = activity::repo::count_profile_views(&state.db, user.id).await?;
    let recent_activity = activity::repo::recent_activity(&state.db, user.id, STATS_ACTIVITY).await?;
    let profile_completion = profile_completion(&user);

    Ok(Json(UserStats {
        user,
        profile_views,
        recent_activity,
        profile_completion,
    }))
}
