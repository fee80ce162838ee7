use axum::{
    extract::{rejection::QueryRejection, FromRef, Query, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, instrument, warn};

use super::{
    cookies::{expired, session_cookie, state_cookie, SESSION_COOKIE, STATE_COOKIE},
    dto::CallbackParams,
    extractors::AuthUser,
    jwt::JwtKeys,
    services::{complete_login, generate_state, verify_state, LoginError},
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    users::{dto::MessageResponse, repo, User},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/google", get(google_login))
        .route("/auth/google/callback", get(google_callback))
        .route("/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me))
}

#[instrument(skip(state, jar))]
pub async fn google_login(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let csrf_state = generate_state();
    let url = state.provider.authorize_url(&csrf_state);
    let jar = jar.add(state_cookie(csrf_state, state.config.cookie_secure));
    (jar, Redirect::temporary(&url))
}

#[instrument(skip(state, jar, params))]
pub async fn google_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    params: Result<Query<CallbackParams>, QueryRejection>,
) -> (CookieJar, Redirect) {
    let frontend = state.config.frontend_url.clone();
    let expected_state = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.add(expired(STATE_COOKIE));

    let params = params.map(|Query(p)| p).map_err(|rejection| {
        warn!(error = %rejection, "unreadable callback query");
        LoginError::NoCode
    });

    match handle_callback(&state, expected_state.as_deref(), params).await {
        Ok(token) => {
            let keys = JwtKeys::from_ref(&state);
            let jar = jar.add(session_cookie(token, keys.ttl, state.config.cookie_secure));
            (jar, Redirect::temporary(&format!("{}/dashboard", frontend)))
        }
        Err(e) => {
            match &e {
                LoginError::NoCode | LoginError::InvalidState => warn!(error = %e, "oauth callback rejected"),
                _ => error!(error = %e, code = e.code(), "oauth callback failed"),
            }
            (jar, Redirect::temporary(&format!("{}?error={}", frontend, e.code())))
        }
    }
}

async fn handle_callback(
    state: &AppState,
    expected_state: Option<&str>,
    params: Result<CallbackParams, LoginError>,
) -> Result<String, LoginError> {
    let params = params?;
    if let Some(provider_error) = params.error.as_deref() {
        warn!(provider_error, "provider returned an error instead of a code");
    }
    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or(LoginError::NoCode)?;
    verify_state(expected_state, params.state.as_deref())?;

    let (_user, token) = complete_login(state, &code).await?;
    Ok(token)
}

pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    (jar.add(expired(SESSION_COOKIE)), Json(MessageResponse::new("logged out")))
}

#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> AppResult<Json<User>> {
    let user = repo::find_by_id(&state.db, claims.user_id())
        .await?
        .ok_or_else(AppError::user_not_found)?;
    Ok(Json(user))
}
