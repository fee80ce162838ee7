use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Path, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::visibility::{decide, ProfileVisibility};
use crate::{
    activity::record_profile_view,
    auth::extractors::MaybeAuthUser,
    error::{AppError, AppResult},
    state::AppState,
    users::repo,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/api/profile/:username", get(get_public_profile))
}

/// Requester address: proxy headers first, then the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or(real_ip)
        .map(str::to_string)
        .or_else(|| peer.map(|p| p.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

#[instrument(skip(state, viewer, headers, peer))]
pub async fn get_public_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> AppResult<Json<ProfileVisibility>> {
    let user = repo::find_by_username(&state.db, &username)
        .await?
        .ok_or_else(AppError::user_not_found)?;
    let user_id = user.id;

    let decision = decide(user, viewer.as_ref());
    if decision.records_view() {
        let ip = client_ip(&headers, peer.map(|ConnectInfo(addr)| addr));
        record_profile_view(&state.db, user_id, &ip).await;
    }
    Ok(Json(decision))
}
