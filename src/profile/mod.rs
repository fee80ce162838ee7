use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod visibility;

pub fn router() -> Router<AppState> {
    handlers::profile_routes()
}
