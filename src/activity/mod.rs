use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod repo;
pub mod services;

pub use services::{log_activity, record_profile_view, Activity};

pub fn router() -> Router<AppState> {
    handlers::activity_routes()
}
