mod dto;
pub mod handlers;
pub mod provider;
pub mod repo;
pub mod repo_types;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::health_routes()
}
