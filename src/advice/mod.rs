pub mod client;
pub mod dto;
pub mod generation;
pub mod handlers;
pub mod parse;
pub mod prompt;
pub mod repo;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::advice_routes()
}
