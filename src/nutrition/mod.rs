pub mod foods;
pub mod handlers;
pub mod nutrients;
pub mod profile;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
