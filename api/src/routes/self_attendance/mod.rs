use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

mod common;
mod get;
mod post;

pub use get::{history, status};
pub use post::mark;

pub fn self_attendance_routes() -> Router<AppState> {
    Router::new()
        .route("/mark", post(mark))
        .route("/status", get(status))
        .route("/history", get(history))
}
