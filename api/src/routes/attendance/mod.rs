use axum::{Router, routing::post};
use util::state::AppState;

mod common;
mod post;

pub use post::scan;

pub fn attendance_routes() -> Router<AppState> {
    Router::new().route("/scan", post(scan))
}
