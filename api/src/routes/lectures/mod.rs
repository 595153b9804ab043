use axum::{Router, routing::get};
use util::state::AppState;

mod get;

pub use get::lecture_qr;

pub fn lecture_routes() -> Router<AppState> {
    Router::new().route("/{lecture_id}/qr", get(lecture_qr))
}
