use axum::{Router, routing::post};
use util::state::AppState;

mod post;

pub use post::issue_exam_tokens;

pub fn exam_routes() -> Router<AppState> {
    Router::new().route("/{exam_id}/tokens", post(issue_exam_tokens))
}
