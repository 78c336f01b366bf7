mod handlers;

use axum::{routing::get, routing::post, routing::put, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/records", post(handlers::get_or_create_record))
        .route("/records/:record_id", get(handlers::get_record))
        .route("/records/:record_id/students/:student_id", put(handlers::save_student))
        .route("/records/:record_id/finalize", post(handlers::finalize_record))
}

#[cfg(test)]
mod tests;
