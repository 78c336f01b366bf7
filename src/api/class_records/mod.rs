mod handlers;

use axum::{routing::get, routing::post, routing::put, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_record).get(handlers::list_records))
        .route("/:record_id", get(handlers::get_record))
        .route("/:record_id/config", put(handlers::update_config))
        .route("/:record_id/grades/:student_id", put(handlers::upsert_grade))
        .route("/:record_id/early-warnings", get(handlers::early_warnings))
}

#[cfg(test)]
mod tests;
