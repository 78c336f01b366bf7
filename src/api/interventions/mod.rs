mod handlers;

use axum::{routing::get, routing::patch, routing::post, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_interventions).post(handlers::create_intervention))
        .route("/assess", post(handlers::assess))
        .route("/evaluate", post(handlers::evaluate))
        .route("/summary", get(handlers::summary))
        .route("/sections/:section_id/refresh", post(handlers::refresh_section))
        .route("/actions/:action_id", patch(handlers::update_action))
        .route("/:intervention_id", get(handlers::get_intervention))
        .route("/:intervention_id/actions", post(handlers::create_action))
        .route("/:intervention_id/updates", post(handlers::create_update))
        .route("/:intervention_id/resolve", post(handlers::resolve))
        .route("/:intervention_id/reactivate", post(handlers::reactivate))
        .route("/:intervention_id/escalate", post(handlers::escalate))
}

#[cfg(test)]
mod tests;
