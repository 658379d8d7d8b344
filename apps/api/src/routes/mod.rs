pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::plans::handlers as plans;
use crate::questionnaire::handlers as questionnaire;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Questionnaire API
        .route(
            "/api/v1/questionnaire",
            get(questionnaire::handle_get_questionnaire),
        )
        .route(
            "/api/v1/questionnaire/step",
            post(questionnaire::handle_step),
        )
        .route(
            "/api/v1/questionnaire/alerts",
            post(questionnaire::handle_alerts),
        )
        .route(
            "/api/v1/questionnaire/draft",
            get(questionnaire::handle_get_draft)
                .put(questionnaire::handle_put_draft)
                .delete(questionnaire::handle_delete_draft),
        )
        // Plans API
        .route(
            "/api/v1/plans",
            get(plans::handle_list_plans).post(plans::handle_save_plan),
        )
        .route("/api/v1/plans/generate", post(plans::handle_generate))
        .route("/api/v1/plans/export", post(plans::handle_export))
        .route("/api/v1/plans/:id", get(plans::handle_get_plan))
        .route("/api/v1/plans/:id/pdf", get(plans::handle_plan_pdf))
        .with_state(state)
}
