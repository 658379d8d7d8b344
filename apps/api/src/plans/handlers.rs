use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::identity::CurrentUser;
use crate::models::plan::CompliancePlanRow;
use crate::plans::export::render_plan_pdf;
use crate::plans::request::build_request;
use crate::questionnaire::alerts::{evaluate, Alert};
use crate::questionnaire::answers::AnswerSet;
use crate::rate_limit::QuotaDecision;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct GenerateRequest {
    pub answers: AnswerSet,
}

#[derive(Serialize)]
pub struct GenerateResponse {
    pub plan: String,
    pub alerts: Vec<Alert>,
}

#[derive(Deserialize)]
pub struct SavePlanRequest {
    pub plan_content: String,
    pub source_data: AnswerSet,
}

#[derive(Serialize)]
pub struct SavePlanResponse {
    pub plan_id: Uuid,
}

#[derive(Deserialize)]
pub struct ExportRequest {
    pub plan: String,
    pub answers: AnswerSet,
}

/// POST /api/v1/plans/generate
///
/// Order matters: answers are validated before anything is counted, and a
/// duplicate in-flight request is refused before it can spend quota.
pub async fn handle_generate(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let prompt = build_request(&state.graph, &req.answers).map_err(AppError::InvalidAnswers)?;

    let _guard = state.in_flight.try_begin(user_id).ok_or_else(|| {
        AppError::Conflict("A plan is already being generated for this account".to_string())
    })?;

    match state.quota.try_acquire(&format!("user:{user_id}")).await? {
        QuotaDecision::Allowed { remaining } => {
            debug!("Plan quota for user {user_id}: {remaining} remaining");
        }
        QuotaDecision::Rejected { retry_after_secs } => {
            return Err(AppError::RateLimited { retry_after_secs });
        }
    }

    let timeout = state.config.plan_timeout();
    let plan = tokio::time::timeout(timeout, state.generator.generate(&prompt))
        .await
        .map_err(|_| AppError::LlmTimeout(timeout.as_secs()))?
        .map_err(|e| AppError::Llm(format!("Plan generation failed: {e}")))?;

    if plan.trim().is_empty() {
        return Err(AppError::Llm("Plan generation returned no text".to_string()));
    }

    let alerts = evaluate(&state.graph.pruned(&req.answers));
    info!(
        "Generated plan for user {user_id} ({} chars, {} alerts)",
        plan.len(),
        alerts.len()
    );
    Ok(Json(GenerateResponse { plan, alerts }))
}

/// POST /api/v1/plans
pub async fn handle_save_plan(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<SavePlanRequest>,
) -> Result<(StatusCode, Json<SavePlanResponse>), AppError> {
    if req.plan_content.trim().is_empty() {
        return Err(AppError::Validation("plan_content must not be empty".to_string()));
    }
    let source = state.graph.pruned(&req.source_data);
    let plan_id = state.plans.create(user_id, &req.plan_content, &source).await?;
    Ok((StatusCode::CREATED, Json(SavePlanResponse { plan_id })))
}

/// GET /api/v1/plans
pub async fn handle_list_plans(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<CompliancePlanRow>>, AppError> {
    Ok(Json(state.plans.list_by_owner(user_id).await?))
}

/// GET /api/v1/plans/:id
pub async fn handle_get_plan(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CompliancePlanRow>, AppError> {
    let plan = find_owned(&state, user_id, id).await?;
    Ok(Json(plan))
}

/// GET /api/v1/plans/:id/pdf
pub async fn handle_plan_pdf(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let plan = find_owned(&state, user_id, id).await?;
    let answers = plan.answers().unwrap_or_else(|e| {
        warn!("Plan {id} has unreadable source data, exporting without profile: {e}");
        AnswerSet::default()
    });
    let bytes = export_pdf(&state, plan.plan_content, answers).await?;
    Ok(pdf_response(bytes, &format!("compliance_plan_{id}.pdf")))
}

/// POST /api/v1/plans/export
pub async fn handle_export(
    State(state): State<AppState>,
    CurrentUser(_user_id): CurrentUser,
    Json(req): Json<ExportRequest>,
) -> Result<Response, AppError> {
    if req.plan.trim().is_empty() {
        return Err(AppError::Validation("plan must not be empty".to_string()));
    }
    let bytes = export_pdf(&state, req.plan, req.answers).await?;
    Ok(pdf_response(bytes, "compliance_plan.pdf"))
}

async fn find_owned(state: &AppState, user_id: Uuid, id: Uuid) -> Result<CompliancePlanRow, AppError> {
    state
        .plans
        .get_for_owner(user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Plan {id} not found")))
}

// PDF rendering is CPU-bound, keep it off the async executor.
async fn export_pdf(state: &AppState, plan: String, answers: AnswerSet) -> Result<Vec<u8>, AppError> {
    let graph = state.graph;
    tokio::task::spawn_blocking(move || render_plan_pdf(&graph, &plan, &answers))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in PDF export: {e}")))?
        .map_err(|e| AppError::Export(e.to_string()))
}

fn pdf_response(bytes: Vec<u8>, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        Body::from(Bytes::from(bytes)),
    )
        .into_response()
}
