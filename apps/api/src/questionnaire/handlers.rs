use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;
use crate::identity::CurrentUser;
use crate::questionnaire::alerts::{evaluate, Alert};
use crate::questionnaire::answers::AnswerSet;
use crate::questionnaire::navigation::{Advance, Progress, Step};
use crate::questionnaire::schema::{ChoiceOption, InputKind, SCHEMA_VERSION};
use crate::questionnaire::snapshot::{restore, AnswerSnapshot, Restored};
use crate::questionnaire::validation::FieldError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct QuestionView {
    pub id: &'static str,
    pub label: &'static str,
    pub prompt: &'static str,
    pub kind: InputKind,
    pub options: &'static [ChoiceOption],
    pub required: bool,
    pub help: Option<&'static str>,
    /// Whether the question is only shown for certain earlier answers.
    pub conditional: bool,
}

#[derive(Serialize)]
pub struct QuestionnaireResponse {
    pub schema_version: u32,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Next,
    Back,
}

#[derive(Deserialize)]
pub struct StepRequest {
    #[serde(default)]
    pub answers: AnswerSet,
    pub current_index: usize,
    pub direction: Direction,
}

#[derive(Serialize)]
pub struct StepResponse {
    pub step: Step,
    /// Set when "next" was refused; `step` is then the unchanged position.
    pub validation_error: Option<FieldError>,
    pub progress: Option<Progress>,
    pub visible_question_ids: Vec<&'static str>,
    pub alerts: Vec<Alert>,
}

#[derive(Deserialize)]
pub struct AnswersRequest {
    #[serde(default)]
    pub answers: AnswerSet,
}

#[derive(Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<Alert>,
}

#[derive(Serialize)]
pub struct DraftSavedResponse {
    pub schema_version: u32,
    pub saved_at: DateTime<Utc>,
}

/// GET /api/v1/questionnaire
pub async fn handle_get_questionnaire(State(state): State<AppState>) -> Json<QuestionnaireResponse> {
    let questions = state
        .graph
        .questions()
        .iter()
        .map(|q| QuestionView {
            id: q.id,
            label: q.label,
            prompt: q.prompt,
            kind: q.kind,
            options: q.options,
            required: q.required,
            help: q.help,
            conditional: q.visible_if.is_some(),
        })
        .collect();
    Json(QuestionnaireResponse {
        schema_version: SCHEMA_VERSION,
        questions,
    })
}

/// POST /api/v1/questionnaire/step
pub async fn handle_step(
    State(state): State<AppState>,
    CurrentUser(_user_id): CurrentUser,
    Json(req): Json<StepRequest>,
) -> Result<Json<StepResponse>, AppError> {
    let graph = state.graph;
    // `len` itself is the submit position.
    if req.current_index > graph.len() {
        return Err(AppError::Validation(format!(
            "current_index {} is out of range (0..={})",
            req.current_index,
            graph.len()
        )));
    }

    let (step, validation_error) = match req.direction {
        Direction::Next if req.current_index == graph.len() => (Step::Submit, None),
        Direction::Next => match graph.advance(req.current_index, &req.answers) {
            Advance::Moved(step) => (step, None),
            Advance::Blocked(error) => {
                debug!("Step {} blocked: {}", req.current_index, error.message);
                (Step::Question(req.current_index), Some(error))
            }
        },
        Direction::Back => {
            let previous = graph.previous_step(req.current_index, &req.answers);
            if previous >= graph.len() {
                (graph.first_step(&req.answers), None)
            } else {
                (Step::Question(previous), None)
            }
        }
    };

    let progress = match step {
        Step::Question(index) => graph.progress(index, &req.answers),
        Step::Submit => None,
    };

    Ok(Json(StepResponse {
        step,
        validation_error,
        progress,
        visible_question_ids: graph.visible_question_ids(&req.answers),
        alerts: evaluate(&graph.pruned(&req.answers)),
    }))
}

/// POST /api/v1/questionnaire/alerts
pub async fn handle_alerts(
    State(state): State<AppState>,
    Json(req): Json<AnswersRequest>,
) -> Json<AlertsResponse> {
    Json(AlertsResponse {
        alerts: evaluate(&state.graph.pruned(&req.answers)),
    })
}

/// GET /api/v1/questionnaire/draft
pub async fn handle_get_draft(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Restored>, AppError> {
    let raw = state.drafts.load(user_id).await?;
    Ok(Json(restore(raw.as_deref(), &state.graph)))
}

/// PUT /api/v1/questionnaire/draft
pub async fn handle_put_draft(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<AnswersRequest>,
) -> Result<Json<DraftSavedResponse>, AppError> {
    let mut answers = req.answers;
    state.graph.retain_known(&mut answers);

    let snapshot = AnswerSnapshot::capture(answers);
    let raw = snapshot
        .encode()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode draft: {e}")))?;
    state.drafts.save(user_id, &raw).await?;

    Ok(Json(DraftSavedResponse {
        schema_version: snapshot.schema_version,
        saved_at: snapshot.saved_at,
    }))
}

/// DELETE /api/v1/questionnaire/draft
pub async fn handle_delete_draft(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<StatusCode, AppError> {
    state.drafts.clear(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::Method;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::questionnaire::drafts::DraftStore;
    use crate::routes::build_router;
    use crate::testing::{body_json, complete_answers, json_request, test_app, StubGenerator};

    use super::*;

    async fn step(body: Value) -> Value {
        let app = test_app(StubGenerator::replying("plan"));
        let response = build_router(app.state)
            .oneshot(json_request(
                Method::POST,
                "/api/v1/questionnaire/step",
                Some(Uuid::new_v4()),
                Some(body),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await
    }

    #[tokio::test]
    async fn test_questionnaire_lists_all_questions() {
        let app = test_app(StubGenerator::replying("plan"));
        let response = build_router(app.state)
            .oneshot(json_request(Method::GET, "/api/v1/questionnaire", None, None))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["schema_version"], SCHEMA_VERSION);
        let questions = body["questions"].as_array().unwrap();
        assert_eq!(questions.len(), 15);
        assert_eq!(questions[0]["id"], "revenue");
        assert_eq!(questions[4]["id"], "lut_filed");
        assert_eq!(questions[4]["conditional"], true);
        assert_eq!(questions[1]["kind"], "multi_choice");
    }

    #[tokio::test]
    async fn test_next_skips_hidden_lut_question() {
        let answers = complete_answers().with(
            "gst_number",
            crate::questionnaire::answers::AnswerValue::Text("no".into()),
        );
        let body = step(json!({ "answers": answers, "current_index": 3, "direction": "next" })).await;
        assert_eq!(body["step"], json!({ "kind": "question", "index": 5 }));
        assert_eq!(body["validation_error"], Value::Null);
        assert!(!body["visible_question_ids"]
            .as_array()
            .unwrap()
            .contains(&json!("lut_filed")));
    }

    #[tokio::test]
    async fn test_next_blocked_by_empty_multi_select() {
        let mut answers = complete_answers();
        answers.set(
            "client_location",
            crate::questionnaire::answers::AnswerValue::Tokens(vec![]),
        );
        let body = step(json!({ "answers": answers, "current_index": 1, "direction": "next" })).await;
        assert_eq!(body["step"], json!({ "kind": "question", "index": 1 }));
        assert_eq!(body["validation_error"]["question_id"], "client_location");
    }

    fn answers_with(overrides: Value) -> Value {
        let mut answers = serde_json::to_value(complete_answers()).unwrap();
        for (id, value) in overrides.as_object().unwrap() {
            answers[id] = value.clone();
        }
        answers
    }

    #[tokio::test]
    async fn test_next_blocked_by_out_of_range_rating() {
        let answers = answers_with(json!({ "expense_records": 300 }));
        let body = step(json!({ "answers": answers, "current_index": 8, "direction": "next" })).await;
        assert_eq!(body["step"], json!({ "kind": "question", "index": 8 }));
        assert_eq!(body["validation_error"]["question_id"], "expense_records");
        assert_eq!(
            body["validation_error"]["message"],
            "Unexpected answer type for this question."
        );
    }

    #[tokio::test]
    async fn test_bad_value_elsewhere_does_not_block_current_step() {
        let answers = answers_with(json!({ "expense_records": 300 }));
        let body = step(json!({ "answers": answers, "current_index": 0, "direction": "next" })).await;
        assert_eq!(body["step"], json!({ "kind": "question", "index": 1 }));
        assert_eq!(body["validation_error"], Value::Null);
    }

    #[tokio::test]
    async fn test_next_blocked_by_boolean_choice() {
        let answers = answers_with(json!({ "gst_number": true }));
        let body = step(json!({ "answers": answers, "current_index": 3, "direction": "next" })).await;
        assert_eq!(body["step"], json!({ "kind": "question", "index": 3 }));
        assert_eq!(body["validation_error"]["question_id"], "gst_number");
    }

    #[tokio::test]
    async fn test_back_then_progress() {
        let body = step(json!({ "answers": complete_answers(), "current_index": 5, "direction": "back" })).await;
        assert_eq!(body["step"], json!({ "kind": "question", "index": 4 }));
        assert_eq!(body["progress"], json!({ "position": 5, "total": 15 }));
    }

    #[tokio::test]
    async fn test_last_question_advances_to_submit() {
        let body = step(json!({ "answers": complete_answers(), "current_index": 14, "direction": "next" })).await;
        assert_eq!(body["step"], json!({ "kind": "submit" }));
        assert_eq!(body["progress"], Value::Null);
    }

    #[tokio::test]
    async fn test_step_carries_fresh_alerts() {
        let mut answers = complete_answers();
        answers.select("revenue", "above_75l");
        answers.select("gst_number", "no");
        let body = step(json!({ "answers": answers, "current_index": 0, "direction": "next" })).await;
        let rules: Vec<&str> = body["alerts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["rule"].as_str().unwrap())
            .collect();
        assert_eq!(rules, vec!["gst_registration", "tax_audit"]);
    }

    #[tokio::test]
    async fn test_step_out_of_range_index() {
        let app = test_app(StubGenerator::replying("plan"));
        let response = build_router(app.state)
            .oneshot(json_request(
                Method::POST,
                "/api/v1/questionnaire/step",
                Some(Uuid::new_v4()),
                Some(json!({ "answers": {}, "current_index": 99, "direction": "next" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_alerts_ignore_hidden_lut_answer() {
        let app = test_app(StubGenerator::replying("plan"));
        let mut answers = complete_answers();
        answers.select("gst_number", "no");
        answers.select("lut_filed", "no_dont_know");
        answers.select("revenue", "less_than_20l");
        let response = build_router(app.state)
            .oneshot(json_request(
                Method::POST,
                "/api/v1/questionnaire/alerts",
                None,
                Some(json!({ "answers": answers })),
            ))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["alerts"], json!([]));
    }

    #[tokio::test]
    async fn test_draft_round_trip_and_clear() {
        let app = test_app(StubGenerator::replying("plan"));
        let user = Uuid::new_v4();

        let response = build_router(app.state.clone())
            .oneshot(json_request(
                Method::PUT,
                "/api/v1/questionnaire/draft",
                Some(user),
                Some(json!({ "answers": { "revenue": "above_75l", "retired_field": "x" } })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = build_router(app.state.clone())
            .oneshot(json_request(Method::GET, "/api/v1/questionnaire/draft", Some(user), None))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["outcome"]["status"], "restored");
        assert_eq!(body["answers"], json!({ "revenue": "above_75l" }));

        let response = build_router(app.state.clone())
            .oneshot(json_request(Method::DELETE, "/api/v1/questionnaire/draft", Some(user), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(app.drafts.load(user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_incompatible_draft_restores_defaults() {
        let app = test_app(StubGenerator::replying("plan"));
        let user = Uuid::new_v4();
        app.drafts
            .save(
                user,
                &json!({ "schema_version": 99, "answers": { "revenue": "above_75l" }, "saved_at": Utc::now() })
                    .to_string(),
            )
            .await
            .unwrap();

        let response = build_router(app.state)
            .oneshot(json_request(Method::GET, "/api/v1/questionnaire/draft", Some(user), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["outcome"], json!({ "status": "incompatible", "found": 99 }));
        assert_eq!(body["answers"], json!({}));
    }
}
