//! Fixtures and in-memory collaborators shared by unit and router tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, Response};
use chrono::Utc;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::{Config, RateLimitBackend};
use crate::errors::AppError;
use crate::identity::USER_ID_HEADER;
use crate::llm_client::LlmError;
use crate::models::plan::CompliancePlanRow;
use crate::plans::generator::PlanGenerator;
use crate::plans::inflight::InFlight;
use crate::plans::request::PlanPrompt;
use crate::plans::store::PlanStore;
use crate::questionnaire::answers::{AnswerSet, AnswerValue};
use crate::questionnaire::drafts::DraftStore;
use crate::questionnaire::navigation::QuestionGraph;
use crate::rate_limit::InMemoryQuota;
use crate::state::AppState;

/// A valid, fully answered questionnaire that triggers no alerts.
pub fn complete_answers() -> AnswerSet {
    AnswerSet::new()
        .with("revenue", AnswerValue::Text("20l_to_50l".into()))
        .with("client_location", AnswerValue::Tokens(vec!["usa".into()]))
        .with("payment_methods", AnswerValue::Tokens(vec!["wise_payoneer".into()]))
        .with("gst_number", AnswerValue::Text("yes".into()))
        .with("lut_filed", AnswerValue::Text("yes".into()))
        .with("tax_forms", AnswerValue::Text("signed".into()))
        .with("profession", AnswerValue::Text("Software developer".into()))
        .with("capital_expenditure", AnswerValue::Text("below_50k".into()))
        .with("expense_records", AnswerValue::Rating(4))
        .with("investments", AnswerValue::Text("regular".into()))
        .with("entity_type", AnswerValue::Text("proprietorship".into()))
        .with("hire_freelancers", AnswerValue::Text("no".into()))
        .with("pay_above_30k", AnswerValue::Text("no".into()))
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/compliance_test".to_string(),
        redis_url: "redis://localhost".to_string(),
        gemini_api_key: "test-key".to_string(),
        port: 0,
        rust_log: "debug".to_string(),
        plan_rate_limit: 3,
        plan_rate_window_secs: 3600,
        plan_timeout_secs: 5,
        rate_limit_backend: RateLimitBackend::Memory,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory collaborators
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryPlanStore {
    rows: Mutex<Vec<CompliancePlanRow>>,
}

impl MemoryPlanStore {
    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }
}

#[async_trait]
impl PlanStore for MemoryPlanStore {
    async fn create(
        &self,
        owner: Uuid,
        plan_content: &str,
        source_data: &AnswerSet,
    ) -> Result<Uuid, AppError> {
        let mut rows = self.rows.lock().await;
        // Distinct timestamps so ordering is observable.
        let created_at = Utc::now() + chrono::Duration::seconds(rows.len() as i64);
        let row = CompliancePlanRow {
            id: Uuid::new_v4(),
            user_id: owner,
            plan_content: plan_content.to_string(),
            source_data: serde_json::to_value(source_data).map_err(anyhow::Error::from)?,
            created_at,
            updated_at: created_at,
        };
        let id = row.id;
        rows.push(row);
        Ok(id)
    }

    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<CompliancePlanRow>, AppError> {
        let mut owned: Vec<_> = self
            .rows
            .lock()
            .await
            .iter()
            .filter(|r| r.user_id == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(owned)
    }

    async fn get_for_owner(
        &self,
        owner: Uuid,
        id: Uuid,
    ) -> Result<Option<CompliancePlanRow>, AppError> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .find(|r| r.id == id && r.user_id == owner)
            .cloned())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Returns a fixed reply and counts calls.
pub struct StubGenerator {
    reply: Result<String, String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubGenerator {
    pub fn replying(plan: &str) -> Self {
        Self {
            reply: Ok(plan.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlanGenerator for StubGenerator {
    async fn generate(&self, _prompt: &PlanPrompt) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.reply {
            Ok(plan) => Ok(plan.clone()),
            Err(message) => Err(LlmError::Api {
                status: 500,
                message: message.clone(),
            }),
        }
    }
}

#[derive(Default)]
pub struct MemoryDraftStore {
    slots: Mutex<HashMap<Uuid, String>>,
}

#[async_trait]
impl DraftStore for MemoryDraftStore {
    async fn load(&self, user_id: Uuid) -> Result<Option<String>, AppError> {
        Ok(self.slots.lock().await.get(&user_id).cloned())
    }

    async fn save(&self, user_id: Uuid, raw: &str) -> Result<(), AppError> {
        self.slots.lock().await.insert(user_id, raw.to_string());
        Ok(())
    }

    async fn clear(&self, user_id: Uuid) -> Result<(), AppError> {
        self.slots.lock().await.remove(&user_id);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// App state and request helpers
// ────────────────────────────────────────────────────────────────────────────

pub struct TestApp {
    pub state: AppState,
    pub plans: Arc<MemoryPlanStore>,
    pub generator: Arc<StubGenerator>,
    pub drafts: Arc<MemoryDraftStore>,
}

pub fn test_app(generator: StubGenerator) -> TestApp {
    let config = test_config();
    let plans = Arc::new(MemoryPlanStore::default());
    let generator = Arc::new(generator);
    let drafts = Arc::new(MemoryDraftStore::default());
    let state = AppState {
        graph: QuestionGraph::canonical(),
        plans: plans.clone(),
        generator: generator.clone(),
        quota: Arc::new(InMemoryQuota::new(config.quota_policy())),
        drafts: drafts.clone(),
        in_flight: InFlight::default(),
        config,
    };
    TestApp {
        state,
        plans,
        generator,
        drafts,
    }
}

pub fn json_request(method: Method, uri: &str, user: Option<Uuid>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user.to_string());
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}
