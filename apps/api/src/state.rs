use std::sync::Arc;

use crate::config::Config;
use crate::plans::generator::PlanGenerator;
use crate::plans::inflight::InFlight;
use crate::plans::store::PlanStore;
use crate::questionnaire::drafts::DraftStore;
use crate::questionnaire::navigation::QuestionGraph;
use crate::rate_limit::RequestQuota;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Every collaborator sits behind a trait object so tests can swap in
/// in-memory versions.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub graph: QuestionGraph,
    pub plans: Arc<dyn PlanStore>,
    /// Default: LlmPlanGenerator (Gemini).
    pub generator: Arc<dyn PlanGenerator>,
    /// Plan-generation quota. Redis or in-memory, per RATE_LIMIT_BACKEND.
    pub quota: Arc<dyn RequestQuota>,
    pub drafts: Arc<dyn DraftStore>,
    pub in_flight: InFlight,
}
