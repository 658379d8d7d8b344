//! Plan generation: the trait boundary to the inference collaborator.
//!
//! Default: `LlmPlanGenerator` (Gemini via `llm_client`).
//! `AppState` holds an `Arc<dyn PlanGenerator>`, so handlers never see the HTTP client.

use async_trait::async_trait;
use tracing::info;

use crate::llm_client::{LlmClient, LlmError, MODEL};
use crate::plans::request::PlanPrompt;

#[async_trait]
pub trait PlanGenerator: Send + Sync {
    async fn generate(&self, prompt: &PlanPrompt) -> Result<String, LlmError>;
}

pub struct LlmPlanGenerator {
    llm: LlmClient,
}

impl LlmPlanGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl PlanGenerator for LlmPlanGenerator {
    async fn generate(&self, prompt: &PlanPrompt) -> Result<String, LlmError> {
        info!("Requesting compliance plan from {MODEL}");
        let plan = self.llm.call_text(&prompt.user, &prompt.system).await?;
        info!("Compliance plan generated ({} chars)", plan.len());
        Ok(plan)
    }
}
