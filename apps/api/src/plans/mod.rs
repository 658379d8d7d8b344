// Compliance plans: prompt assembly, generation, storage and PDF export.
// All LLM calls go through llm_client via the PlanGenerator trait.
// PDF rendering is CPU-bound and runs inside tokio::task::spawn_blocking.

pub mod export;
pub mod generator;
pub mod handlers;
pub mod inflight;
pub mod metrics;
pub mod prompts;
pub mod request;
pub mod store;
