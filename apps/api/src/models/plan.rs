use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::questionnaire::answers::AnswerSet;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompliancePlanRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_content: String,
    /// The Answer Set the plan was generated from, as submitted.
    pub source_data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CompliancePlanRow {
    /// Decodes `source_data`; rows written before a schema change may not parse.
    pub fn answers(&self) -> Result<AnswerSet, serde_json::Error> {
        serde_json::from_value(self.source_data.clone())
    }
}
