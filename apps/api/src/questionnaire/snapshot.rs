//! Versioned snapshots of an in-progress Answer Set.
//!
//! Restoring never fails: a missing, unparsable, or foreign-version snapshot
//! yields the default (empty) Answer Set so the form always loads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::questionnaire::answers::AnswerSet;
use crate::questionnaire::navigation::QuestionGraph;
use crate::questionnaire::schema::SCHEMA_VERSION;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerSnapshot {
    pub schema_version: u32,
    pub answers: AnswerSet,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RestoreOutcome {
    Restored,
    Empty,
    Incompatible { found: Option<u64> },
    Corrupt,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Restored {
    pub answers: AnswerSet,
    pub saved_at: Option<DateTime<Utc>>,
    pub outcome: RestoreOutcome,
}

impl Restored {
    fn defaults(outcome: RestoreOutcome) -> Self {
        Self {
            answers: AnswerSet::default(),
            saved_at: None,
            outcome,
        }
    }
}

impl AnswerSnapshot {
    pub fn capture(answers: AnswerSet) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            answers,
            saved_at: Utc::now(),
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Restores answers from a raw stored snapshot.
///
/// Answers for ids the graph no longer knows are dropped.
pub fn restore(raw: Option<&str>, graph: &QuestionGraph) -> Restored {
    let Some(raw) = raw else {
        return Restored::defaults(RestoreOutcome::Empty);
    };

    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("Discarding unparsable answer snapshot: {e}");
            return Restored::defaults(RestoreOutcome::Corrupt);
        }
    };

    let found = value.get("schema_version").and_then(Value::as_u64);
    if found != Some(u64::from(SCHEMA_VERSION)) {
        warn!(
            "Discarding answer snapshot with schema version {:?} (expected {})",
            found, SCHEMA_VERSION
        );
        return Restored::defaults(RestoreOutcome::Incompatible { found });
    }

    match serde_json::from_value::<AnswerSnapshot>(value) {
        Ok(mut snapshot) => {
            graph.retain_known(&mut snapshot.answers);
            Restored {
                answers: snapshot.answers,
                saved_at: Some(snapshot.saved_at),
                outcome: RestoreOutcome::Restored,
            }
        }
        Err(e) => {
            warn!("Discarding malformed answer snapshot: {e}");
            Restored::defaults(RestoreOutcome::Corrupt)
        }
    }
}
