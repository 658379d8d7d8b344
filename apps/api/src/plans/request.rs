//! Plan Request Assembler: deterministic serialization of a finalized Answer
//! Set into the prompt the inference collaborator expects. No tax logic lives
//! here; the alerts block only restates what the evaluator already flagged.

use serde::Serialize;

use crate::llm_client::prompts::{ADVISORY_INSTRUCTION, MARKDOWN_OUTPUT_INSTRUCTION};
use crate::plans::prompts::{PLAN_SYSTEM, PLAN_TASK};
use crate::questionnaire::alerts::{evaluate, Severity};
use crate::questionnaire::answers::{AnswerSet, AnswerValue};
use crate::questionnaire::navigation::QuestionGraph;
use crate::questionnaire::schema::{InputKind, Question};
use crate::questionnaire::validation::{validate_all, FieldError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanPrompt {
    pub system: String,
    pub user: String,
}

/// Builds the plan prompt. Fails with every offending field when a visible
/// required answer is missing or malformed; answers to hidden questions are
/// dropped before rendering.
pub fn build_request(graph: &QuestionGraph, answers: &AnswerSet) -> Result<PlanPrompt, Vec<FieldError>> {
    validate_all(graph, answers)?;
    let answers = graph.pruned(answers);

    let mut user = String::from("# User Profile\n\n");
    for question in graph.visible(&answers) {
        user.push_str(&format!(
            "**{}:** {}\n",
            question.label,
            display_value(question, &answers)
        ));
    }

    user.push_str("\n# Flagged Alerts\n\n");
    let alerts = evaluate(&answers);
    if alerts.is_empty() {
        user.push_str("- None\n");
    }
    for alert in &alerts {
        user.push_str(&format!("- [{}] {}\n", severity_tag(alert.severity), alert.message));
    }

    user.push_str("\n---\n\n");
    user.push_str(PLAN_TASK);
    user.push_str("\n\n---\n\n");
    user.push_str(MARKDOWN_OUTPUT_INSTRUCTION);
    user.push('\n');
    user.push_str(ADVISORY_INSTRUCTION);
    user.push('\n');

    Ok(PlanPrompt {
        system: PLAN_SYSTEM.to_string(),
        user,
    })
}

/// Human-readable rendering of one answer, shared with the PDF summary.
pub fn display_value(question: &Question, answers: &AnswerSet) -> String {
    let Some(value) = answers.get(question.id).filter(|v| !v.is_empty()) else {
        return match question.kind {
            InputKind::FileMarker => "None uploaded".to_string(),
            _ => "Not provided".to_string(),
        };
    };

    match value {
        AnswerValue::Text(text) if question.kind.is_choice() => question
            .label_for(text)
            .map(str::to_string)
            .unwrap_or_else(|| text.clone()),
        AnswerValue::Text(text) => text.trim().to_string(),
        AnswerValue::Tokens(tokens) => tokens
            .iter()
            .map(|t| question.label_for(t).unwrap_or(t.as_str()))
            .collect::<Vec<_>>()
            .join(", "),
        AnswerValue::Rating(rating) => format!("{rating}/5"),
        AnswerValue::Unset => "Not provided".to_string(),
        AnswerValue::Invalid(raw) => raw.to_string(),
    }
}

fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "CRITICAL",
        Severity::High => "HIGH",
        Severity::Medium => "MEDIUM",
    }
}
