use serde::Serialize;

use crate::questionnaire::answers::{AnswerSet, AnswerValue};
use crate::questionnaire::navigation::QuestionGraph;
use crate::questionnaire::schema::{InputKind, Question};

/// Upper bound on free-text answers, in characters.
const MAX_TEXT_CHARS: usize = 4000;

/// A problem with a single question's answer, shown inline next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub question_id: String,
    pub message: String,
}

impl FieldError {
    fn new(question: &Question, message: impl Into<String>) -> Self {
        Self {
            question_id: question.id.to_string(),
            message: message.into(),
        }
    }
}

/// Checks one question's answer, ignoring visibility.
///
/// Unset and blank values fail only when the question is required. Set values
/// must match the question's kind: known tokens, at least one token for
/// multi-select, a 1–5 rating, bounded text.
pub fn check_answer(question: &Question, answers: &AnswerSet) -> Result<(), FieldError> {
    let value = match answers.get(question.id) {
        Some(value) if !value.is_empty() => value,
        _ if question.required => return Err(FieldError::new(question, question.missing_message)),
        _ => return Ok(()),
    };

    match (question.kind, value) {
        (InputKind::SingleChoice, AnswerValue::Text(token)) => {
            if question.allows(token) {
                Ok(())
            } else {
                Err(FieldError::new(
                    question,
                    format!("'{token}' is not a valid option."),
                ))
            }
        }
        (InputKind::MultiChoice, AnswerValue::Tokens(tokens)) => {
            match tokens.iter().find(|t| !question.allows(t)) {
                Some(bad) => Err(FieldError::new(
                    question,
                    format!("'{bad}' is not a valid option."),
                )),
                None => Ok(()),
            }
        }
        (InputKind::FreeText | InputKind::LongText, AnswerValue::Text(text)) => {
            if text.chars().count() > MAX_TEXT_CHARS {
                Err(FieldError::new(
                    question,
                    format!("Please keep this under {MAX_TEXT_CHARS} characters."),
                ))
            } else {
                Ok(())
            }
        }
        (InputKind::Rating, AnswerValue::Rating(rating)) => {
            if (1..=5).contains(rating) {
                Ok(())
            } else {
                Err(FieldError::new(question, "Please choose a rating from 1 to 5."))
            }
        }
        (InputKind::FileMarker, AnswerValue::Tokens(_) | AnswerValue::Text(_)) => Ok(()),
        _ => Err(FieldError::new(
            question,
            "Unexpected answer type for this question.",
        )),
    }
}

/// Per-step validity: may the user advance past the question at `index`?
///
/// A question hidden by its predicate is always valid.
pub fn validate_step(
    graph: &QuestionGraph,
    index: usize,
    answers: &AnswerSet,
) -> Result<(), FieldError> {
    let question = graph.get(index).ok_or_else(|| FieldError {
        question_id: String::new(),
        message: format!("There is no question at position {index}."),
    })?;

    if !question.is_visible(answers) {
        return Ok(());
    }
    check_answer(question, answers)
}

/// Validates every visible question, collecting all failures in display order.
pub fn validate_all(graph: &QuestionGraph, answers: &AnswerSet) -> Result<(), Vec<FieldError>> {
    let errors: Vec<FieldError> = graph
        .visible(answers)
        .filter_map(|q| check_answer(q, answers).err())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
