//! Answer Set: the user's questionnaire answers keyed by question id.
//!
//! The wire shape is the flat JSON object the front end keeps in local storage:
//! `{"revenue": "above_75l", "client_location": ["usa"], "expense_records": 4}`.
//! A string is a single token for choice questions and free text for text
//! questions; the question kind decides how it is read.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single answer value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// Integer rating (1–5 for rating questions; range is checked by validation).
    Rating(u8),
    /// Multi-select tokens, or file names for file-marker questions.
    Tokens(Vec<String>),
    /// Single choice token or free text.
    Text(String),
    /// Explicit `null` from the client.
    Unset,
    /// Anything else (a boolean, an object, a rating outside `u8`). Kept so
    /// validation can report it against its question.
    Invalid(Value),
}

impl AnswerValue {
    /// True when the value carries nothing a required question could accept.
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Rating(_) => false,
            AnswerValue::Tokens(tokens) => tokens.is_empty(),
            AnswerValue::Text(text) => text.trim().is_empty(),
            AnswerValue::Unset => true,
            AnswerValue::Invalid(_) => false,
        }
    }
}

/// Mapping from question id to answer. Unset answers are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(BTreeMap<String, AnswerValue>);

impl AnswerSet {
    /// Returns the stored value, treating an explicit `null` as absent.
    pub fn get(&self, id: &str) -> Option<&AnswerValue> {
        self.0.get(id).filter(|v| !matches!(v, AnswerValue::Unset))
    }

    /// The single token / text answer for `id`, if that is what was stored.
    pub fn token(&self, id: &str) -> Option<&str> {
        match self.get(id) {
            Some(AnswerValue::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// The multi-select tokens for `id`; empty when unset or of another shape.
    pub fn tokens(&self, id: &str) -> &[String] {
        match self.get(id) {
            Some(AnswerValue::Tokens(tokens)) => tokens,
            _ => &[],
        }
    }

    pub fn contains_token(&self, id: &str, token: &str) -> bool {
        self.tokens(id).iter().any(|t| t == token)
    }

    pub fn rating(&self, id: &str) -> Option<u8> {
        match self.get(id) {
            Some(AnswerValue::Rating(r)) => Some(*r),
            _ => None,
        }
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, &AnswerValue) -> bool) {
        self.0.retain(|id, value| keep(id, value));
    }
}

#[cfg(test)]
impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_answered(&self, id: &str) -> bool {
        self.get(id).is_some_and(|v| !v.is_empty())
    }

    /// Stores `value` under `id`. Setting `Unset` removes the answer.
    pub fn set(&mut self, id: impl Into<String>, value: AnswerValue) {
        let id = id.into();
        if matches!(value, AnswerValue::Unset) {
            self.0.remove(&id);
        } else {
            self.0.insert(id, value);
        }
    }

    /// Single-choice selection: replaces any previous token.
    pub fn select(&mut self, id: impl Into<String>, token: impl Into<String>) {
        self.set(id, AnswerValue::Text(token.into()));
    }

    /// Multi-choice selection: adds `token` if absent, removes it if present.
    pub fn toggle(&mut self, id: &str, token: &str) {
        let mut tokens = self.tokens(id).to_vec();
        if let Some(pos) = tokens.iter().position(|t| t == token) {
            tokens.remove(pos);
        } else {
            tokens.push(token.to_string());
        }
        self.set(id, AnswerValue::Tokens(tokens));
    }

    pub fn clear(&mut self, id: &str) {
        self.0.remove(id);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnswerValue)> {
        self.0.iter().map(|(id, value)| (id.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Builder form of [`AnswerSet::set`], mostly for fixtures.
    pub fn with(mut self, id: &str, value: AnswerValue) -> Self {
        self.set(id, value);
        self
    }
}
