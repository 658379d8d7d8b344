//! Navigation over the question graph.
//!
//! Positions are indices into the static question list. Only visible questions
//! are ever landed on, and visibility is recomputed from the answers on every
//! call: changing an earlier answer can hide a later question, which then stops
//! blocking navigation and drops out of the submitted answers.

use serde::Serialize;

use crate::questionnaire::answers::AnswerSet;
use crate::questionnaire::schema::{Question, QUESTIONS};
use crate::questionnaire::validation::{validate_step, FieldError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum Step {
    Question(usize),
    /// Past the last visible question: the form is ready to submit.
    Submit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// 1-based position among the visible questions.
    pub position: usize,
    pub total: usize,
}

/// Outcome of pressing "next" on a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Moved(Step),
    /// The current answer does not allow advancing; the position is unchanged.
    Blocked(FieldError),
}

#[derive(Debug, Clone, Copy)]
pub struct QuestionGraph {
    questions: &'static [Question],
}

impl Default for QuestionGraph {
    fn default() -> Self {
        Self::canonical()
    }
}

impl QuestionGraph {
    pub fn new(questions: &'static [Question]) -> Self {
        Self { questions }
    }

    pub fn canonical() -> Self {
        Self::new(QUESTIONS)
    }

    pub fn questions(&self) -> &'static [Question] {
        self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn get(&self, index: usize) -> Option<&'static Question> {
        self.questions.get(index)
    }

    pub fn find(&self, id: &str) -> Option<&'static Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn is_visible(&self, index: usize, answers: &AnswerSet) -> bool {
        self.get(index).is_some_and(|q| q.is_visible(answers))
    }

    /// Visible questions in display order.
    pub fn visible<'a>(
        &self,
        answers: &'a AnswerSet,
    ) -> impl Iterator<Item = &'static Question> + 'a {
        let questions = self.questions;
        questions.iter().filter(move |q| q.is_visible(answers))
    }

    pub fn visible_question_ids(&self, answers: &AnswerSet) -> Vec<&'static str> {
        self.visible(answers).map(|q| q.id).collect()
    }

    pub fn first_step(&self, answers: &AnswerSet) -> Step {
        self.scan_forward(0, answers)
    }

    /// The next visible question after `current`, or `Submit` if none remains.
    pub fn next_step(&self, current: usize, answers: &AnswerSet) -> Step {
        self.scan_forward(current.saturating_add(1), answers)
    }

    /// The closest visible question before `current`. Stays at `current` when
    /// there is none, so it never moves before the first visible question.
    /// A `current` past the end (the submit position) backs onto the last
    /// visible question.
    pub fn previous_step(&self, current: usize, answers: &AnswerSet) -> usize {
        (0..current.min(self.len()))
            .rev()
            .find(|&i| self.is_visible(i, answers))
            .unwrap_or(current)
    }

    /// Validates the current question, then moves to the next visible one.
    pub fn advance(&self, current: usize, answers: &AnswerSet) -> Advance {
        match validate_step(self, current, answers) {
            Ok(()) => Advance::Moved(self.next_step(current, answers)),
            Err(error) => Advance::Blocked(error),
        }
    }

    /// Step indicator data for a visible question; `None` for hidden or
    /// out-of-range indices.
    pub fn progress(&self, current: usize, answers: &AnswerSet) -> Option<Progress> {
        if !self.is_visible(current, answers) {
            return None;
        }
        let position = (0..=current)
            .filter(|&i| self.is_visible(i, answers))
            .count();
        Some(Progress {
            position,
            total: self.visible(answers).count(),
        })
    }

    /// A copy of `answers` restricted to known, currently visible questions.
    pub fn pruned(&self, answers: &AnswerSet) -> AnswerSet {
        let mut pruned = answers.clone();
        pruned.retain(|id, _| self.find(id).is_some_and(|q| q.is_visible(answers)));
        pruned
    }

    /// Drops answers for ids the graph does not know about.
    pub fn retain_known(&self, answers: &mut AnswerSet) {
        answers.retain(|id, _| self.find(id).is_some());
    }

    fn scan_forward(&self, from: usize, answers: &AnswerSet) -> Step {
        (from..self.len())
            .find(|&i| self.is_visible(i, answers))
            .map(Step::Question)
            .unwrap_or(Step::Submit)
    }
}
