use std::collections::BTreeMap;
use std::sync::Arc;

use crate::quiz::{OptionLabel, Question};

/// Final counts handed to the score report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub total: usize,
    pub correct: usize,
    pub elapsed_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
    Unanswered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionOutcome {
    pub index: usize,
    pub chosen: Option<OptionLabel>,
    pub correct: OptionLabel,
    pub outcome: Outcome,
}

/// One user's run through the question list.
#[derive(Debug)]
pub struct QuizSession {
    user_name: String,
    questions: Arc<[Question]>,
    current_index: usize,
    answers: BTreeMap<usize, OptionLabel>,
}

impl QuizSession {
    pub fn new(user_name: impl Into<String>, questions: Arc<[Question]>) -> Self {
        Self {
            user_name: user_name.into(),
            questions,
            current_index: 0,
            answers: BTreeMap::new(),
        }
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn is_first(&self) -> bool {
        self.current_index == 0
    }

    pub fn is_last(&self) -> bool {
        self.current_index + 1 >= self.questions.len()
    }

    pub fn answer_for(&self, index: usize) -> Option<OptionLabel> {
        self.answers.get(&index).copied()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Records `option` for `index`, replacing any earlier choice.
    pub fn answer(&mut self, index: usize, option: OptionLabel) {
        if index >= self.questions.len() {
            log::debug!("Ignoring answer for question {} of {}", index, self.questions.len());
            return;
        }
        self.answers.insert(index, option);
    }

    pub fn advance(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.current_index += 1;
        true
    }

    pub fn retreat(&mut self) -> bool {
        if self.is_first() {
            return false;
        }
        self.current_index -= 1;
        true
    }

    pub fn submit(&self, elapsed_secs: u64) -> Tally {
        let correct = self
            .review()
            .iter()
            .filter(|item| item.outcome == Outcome::Correct)
            .count();
        log::info!(
            "{} submitted: {}/{} correct, {} answered",
            self.user_name,
            correct,
            self.total(),
            self.answered_count()
        );
        Tally {
            total: self.total(),
            correct,
            elapsed_secs,
        }
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn review(&self) -> Vec<QuestionOutcome> {
        self.questions
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let chosen = self.answer_for(index);
                let outcome = match chosen {
                    None => Outcome::Unanswered,
                    Some(label) if label == question.correct => Outcome::Correct,
                    Some(_) => Outcome::Incorrect,
                };
                QuestionOutcome {
                    index,
                    chosen,
                    correct: question.correct,
                    outcome,
                }
            })
            .collect()
    }
}
