use std::fmt;
use std::path::Path;
use std::sync::Arc;

use csv::ReaderBuilder;
use rand::seq::SliceRandom;
use rand::thread_rng;
use serde::Deserialize;
use thiserror::Error;

/// Columns every question file must carry.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "question",
    "option_a",
    "option_b",
    "option_c",
    "option_d",
    "correct_answer",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    pub const ALL: [OptionLabel; 4] = [OptionLabel::A, OptionLabel::B, OptionLabel::C, OptionLabel::D];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "A" => Some(OptionLabel::A),
            "B" => Some(OptionLabel::B),
            "C" => Some(OptionLabel::C),
            "D" => Some(OptionLabel::D),
            _ => None,
        }
    }

    fn index(self) -> usize {
        match self {
            OptionLabel::A => 0,
            OptionLabel::B => 1,
            OptionLabel::C => 2,
            OptionLabel::D => 3,
        }
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            OptionLabel::A => "A",
            OptionLabel::B => "B",
            OptionLabel::C => "C",
            OptionLabel::D => "D",
        };
        f.write_str(letter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub text: String,
    pub options: [String; 4],
    pub correct: OptionLabel,
}

impl Question {
    pub fn option(&self, label: OptionLabel) -> &str {
        &self.options[label.index()]
    }

    pub fn correct_text(&self) -> &str {
        self.option(self.correct)
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}

/// One line of the question file before validation.
#[derive(Debug, Deserialize)]
struct RawQuestion {
    question: String,
    option_a: String,
    option_b: String,
    option_c: String,
    option_d: String,
    correct_answer: String,
}

impl RawQuestion {
    fn validate(self, row: usize) -> Result<Question, LoadError> {
        let invalid = |reason: String| LoadError::InvalidRow { row, reason };

        let text = self.question.trim().to_string();
        if text.is_empty() {
            return Err(invalid("question text is empty".to_string()));
        }

        let options = [self.option_a, self.option_b, self.option_c, self.option_d]
            .map(|option| option.trim().to_string());
        if let Some(label) = OptionLabel::ALL
            .iter()
            .find(|label| options[label.index()].is_empty())
        {
            return Err(invalid(format!("option {} is empty", label)));
        }

        let correct = OptionLabel::parse(&self.correct_answer).ok_or_else(|| {
            invalid(format!(
                "correct answer '{}' is not one of A, B, C, D",
                self.correct_answer.trim()
            ))
        })?;

        Ok(Question { text, options, correct })
    }
}

/// Immutable, ordered question list shared with running sessions.
#[derive(Debug, Clone)]
pub struct QuestionStore {
    questions: Arc<[Question]>,
}

impl Default for QuestionStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl QuestionStore {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions: questions.into(),
        }
    }

    pub fn load_from_csv(path: &Path) -> Result<Self, LoadError> {
        log::info!("Loading questions from: {}", path.display());

        let mut reader = ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        let missing: Vec<String> = REQUIRED_COLUMNS
            .into_iter()
            .filter(|column| !headers.iter().any(|h| h == *column))
            .map(|column| column.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::MissingColumns(missing));
        }

        let mut questions = Vec::new();
        let mut rejected = 0;
        for (i, result) in reader.deserialize::<RawQuestion>().enumerate() {
            let raw = result?;
            match raw.validate(i + 1) {
                Ok(question) => {
                    log::debug!("Row {}: {:?}", i + 1, question.text);
                    questions.push(question);
                }
                Err(e) => {
                    log::warn!("Skipping question in {}: {}", path.display(), e);
                    rejected += 1;
                }
            }
        }

        log::info!("Loaded {} questions, skipped {}", questions.len(), rejected);
        Ok(Self::new(questions))
    }

    /// Loads the question file, degrading to an empty store when the file
    /// itself is unusable. Individual bad rows are already skipped.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load_from_csv(path) {
            Ok(store) => store,
            Err(LoadError::Io(e)) => {
                log::error!("Question file {} unavailable: {}", path.display(), e);
                Self::default()
            }
            Err(e) => {
                log::warn!("Rejected question file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn shuffle(&mut self) {
        let mut questions = self.questions.to_vec();
        questions.shuffle(&mut thread_rng());
        self.questions = questions.into();
    }

    pub fn shared(&self) -> Arc<[Question]> {
        Arc::clone(&self.questions)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
