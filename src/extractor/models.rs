//! Candidate records produced by extraction.

use serde::{Deserialize, Serialize};

use crate::flashcards::{CardOrigin, DifficultyHint};

/// A question/answer pair mined from source text, not yet accepted into a
/// topic. External generators submit the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateCard {
    pub question: String,
    pub answer: String,
    pub origin: CardOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_hint: Option<DifficultyHint>,
}

impl CandidateCard {
    pub fn new(question: String, answer: String, origin: CardOrigin) -> Self {
        Self {
            question,
            answer,
            origin,
            difficulty_hint: None,
        }
    }
}

/// Length windows applied during extraction and candidate admission.
#[derive(Debug, Clone)]
pub struct ExtractorOptions {
    pub min_question_len: usize,
    pub max_question_len: usize,
    pub min_answer_len: usize,
    pub max_answer_len: usize,
    /// Fenced code bodies outside this window are not turned into cards.
    pub min_code_len: usize,
    pub max_code_len: usize,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            min_question_len: 5,
            max_question_len: 500,
            min_answer_len: 20,
            max_answer_len: 1500,
            min_code_len: 10,
            max_code_len: 1000,
        }
    }
}
