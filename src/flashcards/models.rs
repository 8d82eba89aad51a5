//! Data models for the flashcard system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Export format version, bumped on incompatible changes to [`TopicExport`].
pub const EXPORT_FORMAT_VERSION: u32 = 1;

/// Where a card came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CardOrigin {
    /// Mined from a heading and its following prose
    HeuristicHeading,
    /// Mined from an inline `**Term**: explanation` run
    HeuristicDefinition,
    /// Mined from a bold-led list item
    HeuristicList,
    /// Mined from a fenced code block
    HeuristicCode,
    /// Typed in by the user
    Manual,
    /// Brought in through topic import
    Imported,
    /// Produced by an external generator satisfying the candidate schema
    Generated,
}

impl Default for CardOrigin {
    fn default() -> Self {
        Self::Manual
    }
}

/// Advisory difficulty attached at creation; never consulted by scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DifficultyHint {
    Easy,
    Medium,
    Hard,
}

/// A reviewable question/answer unit with its spaced repetition state.
///
/// Scheduling fields carry serde defaults so records written by older
/// versions deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: Uuid,
    pub question: String,
    /// May contain embedded fenced code.
    pub answer: String,
    #[serde(default)]
    pub origin: CardOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_hint: Option<DifficultyHint>,
    /// Self-assessed mastery, 0 (unknown) to 5 (mastered).
    #[serde(default)]
    pub confidence: i32,
    /// SM-2 ease factor, never below 1.3.
    #[serde(default = "default_easiness_factor")]
    pub easiness_factor: f32,
    /// Days until the next review once graduated; a fraction of a day
    /// while the card sits in the learning ladder.
    #[serde(default)]
    pub interval_days: f32,
    /// Successful graduated reviews.
    #[serde(default)]
    pub repetitions: i32,
    /// Position within the learning-step ladder while new/relearning.
    #[serde(default)]
    pub learning_step_index: usize,
    /// True until the card first graduates out of the ladder.
    #[serde(default = "default_is_new")]
    pub is_new: bool,
    /// The card is due once `now >= next_review_at`.
    pub next_review_at: DateTime<Utc>,
    #[serde(default)]
    pub review_count: i32,
    #[serde(default)]
    pub correct_count: i32,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

fn default_easiness_factor() -> f32 {
    2.5
}

fn default_is_new() -> bool {
    true
}

impl Flashcard {
    /// A brand-new card, due immediately.
    pub fn new(question: String, answer: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            question,
            answer,
            origin: CardOrigin::default(),
            difficulty_hint: None,
            confidence: 0,
            easiness_factor: default_easiness_factor(),
            interval_days: 0.0,
            repetitions: 0,
            learning_step_index: 0,
            is_new: true,
            next_review_at: now,
            review_count: 0,
            correct_count: 0,
            created_at: now,
            last_reviewed_at: None,
        }
    }

    /// Check if the card is due for review
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.next_review_at
    }

    /// Re-clamp fields an external record may carry out of range.
    pub fn clamp_invariants(&mut self, config: &SchedulerConfig) {
        self.confidence = self.confidence.clamp(0, 5);
        self.easiness_factor = self.easiness_factor.max(super::algorithm::MIN_EASE_FACTOR);
        self.interval_days = self.interval_days.clamp(0.0, config.max_interval_days);
        self.repetitions = self.repetitions.max(0);
        self.review_count = self.review_count.max(0);
        self.correct_count = self.correct_count.max(0).min(self.review_count);
    }
}

/// Per-topic scheduling settings.
///
/// Edits apply only to subsequent scheduling computations; stored cards are
/// never rewritten retroactively. A missing or corrupt persisted config
/// falls back to [`SchedulerConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerConfig {
    /// Re-show offsets in minutes while the card is still learning.
    #[serde(default = "default_learning_steps")]
    pub learning_steps: Vec<i64>,
    /// Interval assigned when a card clears the last learning step.
    #[serde(default = "default_graduating_interval_days")]
    pub graduating_interval_days: f32,
    /// Reserved for "easy on first graduation" acceleration.
    #[serde(default = "default_easy_interval_days")]
    pub easy_interval_days: f32,
    /// Ceiling on `interval_days`.
    #[serde(default = "default_max_interval_days")]
    pub max_interval_days: f32,
    /// Interval assigned at first graduation of brand-new material.
    #[serde(default = "default_new_card_interval_days")]
    pub new_card_interval_days: f32,
}

fn default_learning_steps() -> Vec<i64> {
    vec![10, 1440]
}

fn default_graduating_interval_days() -> f32 {
    6.0
}

fn default_easy_interval_days() -> f32 {
    10.0
}

fn default_max_interval_days() -> f32 {
    365.0
}

fn default_new_card_interval_days() -> f32 {
    1.0
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            learning_steps: default_learning_steps(),
            graduating_interval_days: default_graduating_interval_days(),
            easy_interval_days: default_easy_interval_days(),
            max_interval_days: default_max_interval_days(),
            new_card_interval_days: default_new_card_interval_days(),
        }
    }
}

/// Portable backup record for one topic's card collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicExport {
    pub topic_id: String,
    pub cards: Vec<Flashcard>,
    pub exported_at: DateTime<Utc>,
    pub format_version: u32,
}

/// Aggregate counts for a topic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicStats {
    pub total_cards: usize,
    pub new_cards: usize,
    pub learning_cards: usize,
    pub graduated_cards: usize,
    pub due_cards: usize,
    pub total_reviews: i64,
    pub total_correct: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_card_is_due_immediately() {
        let card = Flashcard::new("Q?".to_string(), "A".to_string());
        assert!(card.is_new);
        assert_eq!(card.repetitions, 0);
        assert_eq!(card.learning_step_index, 0);
        assert!(card.is_due(Utc::now()));
    }

    #[test]
    fn test_config_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.learning_steps, vec![10, 1440]);
        assert_eq!(config.graduating_interval_days, 6.0);
        assert_eq!(config.easy_interval_days, 10.0);
        assert_eq!(config.max_interval_days, 365.0);
        assert_eq!(config.new_card_interval_days, 1.0);
    }

    #[test]
    fn test_card_deserializes_with_missing_scheduling_fields() {
        // A minimal record, as an older version or an external producer
        // might have written it
        let json = r#"{
            "id": "7f2c1e9a-3a64-4f0f-9d2b-1c2d3e4f5a6b",
            "question": "What is a closure?",
            "answer": "A function bundled with references to its lexical scope.",
            "nextReviewAt": "2026-01-01T00:00:00Z",
            "createdAt": "2026-01-01T00:00:00Z"
        }"#;

        let card: Flashcard = serde_json::from_str(json).unwrap();
        assert_eq!(card.easiness_factor, 2.5);
        assert!(card.is_new);
        assert_eq!(card.confidence, 0);
        assert_eq!(card.origin, CardOrigin::Manual);
    }

    #[test]
    fn test_clamp_invariants() {
        let config = SchedulerConfig::default();
        let mut card = Flashcard::new("Q?".to_string(), "A".to_string());
        card.confidence = 9;
        card.easiness_factor = 0.4;
        card.interval_days = 9000.0;
        card.correct_count = 5;

        card.clamp_invariants(&config);

        assert_eq!(card.confidence, 5);
        assert_eq!(card.easiness_factor, 1.3);
        assert_eq!(card.interval_days, 365.0);
        assert_eq!(card.correct_count, 0);
    }
}
