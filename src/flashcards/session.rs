//! Study session state machine.
//!
//! A session is ephemeral and never persisted: it holds card ids only and
//! writes every scoring action through the card store immediately, so no
//! card copy can drift from the stored value. One active session per topic
//! is assumed by the caller.
//!
//! States: Presenting -> Revealed -> (Presenting | Complete). `reveal` is
//! an idempotent toggle; scoring is only valid while the answer is shown.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::storage::KeyValueStore;

use super::algorithm;
use super::models::Flashcard;
use super::store::{CardStore, StoreError};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid session transition: {action} is only valid while {expected}")]
    InvalidTransition {
        action: &'static str,
        expected: &'static str,
    },

    #[error("Invalid review quality {0}: expected 1-5")]
    InvalidQuality(i32),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Presenting,
    Revealed,
    Complete,
}

/// Which cards make up the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyMode {
    /// Every card in the topic.
    All,
    /// Only cards whose next review time has passed.
    Due,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub mode: StudyMode,
    pub shuffle: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            mode: StudyMode::Due,
            shuffle: false,
        }
    }
}

/// Final statistics handed back when a session ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub total: usize,
    pub correct: usize,
    pub lapses: usize,
    pub elapsed_seconds: i64,
}

/// One bounded run through a deck of cards.
#[derive(Debug)]
pub struct StudySession {
    topic_id: String,
    deck: Vec<Uuid>,
    cursor: usize,
    correct_count: usize,
    lapse_count: usize,
    state: SessionState,
    started_at: DateTime<Utc>,
}

impl StudySession {
    /// Build a deck and enter Presenting at cursor 0. The deck is sorted
    /// ascending by next review time (stable for ties), then shuffled when
    /// requested. Returns `None` when no cards qualify.
    pub fn start<S: KeyValueStore>(
        store: &mut CardStore<S>,
        topic: &str,
        options: &SessionOptions,
        now: DateTime<Utc>,
        rng: &mut impl Rng,
    ) -> Option<StudySession> {
        let mut cards: Vec<Flashcard> = match options.mode {
            StudyMode::Due => store.due_cards(topic, now),
            StudyMode::All => store.cards(topic).to_vec(),
        };
        if cards.is_empty() {
            return None;
        }

        cards.sort_by(|a, b| a.next_review_at.cmp(&b.next_review_at));
        let mut deck: Vec<Uuid> = cards.into_iter().map(|card| card.id).collect();
        if options.shuffle {
            deck.shuffle(rng);
        }

        Some(StudySession {
            topic_id: topic.to_string(),
            deck,
            cursor: 0,
            correct_count: 0,
            lapse_count: 0,
            state: SessionState::Presenting,
            started_at: now,
        })
    }

    pub fn topic_id(&self) -> &str {
        &self.topic_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The card currently shown, `None` once the session is complete.
    pub fn current_card_id(&self) -> Option<Uuid> {
        if self.state == SessionState::Complete {
            return None;
        }
        self.deck.get(self.cursor).copied()
    }

    pub fn total(&self) -> usize {
        self.deck.len()
    }

    /// Cards not yet presented, including the current one.
    pub fn remaining(&self) -> usize {
        self.deck.len().saturating_sub(self.cursor)
    }

    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    pub fn lapse_count(&self) -> usize {
        self.lapse_count
    }

    /// Toggle between question and answer. No effect once complete.
    pub fn reveal(&mut self) {
        self.state = match self.state {
            SessionState::Presenting => SessionState::Revealed,
            SessionState::Revealed => SessionState::Presenting,
            SessionState::Complete => SessionState::Complete,
        };
    }

    /// Move on without touching the card's schedule.
    pub fn skip(&mut self) {
        if self.state == SessionState::Complete {
            return;
        }
        self.advance();
    }

    /// Score the current card. Valid only while the answer is revealed;
    /// calling it in any other state is a programming error in the caller
    /// and fails loudly.
    pub fn score<S: KeyValueStore>(
        &mut self,
        store: &mut CardStore<S>,
        quality: i32,
        now: DateTime<Utc>,
    ) -> Result<Flashcard, SessionError> {
        if !(1..=5).contains(&quality) {
            return Err(SessionError::InvalidQuality(quality));
        }
        if self.state != SessionState::Revealed {
            log::error!(
                "score() called in {:?}; answer controls are only valid once revealed",
                self.state
            );
            return Err(SessionError::InvalidTransition {
                action: "score",
                expected: "the answer is revealed",
            });
        }
        let Some(card_id) = self.deck.get(self.cursor).copied() else {
            return Err(SessionError::InvalidTransition {
                action: "score",
                expected: "a card is presented",
            });
        };

        let updated = store.record_review(&self.topic_id, card_id, quality, now)?;
        if algorithm::is_pass(quality) {
            self.correct_count += 1;
        } else {
            self.lapse_count += 1;
        }
        self.advance();

        Ok(updated)
    }

    /// Finish from any state, consuming the session.
    pub fn end(self, now: DateTime<Utc>) -> SessionSummary {
        SessionSummary {
            total: self.deck.len(),
            correct: self.correct_count,
            lapses: self.lapse_count,
            elapsed_seconds: (now - self.started_at).num_seconds(),
        }
    }

    fn advance(&mut self) {
        self.cursor += 1;
        self.state = if self.cursor >= self.deck.len() {
            SessionState::Complete
        } else {
            SessionState::Presenting
        };
    }
}
