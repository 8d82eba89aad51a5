//! mneme — a personal flashcard study engine.
//!
//! Turns markdown notes into reviewable flashcards and schedules their
//! repetition:
//!
//! - [`extractor`]: heuristic extraction of question/answer candidates
//!   from structured prose
//! - [`flashcards`]: card records, the SM-2 scheduler with a learning
//!   ladder, topic-keyed storage, and the study-session state machine
//! - [`storage`]: the key-value persistence boundary the card store
//!   writes through
//!
//! The engine is single-threaded and synchronous; every operation runs to
//! completion. Recoverable failures (missing or corrupt persisted state)
//! degrade to empty/default values rather than crashing the host; only a
//! capacity-rejected write is surfaced for user action.

pub mod extractor;
pub mod flashcards;
pub mod storage;
