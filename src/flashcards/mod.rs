//! Flashcard and spaced repetition system.
//!
//! This module provides:
//! - Flashcard records with per-card review statistics
//! - SM-2 spaced repetition with a minute-scale learning ladder
//! - Card storage over the key-value persistence boundary
//! - The bounded study-session state machine

pub mod algorithm;
pub mod models;
pub mod session;
pub mod store;

pub use models::*;
pub use session::{
    SessionError, SessionOptions, SessionState, SessionSummary, StudyMode, StudySession,
};
pub use store::{CardStore, StoreError};
