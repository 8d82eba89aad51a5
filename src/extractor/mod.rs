//! Heuristic flashcard extraction from structured prose.
//!
//! This module provides:
//! - Markdown segmentation into headings, paragraphs, list items, and
//!   fenced code blocks
//! - Four pattern-driven extraction passes producing candidate cards
//! - The validity filter and question normalization shared with card
//!   admission
//!
//! Extraction is best-effort: it may omit or garble content. It is
//! deterministic for a fixed rng seed; randomness is used only to vary
//! question templates.

pub mod extract;
pub mod filter;
pub mod models;
pub mod patterns;
pub mod segment;

pub use extract::{extract, extract_with_seed};
pub use filter::{is_valid, normalize_question};
pub use models::{CandidateCard, ExtractorOptions};
