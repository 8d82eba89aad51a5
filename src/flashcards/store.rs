//! Card storage over the key-value persistence boundary.
//!
//! One record per topic holds the topic's cards plus its scheduler
//! configuration. The store keeps an in-memory copy per topic and writes
//! through on every mutation; a rejected write rolls the in-memory copy
//! back so callers never observe partial success.
//!
//! Missing or corrupt persisted records degrade to an empty deck and the
//! default configuration. That path is logged, never fatal.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::extractor::{self, CandidateCard, ExtractorOptions};
use crate::storage::{KeyValueStore, StorageError};

use super::algorithm;
use super::models::{
    Flashcard, SchedulerConfig, TopicExport, TopicStats, EXPORT_FORMAT_VERSION,
};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage capacity exceeded for topic '{0}': free space or delete cards, then retry")]
    CapacityExceeded(String),

    #[error("Card not found: {0}")]
    CardNotFound(Uuid),

    #[error("Unsupported export format version {0}")]
    UnsupportedFormatVersion(u32),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Everything persisted for one topic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopicRecord {
    #[serde(default)]
    cards: Vec<Flashcard>,
    #[serde(default)]
    config: SchedulerConfig,
}

/// Owner of persisted flashcards, keyed by topic id.
pub struct CardStore<S: KeyValueStore> {
    backend: S,
    topics: HashMap<String, TopicRecord>,
}

impl<S: KeyValueStore> CardStore<S> {
    pub fn new(backend: S) -> Self {
        Self {
            backend,
            topics: HashMap::new(),
        }
    }

    fn record_mut(&mut self, topic: &str) -> &mut TopicRecord {
        match self.topics.entry(topic.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(load_record(&self.backend, topic)),
        }
    }

    fn persist(&mut self, topic: &str) -> Result<()> {
        let record = self.record_mut(topic);
        let payload = serde_json::to_string(record).map_err(StorageError::Json)?;
        self.backend.write(topic, &payload).map_err(|e| match e {
            StorageError::CapacityExceeded(_) => StoreError::CapacityExceeded(topic.to_string()),
            other => StoreError::Storage(other),
        })
    }

    // ==================== Card Operations ====================

    /// All cards for a topic, in stored order.
    pub fn cards(&mut self, topic: &str) -> &[Flashcard] {
        &self.record_mut(topic).cards
    }

    /// Look up a single card.
    pub fn get(&mut self, topic: &str, id: Uuid) -> Option<Flashcard> {
        self.record_mut(topic)
            .cards
            .iter()
            .find(|card| card.id == id)
            .cloned()
    }

    /// Insert or overwrite a card by id, assigning an id when absent.
    /// Re-submitting an identical record is a no-op.
    pub fn put(&mut self, topic: &str, mut card: Flashcard) -> Result<Flashcard> {
        if card.id.is_nil() {
            card.id = Uuid::new_v4();
        }

        let record = self.record_mut(topic);
        match record.cards.iter().position(|c| c.id == card.id) {
            Some(position) => {
                if record.cards[position] == card {
                    return Ok(card);
                }
                let previous = std::mem::replace(&mut record.cards[position], card.clone());
                if let Err(e) = self.persist(topic) {
                    self.record_mut(topic).cards[position] = previous;
                    return Err(e);
                }
            }
            None => {
                record.cards.push(card.clone());
                if let Err(e) = self.persist(topic) {
                    self.record_mut(topic).cards.pop();
                    return Err(e);
                }
            }
        }

        Ok(card)
    }

    /// Remove a card. Returns whether it existed.
    pub fn delete(&mut self, topic: &str, id: Uuid) -> Result<bool> {
        let record = self.record_mut(topic);
        let Some(position) = record.cards.iter().position(|c| c.id == id) else {
            return Ok(false);
        };

        let removed = record.cards.remove(position);
        if let Err(e) = self.persist(topic) {
            self.record_mut(topic).cards.insert(position, removed);
            return Err(e);
        }
        Ok(true)
    }

    /// Cards due at `now`, oldest due first.
    pub fn due_cards(&mut self, topic: &str, now: DateTime<Utc>) -> Vec<Flashcard> {
        let mut due: Vec<Flashcard> = self
            .record_mut(topic)
            .cards
            .iter()
            .filter(|card| card.is_due(now))
            .cloned()
            .collect();
        due.sort_by(|a, b| a.next_review_at.cmp(&b.next_review_at));
        due
    }

    // ==================== Configuration ====================

    /// The topic's scheduler configuration (defaults when never set).
    pub fn config(&mut self, topic: &str) -> SchedulerConfig {
        self.record_mut(topic).config.clone()
    }

    /// Replace the topic's scheduler configuration. Applies only to
    /// subsequent scheduling; stored cards are not rewritten.
    pub fn set_config(&mut self, topic: &str, config: SchedulerConfig) -> Result<()> {
        let record = self.record_mut(topic);
        let previous = std::mem::replace(&mut record.config, config);
        if let Err(e) = self.persist(topic) {
            self.record_mut(topic).config = previous;
            return Err(e);
        }
        Ok(())
    }

    // ==================== Review ====================

    /// Score one review: run the scheduler, apply confidence and counter
    /// updates, and write the card through.
    pub fn record_review(
        &mut self,
        topic: &str,
        id: Uuid,
        quality: i32,
        now: DateTime<Utc>,
    ) -> Result<Flashcard> {
        let config = self.config(topic);
        let card = self
            .get(topic, id)
            .ok_or(StoreError::CardNotFound(id))?;

        let mut updated = algorithm::review(&card, quality, &config, now);
        updated.review_count = card.review_count + 1;
        if algorithm::is_pass(quality) {
            updated.correct_count = card.correct_count + 1;
            updated.confidence = (card.confidence + 1).min(5);
        } else {
            updated.confidence = (card.confidence - 1).max(0);
        }
        updated.last_reviewed_at = Some(now);

        self.put(topic, updated)
    }

    // ==================== Candidate Admission ====================

    /// Admit candidate cards (from extraction or an external generator):
    /// validity-filter, drop duplicates of existing or earlier candidates,
    /// persist the rest. Returns the accepted cards.
    pub fn accept_candidates(
        &mut self,
        topic: &str,
        candidates: Vec<CandidateCard>,
    ) -> Result<Vec<Flashcard>> {
        self.accept_candidates_with(topic, candidates, &ExtractorOptions::default())
    }

    pub fn accept_candidates_with(
        &mut self,
        topic: &str,
        candidates: Vec<CandidateCard>,
        options: &ExtractorOptions,
    ) -> Result<Vec<Flashcard>> {
        let record = self.record_mut(topic);
        let mut seen: HashSet<String> = record
            .cards
            .iter()
            .map(|card| extractor::normalize_question(&card.question))
            .collect();
        let previous_len = record.cards.len();

        let mut accepted = Vec::new();
        for candidate in candidates {
            if !extractor::is_valid(&candidate, options) {
                continue;
            }
            if !seen.insert(extractor::normalize_question(&candidate.question)) {
                log::debug!("skipping duplicate candidate '{}'", candidate.question);
                continue;
            }

            let mut card = Flashcard::new(candidate.question, candidate.answer);
            card.origin = candidate.origin;
            card.difficulty_hint = candidate.difficulty_hint;
            record.cards.push(card.clone());
            accepted.push(card);
        }

        if accepted.is_empty() {
            return Ok(accepted);
        }
        if let Err(e) = self.persist(topic) {
            self.record_mut(topic).cards.truncate(previous_len);
            return Err(e);
        }
        Ok(accepted)
    }

    // ==================== Export / Import ====================

    /// Serialize a topic's full card collection for backup.
    pub fn export_topic(&mut self, topic: &str, now: DateTime<Utc>) -> TopicExport {
        TopicExport {
            topic_id: topic.to_string(),
            cards: self.record_mut(topic).cards.clone(),
            exported_at: now,
            format_version: EXPORT_FORMAT_VERSION,
        }
    }

    /// Import a backup record. Cards whose normalized question already
    /// exists for the topic are silently skipped. Returns the number of
    /// cards taken in.
    pub fn import_topic(&mut self, export: TopicExport) -> Result<usize> {
        if export.format_version > EXPORT_FORMAT_VERSION {
            return Err(StoreError::UnsupportedFormatVersion(export.format_version));
        }

        let topic = export.topic_id;
        let config = self.config(&topic);
        let record = self.record_mut(&topic);
        let mut seen: HashSet<String> = record
            .cards
            .iter()
            .map(|card| extractor::normalize_question(&card.question))
            .collect();
        let existing_ids: HashSet<Uuid> = record.cards.iter().map(|card| card.id).collect();
        let previous_len = record.cards.len();

        let mut imported = 0;
        for mut card in export.cards {
            if !seen.insert(extractor::normalize_question(&card.question)) {
                log::debug!("skipping duplicate imported card '{}'", card.question);
                continue;
            }
            if card.id.is_nil() || existing_ids.contains(&card.id) {
                card.id = Uuid::new_v4();
            }
            card.clamp_invariants(&config);
            record.cards.push(card);
            imported += 1;
        }

        if imported == 0 {
            return Ok(0);
        }
        if let Err(e) = self.persist(&topic) {
            self.record_mut(&topic).cards.truncate(previous_len);
            return Err(e);
        }
        Ok(imported)
    }

    // ==================== Stats ====================

    /// Aggregate counts for a topic.
    pub fn stats(&mut self, topic: &str, now: DateTime<Utc>) -> TopicStats {
        let record = self.record_mut(topic);
        let mut stats = TopicStats {
            total_cards: record.cards.len(),
            ..TopicStats::default()
        };

        for card in &record.cards {
            if card.is_new {
                stats.new_cards += 1;
            } else if card.repetitions == 0 {
                stats.learning_cards += 1;
            } else {
                stats.graduated_cards += 1;
            }
            if card.is_due(now) {
                stats.due_cards += 1;
            }
            stats.total_reviews += card.review_count as i64;
            stats.total_correct += card.correct_count as i64;
        }

        stats
    }

    /// Topics known to the backing store (plus unpersisted in-memory ones).
    pub fn topics(&self) -> Result<Vec<String>> {
        let mut topics = self.backend.keys().map_err(StoreError::Storage)?;
        for (topic, record) in &self.topics {
            if !record.cards.is_empty() && !topics.contains(topic) {
                topics.push(topic.clone());
            }
        }
        topics.sort();
        Ok(topics)
    }
}

fn load_record<S: KeyValueStore>(backend: &S, topic: &str) -> TopicRecord {
    match backend.read(topic) {
        Ok(Some(payload)) => match serde_json::from_str(&payload) {
            Ok(record) => record,
            Err(e) => {
                log::warn!(
                    "Corrupt record for topic '{}', treating as empty: {}",
                    topic,
                    e
                );
                TopicRecord::default()
            }
        },
        Ok(None) => TopicRecord::default(),
        Err(e) => {
            log::warn!("Failed to read topic '{}', treating as empty: {}", topic, e);
            TopicRecord::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flashcards::CardOrigin;
    use crate::storage::MemoryKeyValueStore;

    fn store() -> CardStore<MemoryKeyValueStore> {
        CardStore::new(MemoryKeyValueStore::new())
    }

    fn candidate(question: &str, answer: &str) -> CandidateCard {
        CandidateCard::new(
            question.to_string(),
            answer.to_string(),
            CardOrigin::Generated,
        )
    }

    #[test]
    fn test_put_assigns_id_and_persists() {
        let mut store = store();
        let mut card = Flashcard::new("What is a closure?".into(), "A captured function.".into());
        card.id = Uuid::nil();

        let saved = store.put("rust", card).unwrap();

        assert!(!saved.id.is_nil());
        assert_eq!(store.cards("rust").len(), 1);
    }

    #[test]
    fn test_put_identical_record_is_idempotent() {
        let mut store = store();
        let card = Flashcard::new("Q?".into(), "A long enough answer.".into());

        store.put("rust", card.clone()).unwrap();
        store.put("rust", card.clone()).unwrap();

        assert_eq!(store.cards("rust").len(), 1);
    }

    #[test]
    fn test_delete() {
        let mut store = store();
        let card = store
            .put("rust", Flashcard::new("Q?".into(), "A.".into()))
            .unwrap();

        assert!(store.delete("rust", card.id).unwrap());
        assert!(!store.delete("rust", card.id).unwrap());
        assert!(store.cards("rust").is_empty());
    }

    #[test]
    fn test_due_cards_filtered_and_sorted() {
        let mut store = store();
        let now = Utc::now();

        let mut later = Flashcard::new("Later?".into(), "Due in the future.".into());
        later.next_review_at = now + chrono::Duration::days(3);
        let mut soon = Flashcard::new("Soon?".into(), "Was due an hour ago.".into());
        soon.next_review_at = now - chrono::Duration::hours(1);
        let mut overdue = Flashcard::new("Overdue?".into(), "Due yesterday already.".into());
        overdue.next_review_at = now - chrono::Duration::days(1);

        store.put("rust", later).unwrap();
        store.put("rust", soon.clone()).unwrap();
        store.put("rust", overdue.clone()).unwrap();

        let due = store.due_cards("rust", now);
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].id, overdue.id);
        assert_eq!(due[1].id, soon.id);
    }

    #[test]
    fn test_missing_topic_is_an_empty_deck() {
        let mut store = store();
        assert!(store.cards("never-seen").is_empty());
    }

    #[test]
    fn test_corrupt_record_degrades_to_empty_deck() {
        let mut backend = MemoryKeyValueStore::new();
        backend.write("rust", "{ not json").unwrap();
        let mut store = CardStore::new(backend);

        assert!(store.cards("rust").is_empty());
        assert_eq!(store.config("rust"), SchedulerConfig::default());
    }

    #[test]
    fn test_capacity_exceeded_rolls_back() {
        let backend = MemoryKeyValueStore::with_capacity_limit(800);
        let mut store = CardStore::new(backend);

        store
            .put("rust", Flashcard::new("Q?".into(), "First answer.".into()))
            .unwrap();
        let before = store.cards("rust").to_vec();

        let big = Flashcard::new("Big?".into(), "x".repeat(2000));
        let err = store.put("rust", big).unwrap_err();

        assert!(matches!(err, StoreError::CapacityExceeded(_)));
        assert_eq!(store.cards("rust"), before.as_slice());
    }

    #[test]
    fn test_record_review_updates_counters_and_confidence() {
        let mut store = store();
        let now = Utc::now();
        let card = store
            .put("rust", Flashcard::new("Q?".into(), "A long enough answer.".into()))
            .unwrap();

        let reviewed = store.record_review("rust", card.id, 4, now).unwrap();
        assert_eq!(reviewed.review_count, 1);
        assert_eq!(reviewed.correct_count, 1);
        assert_eq!(reviewed.confidence, 1);
        assert_eq!(reviewed.last_reviewed_at, Some(now));

        let lapsed = store.record_review("rust", card.id, 1, now).unwrap();
        assert_eq!(lapsed.review_count, 2);
        assert_eq!(lapsed.correct_count, 1);
        assert_eq!(lapsed.confidence, 0);
    }

    #[test]
    fn test_confidence_stays_clamped() {
        let mut store = store();
        let now = Utc::now();
        let card = store
            .put("rust", Flashcard::new("Q?".into(), "A long enough answer.".into()))
            .unwrap();

        for _ in 0..8 {
            store.record_review("rust", card.id, 5, now).unwrap();
        }
        assert_eq!(store.get("rust", card.id).unwrap().confidence, 5);

        for _ in 0..8 {
            store.record_review("rust", card.id, 1, now).unwrap();
        }
        assert_eq!(store.get("rust", card.id).unwrap().confidence, 0);
    }

    #[test]
    fn test_review_of_missing_card() {
        let mut store = store();
        let err = store
            .record_review("rust", Uuid::new_v4(), 4, Utc::now())
            .unwrap_err();
        assert!(matches!(err, StoreError::CardNotFound(_)));
    }

    #[test]
    fn test_accept_candidates_dedupes() {
        let mut store = store();

        let accepted = store
            .accept_candidates(
                "rust",
                vec![
                    candidate("What is a closure?", "A function plus captured scope."),
                    candidate("what is a CLOSURE", "Same question, different casing."),
                    candidate("What is borrowing?", "Taking a reference without ownership."),
                ],
            )
            .unwrap();

        assert_eq!(accepted.len(), 2);
        assert_eq!(store.cards("rust").len(), 2);
    }

    #[test]
    fn test_accept_candidates_skips_existing_questions() {
        let mut store = store();
        store
            .put(
                "rust",
                Flashcard::new("What is a closure?".into(), "Existing answer text.".into()),
            )
            .unwrap();

        let accepted = store
            .accept_candidates(
                "rust",
                vec![candidate("What is a closure?!", "Different answer, same question.")],
            )
            .unwrap();

        assert!(accepted.is_empty());
        assert_eq!(store.cards("rust").len(), 1);
    }

    #[test]
    fn test_accept_candidates_filters_invalid() {
        let mut store = store();
        let accepted = store
            .accept_candidates("rust", vec![candidate("Q?", "too short")])
            .unwrap();
        assert!(accepted.is_empty());
    }

    #[test]
    fn test_export_import_roundtrip_skips_duplicates() {
        let mut source = store();
        let now = Utc::now();
        source
            .accept_candidates(
                "rust",
                vec![
                    candidate("What is a closure?", "A function plus captured scope."),
                    candidate("What is borrowing?", "Taking a reference without ownership."),
                ],
            )
            .unwrap();

        let export = source.export_topic("rust", now);
        assert_eq!(export.format_version, EXPORT_FORMAT_VERSION);
        assert_eq!(export.cards.len(), 2);

        // Importing into a store that already has one of the questions
        let mut other = store();
        other
            .put(
                "rust",
                Flashcard::new("What is a closure?".into(), "Already here, kept as is.".into()),
            )
            .unwrap();

        let imported = other.import_topic(export).unwrap();
        assert_eq!(imported, 1);
        assert_eq!(other.cards("rust").len(), 2);
    }

    #[test]
    fn test_import_rejects_newer_format() {
        let mut store = store();
        let export = TopicExport {
            topic_id: "rust".into(),
            cards: Vec::new(),
            exported_at: Utc::now(),
            format_version: EXPORT_FORMAT_VERSION + 1,
        };
        assert!(matches!(
            store.import_topic(export),
            Err(StoreError::UnsupportedFormatVersion(_))
        ));
    }

    #[test]
    fn test_import_clamps_invariants() {
        let mut store = store();
        let mut card = Flashcard::new("Q?".into(), "A long enough answer.".into());
        card.confidence = 42;
        card.easiness_factor = 0.1;

        store
            .import_topic(TopicExport {
                topic_id: "rust".into(),
                cards: vec![card],
                exported_at: Utc::now(),
                format_version: EXPORT_FORMAT_VERSION,
            })
            .unwrap();

        let stored = &store.cards("rust")[0];
        assert_eq!(stored.confidence, 5);
        assert_eq!(stored.easiness_factor, 1.3);
    }

    #[test]
    fn test_config_roundtrip_and_defaults() {
        let mut store = store();
        assert_eq!(store.config("rust"), SchedulerConfig::default());

        let custom = SchedulerConfig {
            learning_steps: vec![5, 30, 720],
            graduating_interval_days: 4.0,
            ..SchedulerConfig::default()
        };
        store.set_config("rust", custom.clone()).unwrap();
        assert_eq!(store.config("rust"), custom);
    }

    #[test]
    fn test_stats() {
        let mut store = store();
        let now = Utc::now();
        let card = store
            .put("rust", Flashcard::new("Q?".into(), "A long enough answer.".into()))
            .unwrap();
        store
            .put("rust", Flashcard::new("R?".into(), "Another valid answer.".into()))
            .unwrap();
        store.record_review("rust", card.id, 4, now).unwrap();

        let stats = store.stats("rust", now);
        assert_eq!(stats.total_cards, 2);
        assert_eq!(stats.new_cards, 1);
        assert_eq!(stats.learning_cards, 1);
        assert_eq!(stats.total_reviews, 1);
        assert_eq!(stats.total_correct, 1);
    }

    #[test]
    fn test_topics_lists_backend_keys() {
        let mut store = store();
        store
            .put("rust", Flashcard::new("Q?".into(), "A long enough answer.".into()))
            .unwrap();
        store
            .put("calculus", Flashcard::new("R?".into(), "Another valid answer.".into()))
            .unwrap();

        assert_eq!(store.topics().unwrap(), vec!["calculus", "rust"]);
    }
}
