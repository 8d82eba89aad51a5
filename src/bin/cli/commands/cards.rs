use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use mneme::flashcards::{algorithm, CardOrigin, DifficultyHint, Flashcard};

use crate::app::App;
use crate::{HintArg, OutputFormat};

pub fn add(
    app: &mut App,
    topic: &str,
    question: String,
    answer: String,
    hint: Option<HintArg>,
) -> Result<()> {
    let mut card = Flashcard::new(question, answer);
    card.origin = CardOrigin::Manual;
    card.difficulty_hint = hint.map(|h| match h {
        HintArg::Easy => DifficultyHint::Easy,
        HintArg::Medium => DifficultyHint::Medium,
        HintArg::Hard => DifficultyHint::Hard,
    });

    let card = app.store.put(topic, card)?;
    println!("Added card {} to '{}'", card.id, topic);
    Ok(())
}

pub fn list(app: &mut App, topic: &str, due_only: bool, format: &OutputFormat) -> Result<()> {
    let now = Utc::now();
    let cards = if due_only {
        app.store.due_cards(topic, now)
    } else {
        app.store.cards(topic).to_vec()
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&cards)?);
        }
        OutputFormat::Plain => {
            if cards.is_empty() {
                println!("No cards found.");
                return Ok(());
            }

            println!(
                "{:<36} {:>6} {:>5} {:>5}  {}",
                "ID", "DUE", "CONF", "REPS", "QUESTION"
            );
            for card in &cards {
                let days_until =
                    (card.next_review_at - now).num_minutes() as f32 / 1440.0;
                let due = if days_until <= 0.0 {
                    "due".to_string()
                } else {
                    algorithm::format_interval(days_until)
                };
                println!(
                    "{:<36} {:>6} {:>5} {:>5}  {}",
                    card.id,
                    due,
                    card.confidence,
                    card.repetitions,
                    truncate(&card.question, 60)
                );
            }
        }
    }
    Ok(())
}

pub fn delete(app: &mut App, topic: &str, id: Uuid) -> Result<()> {
    if app.store.delete(topic, id)? {
        println!("Deleted card {}", id);
    } else {
        println!("No card {} in '{}'", id, topic);
    }
    Ok(())
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((offset, _)) => format!("{}…", &text[..offset]),
        None => text.to_string(),
    }
}
