use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;

use mneme::flashcards::TopicExport;

use crate::app::App;

pub fn export(app: &mut App, topic: &str, file: &Path) -> Result<()> {
    let export = app.store.export_topic(topic, Utc::now());
    if export.cards.is_empty() {
        bail!("Topic '{}' has no cards to export", topic);
    }

    fs::write(file, serde_json::to_string_pretty(&export)?)
        .with_context(|| format!("Failed to write {}", file.display()))?;
    println!(
        "Exported {} card(s) from '{}' to {}",
        export.cards.len(),
        topic,
        file.display()
    );
    Ok(())
}

pub fn import(app: &mut App, file: &Path) -> Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let export: TopicExport =
        serde_json::from_str(&content).context("Not a valid topic export")?;

    let topic = export.topic_id.clone();
    let total = export.cards.len();
    let imported = app.store.import_topic(export)?;

    println!(
        "Imported {} of {} card(s) into '{}' ({} duplicate(s) skipped)",
        imported,
        total,
        topic,
        total - imported
    );
    Ok(())
}
