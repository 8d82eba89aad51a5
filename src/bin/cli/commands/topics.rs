use anyhow::Result;
use chrono::Utc;

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &mut App, format: &OutputFormat) -> Result<()> {
    let topics = app.store.topics()?;
    if topics.is_empty() {
        println!("No topics yet. Use 'extract' or 'add' to create cards.");
        return Ok(());
    }

    let now = Utc::now();
    match format {
        OutputFormat::Json => {
            let mut output = Vec::new();
            for topic in &topics {
                let stats = app.store.stats(topic, now);
                output.push(serde_json::json!({
                    "topicId": topic,
                    "stats": stats,
                }));
            }
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            for topic in &topics {
                let stats = app.store.stats(topic, now);
                println!(
                    "{}: {} cards ({} new, {} learning, {} graduated, {} due)",
                    topic,
                    stats.total_cards,
                    stats.new_cards,
                    stats.learning_cards,
                    stats.graduated_cards,
                    stats.due_cards
                );
            }
        }
    }
    Ok(())
}
