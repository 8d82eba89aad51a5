use anyhow::{Context, Result};

use crate::app::App;
use crate::OutputFormat;

pub fn run(
    app: &mut App,
    topic: &str,
    steps: Option<&str>,
    graduating_days: Option<f32>,
    max_days: Option<f32>,
    format: &OutputFormat,
) -> Result<()> {
    let mut config = app.store.config(topic);
    let mut changed = false;

    if let Some(steps) = steps {
        let parsed: Result<Vec<i64>, _> = steps
            .split(',')
            .map(|step| step.trim().parse::<i64>())
            .collect();
        config.learning_steps =
            parsed.context("--steps expects comma-separated minutes, e.g. 10,1440")?;
        changed = true;
    }
    if let Some(days) = graduating_days {
        config.graduating_interval_days = days;
        changed = true;
    }
    if let Some(days) = max_days {
        config.max_interval_days = days;
        changed = true;
    }

    if changed {
        app.store.set_config(topic, config.clone())?;
        println!("Updated scheduler settings for '{}'. Changes apply to future reviews only.", topic);
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        OutputFormat::Plain => {
            let steps: Vec<String> = config
                .learning_steps
                .iter()
                .map(|minutes| minutes.to_string())
                .collect();
            println!("learning steps:      {} min", steps.join(", "));
            println!("graduating interval: {} days", config.graduating_interval_days);
            println!("easy interval:       {} days", config.easy_interval_days);
            println!("max interval:        {} days", config.max_interval_days);
            println!("new card interval:   {} days", config.new_card_interval_days);
        }
    }
    Ok(())
}
