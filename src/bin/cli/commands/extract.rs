use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use walkdir::WalkDir;

use mneme::extractor::{self, ExtractorOptions};

use crate::app::App;
use crate::OutputFormat;

pub fn run(
    app: &mut App,
    path: &Path,
    topic: &str,
    seed: Option<u64>,
    dry_run: bool,
    format: &OutputFormat,
) -> Result<()> {
    let sources = collect_sources(path)?;
    if sources.is_empty() {
        bail!("No markdown files found under {}", path.display());
    }

    let seed = seed.unwrap_or_else(|| rand::thread_rng().next_u64());
    let mut rng = StdRng::seed_from_u64(seed);
    let options = ExtractorOptions::default();

    let mut candidates = Vec::new();
    for source in &sources {
        let text = fs::read_to_string(source)
            .with_context(|| format!("Failed to read {}", source.display()))?;
        candidates.extend(extractor::extract(&text, &options, &mut rng));
    }
    let found = candidates.len();

    if dry_run {
        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&candidates)?);
            }
            OutputFormat::Plain => {
                for candidate in &candidates {
                    println!("Q: {}", candidate.question);
                    println!("A: {}\n", preview(&candidate.answer));
                }
                println!(
                    "{} candidates from {} file(s) (seed {})",
                    found,
                    sources.len(),
                    seed
                );
            }
        }
        return Ok(());
    }

    let accepted = app
        .store
        .accept_candidates_with(topic, candidates, &options)?;
    println!(
        "Accepted {} of {} candidates into '{}' ({} duplicate or invalid)",
        accepted.len(),
        found,
        topic,
        found - accepted.len()
    );
    Ok(())
}

/// A single file, or every markdown file under a directory.
fn collect_sources(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        bail!("{} is neither a file nor a directory", path.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
        let entry_path = entry.path();
        if entry_path
            .extension()
            .map_or(false, |ext| ext == "md" || ext == "markdown")
        {
            files.push(entry_path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn preview(answer: &str) -> String {
    let flat = answer.replace('\n', " ");
    match flat.char_indices().nth(120) {
        Some((offset, _)) => format!("{}…", &flat[..offset]),
        None => flat,
    }
}
