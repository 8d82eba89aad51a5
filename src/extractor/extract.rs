//! The four extraction passes: heading blocks, inline bold definitions,
//! bold-led list items, and fenced code blocks. Each pass produces
//! candidates independently; the results are merged, validity-filtered,
//! and deduplicated by normalized question.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;

use crate::flashcards::CardOrigin;

use super::filter::{is_valid, normalize_question};
use super::models::{CandidateCard, ExtractorOptions};
use super::patterns;
use super::segment::{segment, Segment};

/// How many source lines above a code block are searched for context.
const CODE_LOOKBACK_LINES: usize = 15;

/// A context prose line must be longer than this to be worth mining.
const MIN_CONTEXT_LINE_LEN: usize = 15;

/// Mine candidate cards out of structured prose.
///
/// Deterministic for a fixed rng seed; the rng only drives template
/// variety. Candidates are already validity-filtered and deduplicated.
pub fn extract(
    source: &str,
    options: &ExtractorOptions,
    rng: &mut impl Rng,
) -> Vec<CandidateCard> {
    let segments = segment(source);
    let lines: Vec<&str> = source.lines().collect();

    let mut candidates = Vec::new();
    candidates.extend(heading_blocks(&segments, options, rng));
    candidates.extend(bold_definitions(&segments, options));
    candidates.extend(list_items(&segments));
    candidates.extend(code_blocks(&segments, &lines, options));

    let valid = candidates
        .into_iter()
        .filter(|candidate| is_valid(candidate, options))
        .collect();
    dedupe(valid)
}

/// [`extract`] with a fresh rng seeded from `seed`.
pub fn extract_with_seed(
    source: &str,
    options: &ExtractorOptions,
    seed: u64,
) -> Vec<CandidateCard> {
    let mut rng = StdRng::seed_from_u64(seed);
    extract(source, options, &mut rng)
}

/// Pass 1: level-2/3 headings with their immediately following prose.
fn heading_blocks(
    segments: &[Segment],
    options: &ExtractorOptions,
    rng: &mut impl Rng,
) -> Vec<CandidateCard> {
    let mut candidates = Vec::new();

    for (index, seg) in segments.iter().enumerate() {
        let Segment::Heading { level, text, .. } = seg else {
            continue;
        };
        if *level != 2 && *level != 3 {
            continue;
        }
        if patterns::is_structural_heading(text) {
            continue;
        }

        // Prose is the run of paragraphs directly under the heading
        let mut paragraphs = Vec::new();
        for following in &segments[index + 1..] {
            match following {
                Segment::Paragraph { raw, .. } => paragraphs.push(raw.as_str()),
                _ => break,
            }
        }
        let Some(first) = paragraphs.first() else {
            continue;
        };

        let answer = if first.len() >= options.min_answer_len
            && first.len() <= options.max_answer_len
        {
            first.to_string()
        } else if first.len() < options.min_answer_len {
            // First paragraph too short on its own; fold in the rest
            let mut accumulated = String::new();
            for paragraph in &paragraphs {
                if !accumulated.is_empty() {
                    if accumulated.len() + 2 + paragraph.len() > options.max_answer_len {
                        break;
                    }
                    accumulated.push_str("\n\n");
                }
                accumulated.push_str(paragraph);
            }
            accumulated
        } else {
            // Oversized first paragraph; left for the validity filter
            first.to_string()
        };

        candidates.push(CandidateCard::new(
            patterns::heading_question(text, rng),
            answer,
            CardOrigin::HeuristicHeading,
        ));
    }

    candidates
}

/// Pass 2: inline `**Term**: explanation` runs.
fn bold_definitions(segments: &[Segment], options: &ExtractorOptions) -> Vec<CandidateCard> {
    let definition = Regex::new(r"^\*\*([^*]+?)\*\*\s*[:：]\s*(.+)$").unwrap();
    let mut candidates = Vec::new();

    for seg in segments {
        let Segment::Paragraph { raw, .. } = seg else {
            continue;
        };
        for line in raw.lines() {
            let Some(captures) = definition.captures(line.trim()) else {
                continue;
            };
            let term = captures[1].trim().to_string();
            let explanation = captures[2].trim().to_string();
            if explanation.len() < options.min_answer_len {
                continue;
            }
            candidates.push(CandidateCard::new(
                format!("What is {}?", term),
                explanation,
                CardOrigin::HeuristicDefinition,
            ));
        }
    }

    candidates
}

/// Pass 3: bold-led list items under their nearest heading context.
fn list_items(segments: &[Segment]) -> Vec<CandidateCard> {
    let marker = Regex::new(r"^(?:[-*+]|\d+[.)])\s+").unwrap();
    let bold_led = Regex::new(r"(?s)^\*\*([^*]+?)\*\*\s*(?:[-–—:]\s*)?(.*)$").unwrap();

    let mut candidates = Vec::new();
    let mut context_heading: Option<&str> = None;

    for seg in segments {
        match seg {
            Segment::Heading { text, .. } => context_heading = Some(text),
            Segment::ListItem { raw, .. } => {
                let body = marker.replace(raw.trim(), "");
                let Some(captures) = bold_led.captures(&body) else {
                    continue;
                };
                let term = captures[1].trim().to_string();
                let rest = captures[2].trim().to_string();
                if term.is_empty() || rest.is_empty() {
                    continue;
                }

                let context = patterns::list_context(context_heading);
                candidates.push(CandidateCard::new(
                    patterns::list_item_question(context, &term),
                    rest,
                    CardOrigin::HeuristicList,
                ));
            }
            _ => {}
        }
    }

    candidates
}

/// Pass 4: fenced code blocks, questioned from nearby context lines.
fn code_blocks(
    segments: &[Segment],
    lines: &[&str],
    options: &ExtractorOptions,
) -> Vec<CandidateCard> {
    let heading_line = Regex::new(r"^#{1,6}\s+(.+)$").unwrap();
    let mut candidates = Vec::new();

    for seg in segments {
        let Segment::CodeBlock {
            body,
            language,
            line,
        } = seg
        else {
            continue;
        };
        if body.len() < options.min_code_len || body.len() > options.max_code_len {
            continue;
        }

        let Some(question) = code_question(lines, *line, &heading_line) else {
            continue;
        };

        let answer = if language.is_empty() {
            format!("```\n{}\n```", body)
        } else {
            format!("```{}\n{}\n```", language, body)
        };
        candidates.push(CandidateCard::new(
            question,
            answer,
            CardOrigin::HeuristicCode,
        ));
    }

    candidates
}

/// Derive a code block's question from up to [`CODE_LOOKBACK_LINES`]
/// preceding source lines: the nearest heading wins; otherwise the nearest
/// prose line is mined for an action phrase.
fn code_question(lines: &[&str], fence_line: usize, heading_line: &Regex) -> Option<String> {
    let window_start = fence_line.saturating_sub(CODE_LOOKBACK_LINES);
    let mut nearest_prose: Option<&str> = None;

    for index in (window_start..fence_line.min(lines.len())).rev() {
        let line = lines[index].trim();
        if line.is_empty() || line.starts_with("```") {
            continue;
        }

        if let Some(captures) = heading_line.captures(line) {
            let heading = captures[1].trim();
            if patterns::is_antipattern_heading(heading) {
                return Some("What problem does this code demonstrate?".to_string());
            }
            if patterns::is_question(heading) {
                return Some(heading.to_string());
            }
            return Some(format!("How do you implement {}?", heading));
        }

        if nearest_prose.is_none() && line.len() > MIN_CONTEXT_LINE_LEN {
            nearest_prose = Some(line);
        }
    }

    let phrase = patterns::action_phrase(nearest_prose?)?;
    Some(format!("How do you {}?", phrase))
}

/// Keep the first occurrence per normalized question.
fn dedupe(candidates: Vec<CandidateCard>) -> Vec<CandidateCard> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| seen.insert(normalize_question(&candidate.question)))
        .collect()
}
