//! Candidate validity filtering and question normalization.
//!
//! Applied to every candidate before it surfaces, whatever produced it:
//! the extraction passes, manual entry through the store, or an external
//! generator. Rejections are extraction skips, logged at debug level and
//! never surfaced as errors.

use super::models::{CandidateCard, ExtractorOptions};

/// Navigation phrases that never make real questions or answers.
const BOILERPLATE_PHRASES: &[&str] = &[
    "tableofcontents",
    "contents",
    "toc",
    "navigation",
    "backtotop",
    "home",
    "previous",
    "next",
    "references",
    "index",
    "seealso",
];

/// Key under which duplicate questions collide: lowercased, all
/// non-alphanumeric characters stripped.
pub fn normalize_question(question: &str) -> String {
    question
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Whether a candidate passes the validity filter.
pub fn is_valid(candidate: &CandidateCard, options: &ExtractorOptions) -> bool {
    let question = candidate.question.trim();
    let answer = candidate.answer.trim();

    if question.len() < options.min_question_len || question.len() > options.max_question_len {
        log::debug!("skipping candidate: question length {}", question.len());
        return false;
    }
    if answer.len() < options.min_answer_len || answer.len() > options.max_answer_len {
        log::debug!("skipping candidate: answer length {}", answer.len());
        return false;
    }
    if is_boilerplate(question) || is_boilerplate(answer) {
        log::debug!("skipping candidate: structural boilerplate");
        return false;
    }
    if is_mostly_list_markup(answer) {
        log::debug!("skipping candidate: answer is list markup");
        return false;
    }

    true
}

/// Structural boilerplate: pure navigation phrases, dangling fence
/// markers, bare heading or list markers.
fn is_boilerplate(text: &str) -> bool {
    let trimmed = text.trim();

    if BOILERPLATE_PHRASES.contains(&normalize_question(trimmed).as_str()) {
        return true;
    }

    // A dangling/unbalanced fence cuts an answer mid-code
    let fence_count = trimmed
        .lines()
        .filter(|line| line.trim_start().starts_with("```"))
        .count();
    if fence_count % 2 != 0 {
        return true;
    }

    // Bare markers with no content behind them
    let marker_stripped = trimmed
        .trim_start_matches(['#', '-', '*', '+', '>', '.', ')', ' '])
        .trim();
    if marker_stripped.is_empty() {
        return true;
    }
    if trimmed
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit())
        && trimmed
            .trim_start_matches(|c: char| c.is_ascii_digit())
            .trim_start_matches(['.', ')', ' '])
            .is_empty()
    {
        return true;
    }

    false
}

/// Answers that are almost entirely list markup are indexes, not prose:
/// reject when more than 80% of non-blank lines are list items.
fn is_mostly_list_markup(text: &str) -> bool {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        return true;
    }

    let list_lines = lines.iter().filter(|line| is_list_line(line)).count();
    (list_lines as f32 / lines.len() as f32) > 0.8
}

fn is_list_line(line: &str) -> bool {
    if line.starts_with("- ") || line.starts_with("* ") || line.starts_with("+ ") {
        return true;
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return false;
    }
    line[digits..].starts_with(". ") || line[digits..].starts_with(") ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flashcards::CardOrigin;

    fn candidate(question: &str, answer: &str) -> CandidateCard {
        CandidateCard::new(
            question.to_string(),
            answer.to_string(),
            CardOrigin::HeuristicHeading,
        )
    }

    #[test]
    fn test_normalize_question() {
        assert_eq!(
            normalize_question("What is a *closure*?"),
            "whatisaclosure"
        );
        assert_eq!(
            normalize_question("WHAT IS A CLOSURE"),
            normalize_question("what, is a closure?!")
        );
    }

    #[test]
    fn test_length_windows() {
        let options = ExtractorOptions::default();
        assert!(is_valid(
            &candidate("What is a closure?", "A function bundled with its scope."),
            &options
        ));
        assert!(!is_valid(&candidate("Q?", "A sufficiently long answer text."), &options));
        assert!(!is_valid(&candidate("What is a closure?", "too short"), &options));
        assert!(!is_valid(
            &candidate("What is a closure?", &"x".repeat(1501)),
            &options
        ));
    }

    #[test]
    fn test_rejects_navigation_boilerplate() {
        let options = ExtractorOptions::default();
        assert!(!is_valid(
            &candidate("Table of Contents", "A function bundled with its scope."),
            &options
        ));
    }

    #[test]
    fn test_rejects_unbalanced_fences() {
        let options = ExtractorOptions::default();
        assert!(!is_valid(
            &candidate(
                "What is a closure?",
                "```rust\nfn main() {} // fence never closes"
            ),
            &options
        ));
        assert!(is_valid(
            &candidate(
                "What is a closure?",
                "```rust\nlet add = |a, b| a + b;\n```"
            ),
            &options
        ));
    }

    #[test]
    fn test_rejects_bare_markers() {
        let options = ExtractorOptions::default();
        assert!(!is_valid(
            &candidate("#####", "A function bundled with its scope."),
            &options
        ));
    }

    #[test]
    fn test_rejects_mostly_list_answers() {
        let options = ExtractorOptions::default();
        assert!(!is_valid(
            &candidate(
                "What is a closure?",
                "- first\n- second\n- third\n- fourth\n- fifth"
            ),
            &options
        ));
        // Half prose is fine
        assert!(is_valid(
            &candidate(
                "What is a closure?",
                "Closures capture scope.\n- by reference\nThey may also move values.\n- by value"
            ),
            &options
        ));
    }
}
