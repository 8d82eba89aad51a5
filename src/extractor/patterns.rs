//! Heuristic pattern tables for question derivation.
//!
//! Rules live here as ordered data consumed by single matching functions,
//! so each table can be tested and extended independently of the
//! extraction passes.

use rand::Rng;
use regex::Regex;

/// Priority-ordered trigger phrases for heading-derived questions. The
/// first rule whose trigger appears in the stripped heading wins; `{}` is
/// replaced by the heading with the trigger removed.
pub struct TriggerRule {
    pub triggers: &'static [&'static str],
    pub template: &'static str,
}

pub const TRIGGER_RULES: &[TriggerRule] = &[
    TriggerRule {
        triggers: &["pitfalls", "gotchas", "mistakes", "problems"],
        template: "What problems should you avoid with {}?",
    },
    TriggerRule {
        triggers: &["benefits", "advantages"],
        template: "Why is {} important?",
    },
    TriggerRule {
        triggers: &["best practices", "guidelines", "tips"],
        template: "What are the best practices for {}?",
    },
    TriggerRule {
        triggers: &["types of", "kinds of", "types", "kinds", "variants"],
        template: "What are the types of {}?",
    },
    TriggerRule {
        triggers: &["examples of", "examples", "use cases"],
        template: "Can you give examples of {}?",
    },
    TriggerRule {
        triggers: &["features", "capabilities"],
        template: "What are the key features of {}?",
    },
    TriggerRule {
        triggers: &["how to", "steps for", "steps to", "steps"],
        template: "How do you {}?",
    },
];

/// Generic lead-ins stripped from headings before trigger matching,
/// longest first so compound phrases win over their prefixes.
pub const LEAD_INS: &[&str] = &[
    "getting started with",
    "introduction to",
    "a guide to",
    "working with",
    "overview of",
    "understanding",
    "intro to",
    "guide to",
    "learning",
    "common",
    "about",
    "basic",
    "the",
    "an",
    "a",
];

/// Headings naming structural sections; never turned into cards.
pub const STRUCTURAL_HEADINGS: &[&str] = &[
    "table of contents",
    "contents",
    "toc",
    "summary",
    "overview",
    "navigation",
    "references",
    "index",
    "see also",
    "further reading",
    "resources",
    "links",
];

/// Markers flagging a code block's heading as showing an anti-pattern.
pub const ANTIPATTERN_MARKERS: &[&str] = &[
    "wrong",
    "incorrect",
    "mistake",
    "anti-pattern",
    "antipattern",
    "bad example",
    "don't",
    "do not",
    "avoid",
];

/// Leading verbs that let a prose line become a "How do you ...?" question.
pub const ACTION_VERBS: &[&str] = &[
    "create", "build", "implement", "add", "use", "configure", "install", "run", "write",
    "define", "set", "handle", "parse", "convert", "connect", "test", "deploy", "render",
    "fetch", "update", "delete", "sort", "filter", "validate", "initialize", "register",
    "declare", "iterate", "spawn", "read",
];

const QUESTION_WORDS: &[&str] = &[
    "what", "why", "how", "when", "where", "which", "who", "whose", "does", "do", "is",
    "are", "can", "should", "will",
];

/// Trailing filler removed from mined "how do you" phrases.
const PHRASE_SUFFIX_FILLER: &[&str] = &["like this", "as follows", "like so", "below"];

/// Whether text is already phrased as a question.
pub fn is_question(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.ends_with('?') {
        return true;
    }
    let first = trimmed
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_lowercase();
    QUESTION_WORDS.contains(&first.as_str())
}

/// Derive a question from a heading, in priority order: kept verbatim if
/// already a question, comparison template for versus-style headings,
/// trigger table on the lead-in-stripped residue, then a plural-aware
/// "What is/are X?" fallback.
pub fn heading_question(text: &str, rng: &mut impl Rng) -> String {
    let trimmed = text.trim();

    if is_question(trimmed) {
        return trimmed.to_string();
    }

    if let Some((left, right)) = split_comparison(trimmed) {
        return comparison_question(&left, &right, rng);
    }

    let stripped = strip_lead_ins(trimmed);
    if let Some(question) = match_trigger(&stripped) {
        return question;
    }

    if is_plural(&stripped) {
        format!("What are {}?", stripped)
    } else {
        format!("What is {}?", stripped)
    }
}

/// Split a versus-style heading into its two sides.
pub fn split_comparison(text: &str) -> Option<(String, String)> {
    let splitter = Regex::new(r"(?i)\s+(?:vs\.?|versus)\s+").unwrap();
    let mut parts = splitter.splitn(text, 2);
    let left = parts.next()?.trim();
    let right = parts.next()?.trim().trim_end_matches(':').trim();
    if left.is_empty() || right.is_empty() {
        return None;
    }
    Some((left.to_string(), right.to_string()))
}

/// One of three comparison phrasings, picked by the injected rng so
/// repeated extraction with the same seed stays deterministic.
pub fn comparison_question(left: &str, right: &str, rng: &mut impl Rng) -> String {
    match rng.gen_range(0..3u32) {
        0 => format!("What is the difference between {} and {}?", left, right),
        1 => format!("How does {} differ from {}?", left, right),
        _ => format!("When should you choose {} over {}?", left, right),
    }
}

/// Strip generic lead-in verbs/articles from the front of a heading.
pub fn strip_lead_ins(text: &str) -> String {
    let mut rest = text.trim();
    'outer: loop {
        let lower = rest.to_lowercase();
        for lead_in in LEAD_INS {
            if lower == *lead_in {
                break 'outer;
            }
            if lower.starts_with(lead_in)
                && lower[lead_in.len()..].starts_with(char::is_whitespace)
            {
                rest = rest[lead_in.len()..].trim_start();
                continue 'outer;
            }
        }
        break;
    }
    rest.to_string()
}

/// Match a stripped heading against the trigger table, rendering the first
/// matching template around the heading minus the trigger phrase.
pub fn match_trigger(phrase: &str) -> Option<String> {
    let lower = phrase.to_lowercase();
    // Offsets below index into the original phrase; lowercasing can change
    // byte lengths, so only ASCII phrases are spliced by position
    if !phrase.is_ascii() {
        return None;
    }
    for rule in TRIGGER_RULES {
        for trigger in rule.triggers {
            if let Some(position) = lower.find(trigger) {
                let mut topic = String::new();
                topic.push_str(phrase[..position].trim());
                let after = phrase[position + trigger.len()..].trim();
                if !topic.is_empty() && !after.is_empty() {
                    topic.push(' ');
                }
                topic.push_str(after);
                let mut topic = topic
                    .trim_matches(|c: char| c.is_whitespace() || c == ':' || c == '-')
                    .to_string();
                // "Benefits of Ownership" leaves "of Ownership" behind
                for connective in ["of ", "for ", "in ", "with "] {
                    if topic.to_lowercase().starts_with(connective) {
                        topic = topic[connective.len()..].trim_start().to_string();
                        break;
                    }
                }
                if topic.is_empty() {
                    // A bare trigger heading carries no subject to ask about
                    continue;
                }
                return Some(rule.template.replace("{}", &topic));
            }
        }
    }
    None
}

/// Trailing "s" not preceded by "ss"/"us"/"is" reads as a plural.
pub fn is_plural(phrase: &str) -> bool {
    let last = match phrase.split_whitespace().last() {
        Some(word) => word.to_lowercase(),
        None => return false,
    };
    last.len() > 2
        && last.ends_with('s')
        && !last.ends_with("ss")
        && !last.ends_with("us")
        && !last.ends_with("is")
}

pub fn is_structural_heading(text: &str) -> bool {
    let normalized = text.trim().to_lowercase();
    STRUCTURAL_HEADINGS.contains(&normalized.as_str())
}

pub fn is_antipattern_heading(text: &str) -> bool {
    let lower = text.to_lowercase();
    ANTIPATTERN_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}

/// Heading context recognized for list-item questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListContext {
    Benefits,
    Types,
    Examples,
    Pitfalls,
    Features,
    Steps,
    Generic,
}

/// Classify the nearest heading above a list.
pub fn list_context(heading: Option<&str>) -> ListContext {
    let lower = match heading {
        Some(text) => text.to_lowercase(),
        None => return ListContext::Generic,
    };

    if lower.contains("pitfall")
        || lower.contains("problem")
        || lower.contains("mistake")
        || lower.contains("gotcha")
        || lower.contains("drawback")
    {
        ListContext::Pitfalls
    } else if lower.contains("benefit") || lower.contains("advantage") {
        ListContext::Benefits
    } else if lower.contains("type") || lower.contains("kind") || lower.contains("categor") {
        ListContext::Types
    } else if lower.contains("example") || lower.contains("use case") {
        ListContext::Examples
    } else if lower.contains("feature") || lower.contains("capabilit") {
        ListContext::Features
    } else if lower.contains("step") || lower.contains("process") || lower.contains("workflow") {
        ListContext::Steps
    } else {
        ListContext::Generic
    }
}

/// Render the question for a bold-led list item term in context.
pub fn list_item_question(context: ListContext, term: &str) -> String {
    let term = display_term(term);
    match context {
        ListContext::Pitfalls => format!("What problem is {}?", term),
        ListContext::Benefits => format!("What is the benefit of {}?", term),
        ListContext::Types => format!("What is the {} type?", term),
        ListContext::Examples => format!("What does the {} example show?", term),
        ListContext::Features => format!("What does the {} feature do?", term),
        ListContext::Steps => format!("What happens in the {} step?", term),
        ListContext::Generic => format!("What is {}?", term),
    }
}

/// Lowercase a term for in-sentence use, leaving acronyms alone.
fn display_term(term: &str) -> String {
    let trimmed = term.trim();
    let is_acronym = trimmed.len() <= 6
        && trimmed
            .chars()
            .all(|c| c.is_ascii_uppercase() || !c.is_alphabetic());
    if is_acronym {
        trimmed.to_string()
    } else {
        trimmed.to_lowercase()
    }
}

/// Mine a prose line near a code block for a "How do you ...?" phrase:
/// either a "to/for <phrase>" run or a leading action verb.
pub fn action_phrase(line: &str) -> Option<String> {
    let cleaned = line.trim().trim_matches('*').trim();

    let to_for = Regex::new(r"(?i)\b(?:to|for)\s+([a-z][^.,;:!?]{3,80})").unwrap();
    if let Some(captures) = to_for.captures(cleaned) {
        if let Some(matched) = captures.get(1) {
            return Some(tidy_phrase(matched.as_str()));
        }
    }

    let first = cleaned.split_whitespace().next()?.to_lowercase();
    if ACTION_VERBS.contains(&first.as_str()) {
        let mut phrase = tidy_phrase(cleaned);
        if let Some(rest) = phrase.get(..1) {
            phrase = format!("{}{}", rest.to_lowercase(), &phrase[1..]);
        }
        return Some(phrase);
    }

    None
}

fn tidy_phrase(phrase: &str) -> String {
    let mut tidy = phrase
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
        .to_string();
    loop {
        let lower = tidy.to_lowercase();
        let mut changed = false;
        for filler in PHRASE_SUFFIX_FILLER {
            if lower.ends_with(filler) {
                tidy.truncate(tidy.len() - filler.len());
                tidy = tidy.trim_end().to_string();
                changed = true;
                break;
            }
        }
        if !changed {
            break;
        }
    }
    tidy
}
