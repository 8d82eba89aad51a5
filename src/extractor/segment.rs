//! Markdown segmentation for the extractor.
//!
//! Parses source text into a flat stream of [`Segment`]s, each anchored to
//! its source line and carrying the raw source slice. The heuristics in
//! `extract` work on this stream instead of re-scanning markdown syntax;
//! raw slices keep inline formatting (bold runs, embedded code) intact for
//! answers.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// One block-level element of the source document, in document order.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Heading {
        level: u32,
        /// Inline text with markup stripped.
        text: String,
        line: usize,
    },
    Paragraph {
        /// Raw source slice, inline markup preserved.
        raw: String,
        line: usize,
    },
    /// A top-level list item; `raw` spans the item's continuation lines and
    /// any nested items.
    ListItem { raw: String, line: usize },
    /// A fenced code block.
    CodeBlock {
        body: String,
        language: String,
        line: usize,
    },
}

impl Segment {
    pub fn line(&self) -> usize {
        match self {
            Segment::Heading { line, .. }
            | Segment::Paragraph { line, .. }
            | Segment::ListItem { line, .. }
            | Segment::CodeBlock { line, .. } => *line,
        }
    }
}

/// Split source text into segments.
pub fn segment(source: &str) -> Vec<Segment> {
    let line_starts = line_starts(source);
    let line_of = |offset: usize| match line_starts.binary_search(&offset) {
        Ok(index) => index,
        Err(index) => index.saturating_sub(1),
    };

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    let parser = Parser::new_ext(source, options);

    let mut segments = Vec::new();
    let mut heading: Option<(u32, usize)> = None;
    let mut heading_text = String::new();
    let mut code: Option<(String, usize)> = None;
    let mut code_body = String::new();
    let mut list_depth = 0usize;

    for (event, range) in parser.into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                heading = Some((heading_level_to_int(level), line_of(range.start)));
                heading_text.clear();
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, line)) = heading.take() {
                    segments.push(Segment::Heading {
                        level,
                        text: heading_text.trim().to_string(),
                        line,
                    });
                    heading_text.clear();
                }
            }
            Event::Start(Tag::Paragraph) => {
                // Paragraphs inside list items stay folded into the item
                if list_depth == 0 && heading.is_none() {
                    let raw = source[range.clone()].trim();
                    if !raw.is_empty() {
                        segments.push(Segment::Paragraph {
                            raw: raw.to_string(),
                            line: line_of(range.start),
                        });
                    }
                }
            }
            Event::Start(Tag::Item) => {
                list_depth += 1;
                if list_depth == 1 {
                    let raw = source[range.clone()].trim_end();
                    if !raw.is_empty() {
                        segments.push(Segment::ListItem {
                            raw: raw.to_string(),
                            line: line_of(range.start),
                        });
                    }
                }
            }
            Event::End(TagEnd::Item) => {
                list_depth = list_depth.saturating_sub(1);
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                // Only fenced blocks become candidates; indented code is
                // usually continuation content
                if let CodeBlockKind::Fenced(info) = kind {
                    let language = info.split_whitespace().next().unwrap_or("").to_string();
                    code = Some((language, line_of(range.start)));
                    code_body.clear();
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((language, line)) = code.take() {
                    if list_depth == 0 {
                        segments.push(Segment::CodeBlock {
                            body: code_body.trim_end().to_string(),
                            language,
                            line,
                        });
                    }
                    code_body.clear();
                }
            }
            Event::Text(text) => {
                if code.is_some() {
                    code_body.push_str(&text);
                } else if heading.is_some() {
                    heading_text.push_str(&text);
                }
            }
            Event::Code(text) => {
                if heading.is_some() {
                    heading_text.push_str(&text);
                }
            }
            _ => {}
        }
    }

    segments
}

/// Byte offsets where each source line starts.
fn line_starts(source: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (offset, byte) in source.bytes().enumerate() {
        if byte == b'\n' {
            starts.push(offset + 1);
        }
    }
    starts
}

fn heading_level_to_int(level: HeadingLevel) -> u32 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
