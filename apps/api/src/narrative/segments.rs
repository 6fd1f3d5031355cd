//! Splits a heading-structured narrative into named segments.
//!
//! A result description is authored as rich text: a few headings, each
//! followed by paragraphs or a bullet list. Templates place individual
//! segments by key, so the text is turned into `slug → {title, body, kind}`.
//! Input that is already a serialized mapping passes through unchanged.

use std::collections::BTreeMap;

use scraper::{ElementRef, Html, Node};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::narrative::slug::slugify;

/// Reserved key for content that precedes the first heading.
pub const INTRO_KEY: &str = "intro";

/// Line prefix for flattened list items.
pub const BULLET_PREFIX: &str = "\u{2022} ";

const BULLET_GLYPHS: &[char] = &['\u{2022}', '\u{25CF}', '\u{25E6}', '\u{25AA}', '\u{00B7}', '-', '*'];

pub type SegmentMap = BTreeMap<String, NarrativeSegment>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    #[default]
    Paragraph,
    List,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SegmentRepr")]
pub struct NarrativeSegment {
    pub key: String,
    pub title: String,
    pub body: String,
    pub kind: SegmentKind,
}

/// Stored mappings come from several authoring tools; a bare string is a body.
#[derive(Deserialize)]
#[serde(untagged)]
enum SegmentRepr {
    Body(String),
    Full {
        #[serde(default)]
        key: String,
        #[serde(default)]
        title: String,
        #[serde(default, alias = "value", alias = "content")]
        body: String,
        #[serde(default)]
        kind: SegmentKind,
    },
}

impl From<SegmentRepr> for NarrativeSegment {
    fn from(repr: SegmentRepr) -> Self {
        match repr {
            SegmentRepr::Body(body) => NarrativeSegment {
                key: String::new(),
                title: String::new(),
                body,
                kind: SegmentKind::Paragraph,
            },
            SegmentRepr::Full {
                key,
                title,
                body,
                kind,
            } => NarrativeSegment {
                key,
                title,
                body,
                kind,
            },
        }
    }
}

/// Parses narrative text into segments. Never fails; input with no usable
/// content yields an empty mapping.
pub fn parse_segments(input: &str) -> SegmentMap {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return SegmentMap::new();
    }

    if trimmed.starts_with('{') {
        if let Ok(mut existing) = serde_json::from_str::<SegmentMap>(trimmed) {
            for (key, segment) in existing.iter_mut() {
                if segment.key.is_empty() {
                    segment.key = key.clone();
                }
            }
            return existing;
        }
    }

    let fragment = Html::parse_fragment(trimmed);
    let mut blocks = Vec::new();
    let mut pending = String::new();
    collect_blocks(fragment.root_element(), &mut blocks, &mut pending);
    flush_inline(&mut pending, &mut blocks);

    assemble(blocks)
}

// ────────────────────────────────────────────────────────────────────────────
// Block extraction
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
enum Block {
    Heading(String),
    Paragraph(String),
    List(Vec<String>),
}

fn collect_blocks(parent: ElementRef<'_>, blocks: &mut Vec<Block>, pending: &mut String) {
    for child in parent.children() {
        if let Node::Text(text) = child.value() {
            pending.push_str(text);
            continue;
        }
        let Some(element) = ElementRef::wrap(child) else {
            continue;
        };

        match element.value().name() {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                flush_inline(pending, blocks);
                blocks.push(Block::Heading(inline_text(element)));
            }
            "p" | "blockquote" | "pre" => {
                flush_inline(pending, blocks);
                push_paragraph(inline_text(element), blocks);
            }
            "ul" | "ol" => {
                flush_inline(pending, blocks);
                let items: Vec<String> = element
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|li| li.value().name() == "li")
                    .map(inline_text)
                    .filter(|item| !item.is_empty())
                    .collect();
                if !items.is_empty() {
                    blocks.push(Block::List(items));
                }
            }
            "br" => pending.push('\n'),
            "div" | "section" | "article" | "main" | "header" | "footer" | "body" | "html" => {
                flush_inline(pending, blocks);
                collect_blocks(element, blocks, pending);
                flush_inline(pending, blocks);
            }
            _ => pending.push_str(&inline_text(element)),
        }
    }
}

/// Text content of an element with whitespace collapsed; `<br>` becomes a
/// line break.
fn inline_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    gather_text(element, &mut raw);
    raw.split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn gather_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.name() == "br" => out.push('\n'),
            Node::Element(_) => {
                if let Some(nested) = ElementRef::wrap(child) {
                    gather_text(nested, out);
                }
            }
            _ => {}
        }
    }
}

/// Bare text between block elements keeps its own line structure.
fn flush_inline(pending: &mut String, blocks: &mut Vec<Block>) {
    let text = std::mem::take(pending);
    let lines: Vec<String> = text
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect();
    if !lines.is_empty() {
        push_paragraph(lines.join("\n"), blocks);
    }
}

/// Paragraphs whose every line starts with a bullet glyph are lists.
fn push_paragraph(text: String, blocks: &mut Vec<Block>) {
    if text.is_empty() {
        return;
    }
    let lines: Vec<&str> = text.lines().collect();
    let bulleted = lines
        .iter()
        .all(|line| line.trim_start().starts_with(BULLET_GLYPHS));
    if bulleted {
        let items = lines
            .iter()
            .map(|line| line.trim_start().trim_start_matches(BULLET_GLYPHS).trim().to_string())
            .filter(|item| !item.is_empty())
            .collect();
        blocks.push(Block::List(items));
    } else {
        blocks.push(Block::Paragraph(text));
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Segment assembly
// ────────────────────────────────────────────────────────────────────────────

struct OpenSegment {
    title: String,
    lines: Vec<String>,
    has_list: bool,
}

impl OpenSegment {
    fn new(title: String) -> Self {
        Self {
            title,
            lines: Vec::new(),
            has_list: false,
        }
    }

    fn push(&mut self, block: Block) {
        match block {
            Block::Paragraph(text) => self.lines.push(text),
            Block::List(items) => {
                self.has_list = true;
                self.lines
                    .extend(items.into_iter().map(|item| format!("{BULLET_PREFIX}{item}")));
            }
            Block::Heading(_) => {}
        }
    }

    fn into_segment(self, key: String) -> NarrativeSegment {
        NarrativeSegment {
            key,
            title: self.title,
            body: self.lines.join("\n"),
            kind: if self.has_list {
                SegmentKind::List
            } else {
                SegmentKind::Paragraph
            },
        }
    }
}

fn assemble(blocks: Vec<Block>) -> SegmentMap {
    let mut segments = SegmentMap::new();
    let mut intro = OpenSegment::new(String::new());
    let mut current: Option<OpenSegment> = None;

    for block in blocks {
        match block {
            Block::Heading(title) => {
                if let Some(done) = current.take() {
                    insert_segment(&mut segments, done);
                }
                current = Some(OpenSegment::new(title));
            }
            other => match current.as_mut() {
                Some(open) => open.push(other),
                None => intro.push(other),
            },
        }
    }
    if let Some(done) = current.take() {
        insert_segment(&mut segments, done);
    }

    if !intro.lines.is_empty() {
        segments.insert(INTRO_KEY.to_string(), intro.into_segment(INTRO_KEY.to_string()));
    }
    segments
}

/// Colliding slugs are not deduplicated: the later heading wins.
fn insert_segment(segments: &mut SegmentMap, open: OpenSegment) {
    let key = slugify(&open.title);
    let segment = open.into_segment(key.clone());
    if let Some(previous) = segments.insert(key.clone(), segment) {
        warn!(
            slug = %key,
            earlier = %previous.title,
            "narrative headings share a slug; the later heading replaces the earlier one"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_heading_paragraph() {
        let segments = parse_segments("<h3>Power match!</h3><p>Your vibe matches X.</p>");
        assert_eq!(segments.len(), 1);
        let segment = &segments["power_match"];
        assert_eq!(segment.title, "Power match!");
        assert_eq!(segment.body, "Your vibe matches X.");
        assert_eq!(segment.kind, SegmentKind::Paragraph);
    }

    #[test]
    fn test_structured_mapping_passes_through() {
        let first = parse_segments("<h2>Strengths</h2><ul><li>Logic</li><li>Focus</li></ul>");
        let serialized = serde_json::to_string(&first).unwrap();
        let second = parse_segments(&serialized);
        assert_eq!(first, second);
    }

    #[test]
    fn test_bare_string_values_pass_through_as_bodies() {
        let segments = parse_segments(r#"{"summary": "Well done", "advice": {"title": "Next", "value": "Practice"}}"#);
        assert_eq!(segments["summary"].body, "Well done");
        assert_eq!(segments["summary"].key, "summary");
        assert_eq!(segments["advice"].title, "Next");
        assert_eq!(segments["advice"].body, "Practice");
    }

    #[test]
    fn test_intro_only_when_content_precedes_first_heading() {
        let with_intro = parse_segments("<p>Hello Jane.</p><h2>Summary</h2><p>Great.</p>");
        assert_eq!(with_intro.len(), 2);
        assert_eq!(with_intro[INTRO_KEY].title, "");
        assert_eq!(with_intro[INTRO_KEY].body, "Hello Jane.");

        let without_intro = parse_segments("<h2>Summary</h2><p>Great.</p>");
        assert_eq!(without_intro.len(), 1);
        assert!(!without_intro.contains_key(INTRO_KEY));
    }

    #[test]
    fn test_segment_count_matches_headings() {
        let text = "<h2>One</h2><p>a</p><h2>Two</h2><p>b</p><h2>Three</h2><p>c</p>";
        assert_eq!(parse_segments(text).len(), 3);
    }

    #[test]
    fn test_list_markup_flattens_to_bullet_lines() {
        let segments = parse_segments("<h3>Tips</h3><ul><li>Sleep well</li><li> Review   notes </li></ul>");
        let tips = &segments["tips"];
        assert_eq!(tips.kind, SegmentKind::List);
        assert_eq!(tips.body, "\u{2022} Sleep well\n\u{2022} Review notes");
    }

    #[test]
    fn test_bullet_glyph_paragraphs_are_lists() {
        let segments = parse_segments("<h3>Tips</h3><p>\u{2022} One<br>\u{2022} Two</p>");
        let tips = &segments["tips"];
        assert_eq!(tips.kind, SegmentKind::List);
        assert_eq!(tips.body, "\u{2022} One\n\u{2022} Two");
    }

    #[test]
    fn test_multiple_paragraphs_collapse_to_single_newlines() {
        let segments = parse_segments("<h3>About</h3><p>First.</p>\n\n<p>Second.</p>");
        assert_eq!(segments["about"].body, "First.\nSecond.");
    }

    #[test]
    fn test_nested_containers_are_walked() {
        let segments = parse_segments("<div><h3>Inside</h3><div><p>Deep text</p></div></div>");
        assert_eq!(segments["inside"].body, "Deep text");
    }

    #[test]
    fn test_colliding_slugs_last_wins() {
        let segments = parse_segments("<h3>Result</h3><p>first</p><h3>Result!</h3><p>second</p>");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments["result"].body, "second");
        assert_eq!(segments["result"].title, "Result!");
    }

    #[test]
    fn test_plain_text_becomes_intro() {
        let segments = parse_segments("Just a sentence.");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[INTRO_KEY].body, "Just a sentence.");
    }

    #[test]
    fn test_empty_and_garbage_input_never_panics() {
        assert!(parse_segments("").is_empty());
        assert!(parse_segments("   ").is_empty());
        assert!(parse_segments("<<<>>>").len() <= 1);
        let broken_json = parse_segments("{not json");
        assert!(broken_json.len() <= 1);
    }
}
