//! HTML content extraction.
//!
//! Strategy, in order:
//! 1. elements whose `class`/`id` contains a configured content pattern
//! 2. headings, paragraphs and list items in document order
//! 3. the whole body text, when the result is still too short

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::extraction::rules::ExtractionRules;
use crate::extraction::{normalize_whitespace, ExtractionError};

const LIST_BULLET: &str = "•";

/// Text under these elements is never collected.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Text in different blocks is separated by a space; inline text is not.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "html", "li", "main", "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr",
    "ul",
];

pub fn extract_relevant_text(
    html: &str,
    rules: &ExtractionRules,
) -> Result<String, ExtractionError> {
    let document = Html::parse_document(html);

    let sections = content_sections(&document, rules)?;
    let (strategy, text) = if sections.is_empty() {
        ("structural", structural_text(&document, rules)?.join("\n"))
    } else {
        ("content-section", sections.join("\n\n"))
    };
    let text = normalize_whitespace(&text);

    let length = text.chars().count();
    if length < rules.min_total_chars {
        debug!(
            "{strategy} extraction produced {length} chars (< {}), using body text",
            rules.min_total_chars
        );
        return Ok(normalize_whitespace(&body_text(&document)?));
    }

    debug!("{strategy} extraction produced {length} chars");
    Ok(text)
}

fn selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|e| ExtractionError::Parse(format!("invalid selector '{css}': {e}")))
}

fn content_sections(
    document: &Html,
    rules: &ExtractionRules,
) -> Result<Vec<String>, ExtractionError> {
    let candidates = selector("[class], [id]")?;
    let mut taken = HashSet::new();
    let mut sections = Vec::new();

    let patterns = rules
        .content_patterns
        .iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty());

    for pattern in patterns {
        for element in document.select(&candidates) {
            if !attribute_matches(element, &pattern) {
                continue;
            }
            // Nested matches would repeat the same text.
            let overlaps = element.ancestors().any(|a| taken.contains(&a.id()))
                || element.descendants().any(|d| taken.contains(&d.id()));
            if overlaps {
                continue;
            }

            let text = normalize_whitespace(&visible_text(element));
            if text.chars().count() <= rules.min_section_chars {
                continue;
            }
            taken.insert(element.id());
            sections.push(text);
        }
    }

    Ok(sections)
}

fn attribute_matches(element: ElementRef<'_>, pattern: &str) -> bool {
    ["class", "id"].iter().any(|name| {
        element
            .value()
            .attr(name)
            .is_some_and(|value| value.to_lowercase().contains(pattern))
    })
}

fn structural_text(
    document: &Html,
    rules: &ExtractionRules,
) -> Result<Vec<String>, ExtractionError> {
    let structural = selector(&rules.structural_selector)?;
    let matched: HashSet<_> = document.select(&structural).map(|e| e.id()).collect();

    Ok(document
        .select(&structural)
        // text of a <p> inside a matched <li> is already part of the <li>
        .filter(|element| !element.ancestors().any(|a| matched.contains(&a.id())))
        .filter_map(|element| {
            let text = normalize_whitespace(&visible_text(element));
            if text.is_empty() {
                return None;
            }
            if element.value().name() == "li" {
                Some(format!("{LIST_BULLET} {text}"))
            } else {
                Some(text)
            }
        })
        .collect())
}

fn body_text(document: &Html) -> Result<String, ExtractionError> {
    let body = selector("body")?;
    let root = document
        .select(&body)
        .next()
        .unwrap_or_else(|| document.root_element());
    Ok(visible_text(root))
}

/// Concatenates visible text. Text nodes inside the same block element are
/// joined as-is, so inline markup never splits a word (`<b>Java</b>Script`).
fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    let mut last_block = None;
    let mut line_break = false;

    for node in element.descendants() {
        if let Some(el) = node.value().as_element() {
            line_break |= el.name() == "br";
            continue;
        }
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|e| HIDDEN_TAGS.contains(&e.name()))
        });
        if hidden {
            continue;
        }

        let block = node
            .ancestors()
            .find(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|e| BLOCK_TAGS.contains(&e.name()))
            })
            .map(|ancestor| ancestor.id());
        if !out.is_empty() && (line_break || block != last_block) {
            out.push(' ');
        }
        out.push_str(text);
        last_block = block;
        line_break = false;
    }
    out
}
