use indexmap::IndexMap;
use scraper::{ElementRef, Html, Selector};

use crate::formats::ExtractedRecord;
use crate::site::SiteKind;

pub const REVIEW_SEPARATOR: &str = "\n\n---\n\n";

/// Review candidates must be longer than this (in characters, after trimming).
pub const MIN_REVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleMode {
    /// Text of the first matching element.
    First,
    /// Texts of all matching elements longer than [`MIN_REVIEW_CHARS`],
    /// joined with [`REVIEW_SEPARATOR`].
    Reviews,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub field: &'static str,
    pub selector: &'static str,
    pub mode: RuleMode,
}

impl FieldRule {
    pub const fn first(field: &'static str, selector: &'static str) -> Self {
        Self {
            field,
            selector,
            mode: RuleMode::First,
        }
    }

    pub const fn reviews(field: &'static str, selector: &'static str) -> Self {
        Self {
            field,
            selector,
            mode: RuleMode::Reviews,
        }
    }
}

/// Applies `rules` in order. Never fails: a rule that matches nothing (or
/// whose selector does not parse) yields an empty field recorded as missing.
pub fn extract(kind: SiteKind, rules: &[FieldRule], html: &str) -> ExtractedRecord {
    let document = Html::parse_document(html);

    let mut fields = IndexMap::with_capacity(rules.len());
    let mut missing = Vec::new();

    for rule in rules {
        let value = match Selector::parse(rule.selector) {
            Ok(selector) => apply_rule(&document, &selector, rule.mode),
            Err(err) => {
                tracing::warn!(
                    site = %kind,
                    field = rule.field,
                    selector = rule.selector,
                    %err,
                    "invalid selector; field left empty"
                );
                String::new()
            }
        };

        if value.is_empty() {
            tracing::debug!(site = %kind, field = rule.field, "field not found");
            missing.push(rule.field.to_owned());
        }
        fields.insert(rule.field.to_owned(), value);
    }

    ExtractedRecord::new(kind, fields, missing)
}

fn apply_rule(document: &Html, selector: &Selector, mode: RuleMode) -> String {
    match mode {
        RuleMode::First => document
            .select(selector)
            .next()
            .map(element_text)
            .unwrap_or_default(),
        RuleMode::Reviews => {
            // Length is judged on the raw text, before whitespace is collapsed.
            let reviews = document
                .select(selector)
                .map(|element| element.text().collect::<String>())
                .filter(|raw| is_review_text(raw))
                .map(|raw| normalize_text(&raw))
                .collect::<Vec<_>>();
            reviews.join(REVIEW_SEPARATOR)
        }
    }
}

pub fn is_review_text(text: &str) -> bool {
    text.trim().chars().count() > MIN_REVIEW_CHARS
}

fn element_text(element: ElementRef<'_>) -> String {
    let raw = element.text().collect::<String>();
    normalize_text(&raw)
}

/// Collapses whitespace runs inside each line and drops blank lines.
fn normalize_text(raw: &str) -> String {
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
