use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::types::{TermCandidate, TermType};
use super::vocabulary::{
    correct_spelling, known_misspellings, ANATOMICAL_ROOTS, IMAGING_FINDINGS,
    MEASUREMENT_UNITS, PATHOLOGY_SUFFIXES, PROCEDURE_SUFFIXES,
};
use crate::config::RagConfig;

fn alternation(words: &[&str]) -> String {
    // Longest first so "mmhg" is preferred over "mm".
    let mut sorted: Vec<&str> = words.to_vec();
    sorted.sort_by_key(|w| std::cmp::Reverse(w.len()));
    sorted
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|")
}

/// Extraction patterns in application order. Ties at the same offset go to
/// the earlier pattern.
static TERM_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(&format!(r"(?i)\b(?:{})[a-z]*\b", alternation(ANATOMICAL_ROOTS))).unwrap(),
        Regex::new(&format!(r"(?i)\b[a-z]+(?:{})\b", alternation(PATHOLOGY_SUFFIXES))).unwrap(),
        Regex::new(&format!(r"(?i)\b(?:{})\b", alternation(IMAGING_FINDINGS))).unwrap(),
        Regex::new(&format!(r"(?i)\b[a-z]+(?:{})\b", alternation(PROCEDURE_SUFFIXES))).unwrap(),
        Regex::new(&format!(
            r"(?i)\b\d+(?:\.\d+)?\s?(?:{})\b",
            alternation(MEASUREMENT_UNITS)
        ))
        .unwrap(),
        Regex::new(r"\b[A-Z]{2,6}\b").unwrap(),
        Regex::new(&format!(
            r"(?i)\b(?:{})\b",
            alternation(&known_misspellings().collect::<Vec<_>>())
        ))
        .unwrap(),
    ]
});

/// Generic "looks like a medical term" shape, applied to normalized terms.
static TERM_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9 '.\-]{0,49}$").unwrap());

static MEASUREMENT_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\d+(?:\.\d+)?\s?(?:{})$",
        alternation(MEASUREMENT_UNITS)
    ))
    .unwrap()
});

static ABBREVIATION_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2,6}$").unwrap());

/// Extract medical term candidates with the default context window.
pub fn extract_medical_terms_default(text: &str) -> Vec<TermCandidate> {
    extract_medical_terms(text, RagConfig::default().context_window)
}

/// Extract deduplicated medical term candidates from report text.
///
/// Candidates come back in first-occurrence order. A term seen again later
/// (in any casing) is discarded; the first occurrence keeps its casing,
/// position and context.
pub fn extract_medical_terms(text: &str, context_window: usize) -> Vec<TermCandidate> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<(usize, usize, &str)> = Vec::new();
    for (pattern_idx, pattern) in TERM_PATTERNS.iter().enumerate() {
        for m in pattern.find_iter(text) {
            matches.push((m.start(), pattern_idx, m.as_str()));
        }
    }
    matches.sort_by_key(|(start, pattern_idx, _)| (*start, *pattern_idx));

    let radius = context_window / 2;
    let mut seen = HashSet::new();
    let mut terms = Vec::new();

    for (start, _, matched) in matches {
        let term = matched.to_lowercase();
        if !is_valid_medical_term(&term) || !seen.insert(term.clone()) {
            continue;
        }

        terms.push(TermCandidate {
            term_type: classify_term(&term, matched),
            context: context_around(text, start, matched.len(), radius),
            term,
            original_term: matched.to_string(),
            position: start,
        });
    }

    tracing::debug!(count = terms.len(), "Extracted medical terms");
    terms
}

/// Shape check on a normalized term: alphanumeric start, 1-50 chars,
/// spaces, hyphens, apostrophes and periods allowed.
pub fn is_valid_medical_term(term: &str) -> bool {
    TERM_SHAPE.is_match(term)
}

/// Classify a term. First matching class wins. A known misspelling takes
/// the class of its correct spelling.
pub fn classify_term(term: &str, original: &str) -> TermType {
    if MEASUREMENT_SHAPE.is_match(term) {
        return TermType::Measurement;
    }
    if ABBREVIATION_SHAPE.is_match(original) {
        return TermType::Abbreviation;
    }
    if let Some(correct) = correct_spelling(term) {
        return classify_term(correct, correct);
    }
    if has_suffix(term, PATHOLOGY_SUFFIXES) {
        return TermType::Pathology;
    }
    if has_suffix(term, PROCEDURE_SUFFIXES) {
        return TermType::Procedure;
    }
    if IMAGING_FINDINGS.contains(&term) {
        return TermType::Finding;
    }
    if ANATOMICAL_ROOTS.iter().any(|root| term.starts_with(root)) {
        return TermType::Anatomy;
    }
    TermType::General
}

fn has_suffix(term: &str, suffixes: &[&str]) -> bool {
    suffixes
        .iter()
        .any(|s| term.len() > s.len() && term.ends_with(s))
}

/// Window of `radius` bytes either side of the match, widened to char
/// boundaries.
fn context_around(text: &str, start: usize, len: usize, radius: usize) -> String {
    let mut from = start.saturating_sub(radius);
    while !text.is_char_boundary(from) {
        from -= 1;
    }
    let mut to = (start + len + radius).min(text.len());
    while !text.is_char_boundary(to) {
        to += 1;
    }
    text[from..to].trim().to_string()
}
