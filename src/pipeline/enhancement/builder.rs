use chrono::{DateTime, Utc};

use super::types::{
    Alternative, BodySystem, ClinicalContext, ClinicalSignificance, CorrectionSuggestion,
    CorrectionType, EnhancementRecord, QualityMetrics, SearchResult, SourceAttribution,
    TermCandidate, TermSuggestions, TermType,
};
use super::vocabulary::{
    classify_body_system, classify_significance, correct_spelling, expand_abbreviation,
    IMAGING_FINDINGS,
};
use crate::config::PEER_REVIEWED_SOURCE_ID;

/// Confidence of an enhancement built without any source data.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Confidence attached to a misspelling-map correction.
pub const SPELLING_CORRECTION_CONFIDENCE: f64 = 0.9;

const MAX_ALTERNATIVES: usize = 2;
const MAX_CONTEXTUAL_TERMS: usize = 5;
const RECENT_UPDATE_DAYS: i64 = 365;

/// Safe low-information enhancement used when no source data is available
/// or the term failed to process.
pub fn fallback_enhancement(term: &TermCandidate) -> EnhancementRecord {
    EnhancementRecord {
        original_term: term.original_term.clone(),
        validated_definition: format!(
            "{} term: no validated definition available from configured sources",
            capitalize(term.term_type.as_str())
        ),
        confidence: FALLBACK_CONFIDENCE,
        suggestions: TermSuggestions::default(),
        clinical_context: ClinicalContext {
            severity: "unknown".into(),
            body_system: BodySystem::General,
            imaging_findings: Vec::new(),
            clinical_significance: ClinicalSignificance::Moderate,
        },
        sources: Vec::new(),
        quality_metrics: QualityMetrics::default(),
    }
}

/// Build the enhancement record for a term from its ranked results.
///
/// `validated` must already be ranked; the first entry is the primary
/// definition. Empty input yields the fallback enhancement.
pub fn generate_term_enhancement(
    term: &TermCandidate,
    validated: &[SearchResult],
) -> EnhancementRecord {
    generate_term_enhancement_at(term, validated, Utc::now())
}

pub(crate) fn generate_term_enhancement_at(
    term: &TermCandidate,
    validated: &[SearchResult],
    now: DateTime<Utc>,
) -> EnhancementRecord {
    let Some((primary, rest)) = validated.split_first() else {
        return fallback_enhancement(term);
    };

    let mut synonyms = Vec::new();
    if term.term_type == TermType::Abbreviation {
        if let Some(expansion) = expand_abbreviation(&term.term) {
            push_unique(&mut synonyms, expansion);
        }
    }
    for synonym in &primary.synonyms {
        push_unique(&mut synonyms, synonym);
    }

    let alternatives = rest
        .iter()
        .take(MAX_ALTERNATIVES)
        .map(|r| Alternative {
            term: r.term.clone(),
            definition: r.definition.clone(),
            confidence: r.confidence,
            source: r.source.clone(),
        })
        .collect();

    let corrections = correct_spelling(&term.term)
        .map(|correct| CorrectionSuggestion {
            suggested: correct.to_string(),
            confidence: SPELLING_CORRECTION_CONFIDENCE,
            correction_type: CorrectionType::Spelling,
        })
        .into_iter()
        .collect();

    let mut contextual_terms = Vec::new();
    for related in validated.iter().flat_map(|r| r.related_terms.iter()) {
        if contextual_terms.len() >= MAX_CONTEXTUAL_TERMS {
            break;
        }
        push_unique(&mut contextual_terms, related);
    }

    let clinical_context = ClinicalContext {
        severity: primary.severity.clone(),
        body_system: classify_body_system(&format!("{} {}", term.term, primary.definition)),
        imaging_findings: imaging_findings_in(validated),
        clinical_significance: classify_significance(&format!(
            "{} {}",
            primary.definition, primary.clinical_context
        )),
    };

    let sources = validated
        .iter()
        .map(|r| SourceAttribution {
            name: r.source.clone(),
            url: r.url.clone(),
            trust_score: r.trust_score,
            last_updated: r.last_updated,
        })
        .collect();

    let recent_cutoff = now - chrono::Duration::days(RECENT_UPDATE_DAYS);
    let quality_metrics = QualityMetrics {
        source_consensus: validated.len() > 1,
        peer_reviewed: validated.iter().any(|r| r.source_id == PEER_REVIEWED_SOURCE_ID),
        recently_updated: validated.iter().any(|r| r.last_updated >= recent_cutoff),
    };

    EnhancementRecord {
        original_term: term.original_term.clone(),
        validated_definition: primary.definition.clone(),
        confidence: primary.confidence,
        suggestions: TermSuggestions {
            synonyms,
            alternatives,
            corrections,
            contextual_terms,
        },
        clinical_context,
        sources,
        quality_metrics,
    }
}

/// Imaging-finding words mentioned by any result, in first-mention order.
fn imaging_findings_in(results: &[SearchResult]) -> Vec<String> {
    let mut findings = Vec::new();
    for r in results {
        let text = format!("{} {}", r.definition, r.clinical_context).to_lowercase();
        for word in text.split(|c: char| !c.is_alphanumeric()) {
            if IMAGING_FINDINGS.contains(&word) {
                push_unique(&mut findings, word);
            }
        }
    }
    findings
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v.eq_ignore_ascii_case(value)) {
        list.push(value.to_string());
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
