use regex::{Captures, Regex};

use super::types::{Correction, ProcessedTerm, Suggestion};

pub const SPELLING_CORRECTION_REASON: &str = "spelling_correction";

/// Apply high-confidence corrections to the report.
///
/// A term is rewritten when its enhancement confidence meets `threshold`
/// and it carries at least one correction. Every case-insensitive
/// whole-word occurrence is replaced with the top correction, keeping the
/// capitalization pattern of each occurrence.
pub fn apply_corrections(
    report: &str,
    terms: &[ProcessedTerm],
    threshold: f64,
) -> Result<(String, Vec<Correction>), regex::Error> {
    let mut enhanced = report.to_string();
    let mut corrections = Vec::new();

    for processed in terms {
        let enhancement = &processed.enhancement;
        if enhancement.confidence < threshold {
            continue;
        }
        let Some(top) = enhancement.suggestions.corrections.first() else {
            continue;
        };

        let original = &processed.candidate.original_term;
        enhanced = replace_whole_word(&enhanced, original, &top.suggested)?;
        corrections.push(Correction {
            original: original.clone(),
            corrected: top.suggested.clone(),
            confidence: top.confidence,
            reason: SPELLING_CORRECTION_REASON.to_string(),
        });

        tracing::debug!(
            original = %original,
            corrected = %top.suggested,
            "Applied spelling correction"
        );
    }

    Ok((enhanced, corrections))
}

/// Replace every case-insensitive whole-word occurrence of `word`.
pub fn replace_whole_word(
    text: &str,
    word: &str,
    replacement: &str,
) -> Result<String, regex::Error> {
    let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word)))?;
    Ok(pattern
        .replace_all(text, |caps: &Captures| preserve_case(&caps[0], replacement))
        .into_owned())
}

/// Suggestion entries for terms with synonyms, capped at `max_suggestions`
/// entries of at most `max_suggestions` synonyms each.
pub fn collect_suggestions(terms: &[ProcessedTerm], max_suggestions: usize) -> Vec<Suggestion> {
    terms
        .iter()
        .filter(|p| !p.enhancement.suggestions.synonyms.is_empty())
        .take(max_suggestions)
        .map(|p| Suggestion {
            term: p.candidate.original_term.clone(),
            synonyms: p
                .enhancement
                .suggestions
                .synonyms
                .iter()
                .take(max_suggestions)
                .cloned()
                .collect(),
            confidence: p.enhancement.confidence,
        })
        .collect()
}

/// Distinct source names across all enhancements, in first-seen order.
pub fn aggregate_sources(terms: &[ProcessedTerm]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for source in terms.iter().flat_map(|p| p.enhancement.sources.iter()) {
        if !names.contains(&source.name) {
            names.push(source.name.clone());
        }
    }
    names
}

/// Arithmetic mean of enhancement confidences; 0 for no terms.
pub fn mean_confidence(terms: &[ProcessedTerm]) -> f64 {
    if terms.is_empty() {
        return 0.0;
    }
    let total: f64 = terms.iter().map(|p| p.enhancement.confidence).sum();
    total / terms.len() as f64
}

/// Carry the original word's capitalization pattern onto the correction.
fn preserve_case(original: &str, correction: &str) -> String {
    if original.chars().any(|c| c.is_alphabetic())
        && original.chars().all(|c| c.is_uppercase() || !c.is_alphabetic())
    {
        return correction.to_uppercase();
    }

    let first_upper = original.chars().next().is_some_and(|c| c.is_uppercase());
    if first_upper {
        let mut chars = correction.chars();
        match chars.next() {
            Some(c) => {
                let mut s = c.to_uppercase().to_string();
                s.extend(chars);
                s
            }
            None => correction.to_string(),
        }
    } else {
        correction.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::enhancement::builder::{fallback_enhancement, SPELLING_CORRECTION_CONFIDENCE};
    use crate::pipeline::enhancement::types::{
        CorrectionSuggestion, CorrectionType, EnhancementRecord, SourceAttribution, TermCandidate,
        TermType,
    };
    use chrono::Utc;
    use std::sync::Arc;

    fn processed(
        original: &str,
        confidence: f64,
        correction: Option<&str>,
        synonyms: &[&str],
        sources: &[&str],
    ) -> ProcessedTerm {
        let candidate = TermCandidate {
            term: original.to_lowercase(),
            original_term: original.into(),
            position: 0,
            context: original.into(),
            term_type: TermType::Pathology,
        };
        let mut record: EnhancementRecord = fallback_enhancement(&candidate);
        record.confidence = confidence;
        record.suggestions.synonyms = synonyms.iter().map(|s| s.to_string()).collect();
        record.suggestions.corrections = correction
            .map(|c| CorrectionSuggestion {
                suggested: c.into(),
                confidence: SPELLING_CORRECTION_CONFIDENCE,
                correction_type: CorrectionType::Spelling,
            })
            .into_iter()
            .collect();
        record.sources = sources
            .iter()
            .map(|name| SourceAttribution {
                name: name.to_string(),
                url: String::new(),
                trust_score: 90,
                last_updated: Utc::now(),
            })
            .collect();
        ProcessedTerm {
            candidate,
            enhancement: Arc::new(record),
        }
    }

    #[test]
    fn replaces_all_case_insensitive_occurrences() {
        let report = "Pnemonia in the left lobe. pnemonia resolving. PNEMONIA.";
        let terms = vec![processed("Pnemonia", 0.9, Some("pneumonia"), &[], &[])];
        let (enhanced, corrections) = apply_corrections(report, &terms, 0.8).unwrap();
        assert_eq!(enhanced, "Pneumonia in the left lobe. pneumonia resolving. PNEUMONIA.");
        assert_eq!(corrections.len(), 1);
        assert_eq!(corrections[0].original, "Pnemonia");
        assert_eq!(corrections[0].corrected, "pneumonia");
        assert_eq!(corrections[0].reason, "spelling_correction");
        assert!((corrections[0].confidence - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn whole_words_only() {
        let out = replace_whole_word("efusion efusions pre-efusion", "efusion", "effusion").unwrap();
        assert_eq!(out, "effusion efusions pre-effusion");
    }

    #[test]
    fn below_threshold_not_applied() {
        let report = "Patient has pnemonia.";
        let terms = vec![processed("pnemonia", 0.7, Some("pneumonia"), &[], &[])];
        let (enhanced, corrections) = apply_corrections(report, &terms, 0.8).unwrap();
        assert_eq!(enhanced, report);
        assert!(corrections.is_empty());
    }

    #[test]
    fn threshold_is_inclusive() {
        let terms = vec![processed("pnemonia", 0.8, Some("pneumonia"), &[], &[])];
        let (enhanced, _) = apply_corrections("pnemonia", &terms, 0.8).unwrap();
        assert_eq!(enhanced, "pneumonia");
    }

    #[test]
    fn terms_without_corrections_untouched() {
        let report = "Mild cardiomegaly.";
        let terms = vec![processed("cardiomegaly", 0.95, None, &["enlarged heart"], &[])];
        let (enhanced, corrections) = apply_corrections(report, &terms, 0.8).unwrap();
        assert_eq!(enhanced, report);
        assert!(corrections.is_empty());
    }

    #[test]
    fn suggestions_only_for_terms_with_synonyms() {
        let terms = vec![
            processed("cardiomegaly", 0.9, None, &["enlarged heart", "cardiac enlargement"], &[]),
            processed("nodule", 0.5, None, &[], &[]),
            processed("effusion", 0.85, None, &["fluid collection"], &[]),
        ];
        let suggestions = collect_suggestions(&terms, 5);
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].term, "cardiomegaly");
        assert_eq!(suggestions[0].synonyms.len(), 2);
        assert_eq!(suggestions[1].term, "effusion");

        let capped = collect_suggestions(&terms, 1);
        assert_eq!(capped.len(), 1);
        assert_eq!(capped[0].synonyms, vec!["enlarged heart"]);
    }

    #[test]
    fn sources_deduplicated_in_order() {
        let terms = vec![
            processed("a", 0.9, None, &[], &["PubMed", "Radiopaedia"]),
            processed("b", 0.9, None, &[], &["Radiopaedia", "MedlinePlus"]),
        ];
        assert_eq!(aggregate_sources(&terms), vec!["PubMed", "Radiopaedia", "MedlinePlus"]);
    }

    #[test]
    fn mean_confidence_of_terms() {
        assert_eq!(mean_confidence(&[]), 0.0);
        let terms = vec![
            processed("a", 0.9, None, &[], &[]),
            processed("b", 0.5, None, &[], &[]),
        ];
        assert!((mean_confidence(&terms) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn preserve_case_patterns() {
        assert_eq!(preserve_case("PNEMONIA", "pneumonia"), "PNEUMONIA");
        assert_eq!(preserve_case("Pnemonia", "pneumonia"), "Pneumonia");
        assert_eq!(preserve_case("pnemonia", "pneumonia"), "pneumonia");
    }
}
