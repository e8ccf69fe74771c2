use super::types::{SearchResult, TermCandidate};

/// Filter, rank and truncate raw search results for one term.
///
/// Drops results below `similarity_threshold`, orders the rest by
/// `confidence * trust_score` (highest first, ties keep input order) and
/// keeps at most `max_results`.
pub fn validate_search_results(
    results: Vec<SearchResult>,
    term: &TermCandidate,
    similarity_threshold: f64,
    max_results: usize,
) -> Vec<SearchResult> {
    let total = results.len();
    let mut validated: Vec<SearchResult> = results
        .into_iter()
        .filter(|r| r.confidence >= similarity_threshold)
        .collect();

    validated.sort_by(|a, b| {
        b.rank_score()
            .partial_cmp(&a.rank_score())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    validated.truncate(max_results);

    tracing::debug!(
        term = %term.term,
        total,
        kept = validated.len(),
        "Validated search results"
    );
    validated
}
