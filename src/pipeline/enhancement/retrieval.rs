use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};

use super::types::{KnowledgeSource, SearchResult, TermCandidate};
use super::vocabulary::correct_spelling;
use super::SourceError;

/// Lookup seam for one knowledge source.
///
/// Implementations may be slow or fail; the retriever bounds each call
/// with a timeout and drops failures.
#[async_trait]
pub trait SourceClient: Send + Sync {
    async fn search(
        &self,
        source: &KnowledgeSource,
        term: &TermCandidate,
    ) -> Result<Vec<SearchResult>, SourceError>;
}

/// A definition as a source reports it, before source attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceHit {
    pub definition: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub clinical_context: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub related_terms: Vec<String>,
    pub confidence: f64,
    #[serde(default)]
    pub url: String,
    pub last_updated: DateTime<Utc>,
}

impl SourceHit {
    /// Attach term and source metadata.
    pub fn into_result(self, term: &str, source: &KnowledgeSource) -> SearchResult {
        SearchResult {
            term: term.to_string(),
            source: source.name.clone(),
            source_id: source.id.clone(),
            trust_score: source.trust_score,
            definition: self.definition,
            synonyms: self.synonyms,
            clinical_context: self.clinical_context,
            severity: self.severity,
            related_terms: self.related_terms,
            confidence: self.confidence.clamp(0.0, 1.0),
            url: self.url,
            last_updated: self.last_updated,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Retriever — concurrent fan-out over sources
// ═══════════════════════════════════════════════════════════

/// Hits gathered for one term across sources.
#[derive(Debug, Default)]
pub struct RetrievalOutcome {
    pub results: Vec<SearchResult>,
    /// Lookups that errored or timed out.
    pub failed_sources: usize,
}

/// Fans a term out to every enabled source and gathers the hits.
pub struct Retriever {
    clients: HashMap<String, Arc<dyn SourceClient>>,
    timeout: Duration,
}

impl Retriever {
    pub fn new(timeout: Duration) -> Self {
        Self {
            clients: HashMap::new(),
            timeout,
        }
    }

    /// Register the client used for `source_id`, replacing any previous one.
    pub fn register(&mut self, source_id: &str, client: Arc<dyn SourceClient>) {
        self.clients.insert(source_id.to_string(), client);
    }

    /// Use one client for every source in `sources`.
    pub fn with_shared_client(
        sources: &[KnowledgeSource],
        client: Arc<dyn SourceClient>,
        timeout: Duration,
    ) -> Self {
        let mut retriever = Self::new(timeout);
        for source in sources {
            retriever.register(&source.id, client.clone());
        }
        retriever
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Query every enabled source concurrently and merge the hits.
    ///
    /// A failing or timed-out source is logged and skipped. When every
    /// source fails the result is empty, never an error.
    pub async fn search_medical_sources(
        &self,
        term: &TermCandidate,
        sources: &[KnowledgeSource],
    ) -> Vec<SearchResult> {
        self.retrieve(term, sources).await.results
    }

    /// Like `search_medical_sources`, also counting the lookups that failed.
    pub async fn retrieve(
        &self,
        term: &TermCandidate,
        sources: &[KnowledgeSource],
    ) -> RetrievalOutcome {
        let enabled: Vec<&KnowledgeSource> = sources.iter().filter(|s| s.enabled).collect();
        let outcomes = join_all(enabled.iter().map(|source| self.lookup(source, term))).await;

        let mut outcome = RetrievalOutcome::default();
        for (source, result) in enabled.iter().zip(outcomes) {
            match result {
                Ok(results) => outcome.results.extend(results),
                Err(e) => {
                    outcome.failed_sources += 1;
                    tracing::warn!(
                        source = %source.id,
                        term = %term.term,
                        error = %e,
                        "Source lookup failed, skipping"
                    );
                }
            }
        }

        tracing::debug!(
            term = %term.term,
            hits = outcome.results.len(),
            failed = outcome.failed_sources,
            "Source lookups complete"
        );
        outcome
    }

    async fn lookup(
        &self,
        source: &KnowledgeSource,
        term: &TermCandidate,
    ) -> Result<Vec<SearchResult>, SourceError> {
        let client = self
            .clients
            .get(&source.id)
            .ok_or_else(|| SourceError::NoClient(source.id.clone()))?;

        match tokio::time::timeout(self.timeout, client.search(source, term)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(self.timeout.as_millis())),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// StaticSourceClient — in-memory knowledge base
// ═══════════════════════════════════════════════════════════

/// Knowledge base held in memory, keyed by lowercase term.
///
/// A miss on a known misspelling falls back to the entry for the correct
/// spelling with slightly reduced confidence, the way a search engine
/// answers with its "did you mean" hit.
pub struct StaticSourceClient {
    entries: HashMap<String, Vec<SourceHit>>,
}

/// Confidence scale applied to hits found through a spelling correction.
const SPELLING_MATCH_FACTOR: f64 = 0.95;

impl StaticSourceClient {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn add(&mut self, term: &str, hit: SourceHit) {
        self.entries
            .entry(term.to_lowercase())
            .or_default()
            .push(hit);
    }

    /// Small built-in knowledge base for offline use.
    pub fn builtin() -> Self {
        let updated = Utc::now() - chrono::Duration::days(30);
        let mut kb = Self::new();
        let mut add = |term: &str,
                       definition: &str,
                       synonyms: &[&str],
                       context: &str,
                       severity: &str,
                       related: &[&str],
                       confidence: f64| {
            kb.add(
                term,
                SourceHit {
                    definition: definition.into(),
                    synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
                    clinical_context: context.into(),
                    severity: severity.into(),
                    related_terms: related.iter().map(|s| s.to_string()).collect(),
                    confidence,
                    url: String::new(),
                    last_updated: updated,
                },
            );
        };

        add(
            "pneumonia",
            "Infection that inflames the air sacs of one or both lungs, which may fill with fluid.",
            &["pneumonitis", "lung infection"],
            "Acute lower respiratory tract infection; consolidation on chest imaging.",
            "moderate",
            &["consolidation", "infiltrate", "pleural effusion"],
            0.92,
        );
        add(
            "cardiomegaly",
            "Enlargement of the heart, usually identified on chest radiograph.",
            &["enlarged heart", "cardiac enlargement"],
            "Cardiothoracic ratio above 0.5 on a PA chest film.",
            "moderate",
            &["heart failure", "cardiomyopathy"],
            0.9,
        );
        add(
            "effusion",
            "Abnormal collection of fluid in a body cavity.",
            &["fluid collection"],
            "Pleural effusion blunts the costophrenic angle on chest imaging.",
            "moderate",
            &["pleural effusion", "pericardial effusion"],
            0.88,
        );
        add(
            "atelectasis",
            "Partial or complete collapse of a lung or lobe.",
            &["lung collapse"],
            "Often minimal and incidental after surgery.",
            "mild",
            &["volume loss", "consolidation"],
            0.87,
        );
        add(
            "pneumothorax",
            "Air in the pleural space causing lung collapse.",
            &["collapsed lung"],
            "Tension pneumothorax is a critical emergency.",
            "severe",
            &["chest tube", "pleural space"],
            0.9,
        );
        add(
            "nodule",
            "Small rounded opacity, usually under 3 cm.",
            &["pulmonary nodule"],
            "Most small nodules are benign; follow-up by size.",
            "mild",
            &["mass", "granuloma"],
            0.85,
        );
        add(
            "ct",
            "Cross-sectional imaging built from x-ray projections.",
            &["CAT scan"],
            "Imaging examination.",
            "none",
            &["contrast", "hounsfield unit"],
            0.95,
        );

        kb
    }

    fn lookup(&self, term: &str) -> Vec<SourceHit> {
        if let Some(hits) = self.entries.get(term) {
            return hits.clone();
        }
        correct_spelling(term)
            .and_then(|correct| self.entries.get(correct))
            .map(|hits| {
                hits.iter()
                    .cloned()
                    .map(|mut hit| {
                        hit.confidence *= SPELLING_MATCH_FACTOR;
                        hit
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for StaticSourceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceClient for StaticSourceClient {
    async fn search(
        &self,
        source: &KnowledgeSource,
        term: &TermCandidate,
    ) -> Result<Vec<SearchResult>, SourceError> {
        Ok(self
            .lookup(&term.term)
            .into_iter()
            .map(|hit| hit.into_result(&term.term, source))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::enhancement::sources::SourceRegistry;
    use crate::pipeline::enhancement::types::TermType;
    use std::time::Instant;

    fn candidate(term: &str) -> TermCandidate {
        TermCandidate {
            term: term.into(),
            original_term: term.into(),
            position: 0,
            context: term.into(),
            term_type: TermType::Pathology,
        }
    }

    fn hit(definition: &str, confidence: f64) -> SourceHit {
        SourceHit {
            definition: definition.into(),
            synonyms: vec![],
            clinical_context: String::new(),
            severity: String::new(),
            related_terms: vec![],
            confidence,
            url: String::new(),
            last_updated: Utc::now(),
        }
    }

    struct FailingClient;

    #[async_trait]
    impl SourceClient for FailingClient {
        async fn search(
            &self,
            source: &KnowledgeSource,
            _term: &TermCandidate,
        ) -> Result<Vec<SearchResult>, SourceError> {
            Err(SourceError::Connection(source.base_url.clone()))
        }
    }

    struct SlowClient {
        delay: Duration,
    }

    #[async_trait]
    impl SourceClient for SlowClient {
        async fn search(
            &self,
            source: &KnowledgeSource,
            term: &TermCandidate,
        ) -> Result<Vec<SearchResult>, SourceError> {
            tokio::time::sleep(self.delay).await;
            Ok(vec![hit("slow definition", 0.9).into_result(&term.term, source)])
        }
    }

    fn two_sources() -> Vec<KnowledgeSource> {
        SourceRegistry::builtin()
            .enabled_sources(&["pubmed".to_string(), "medlineplus".to_string()])
    }

    #[tokio::test]
    async fn merges_hits_from_all_sources() {
        let mut kb = StaticSourceClient::new();
        kb.add("pneumonia", hit("lung infection", 0.9));
        let sources = two_sources();
        let retriever = Retriever::with_shared_client(&sources, Arc::new(kb), Duration::from_secs(1));

        let results = retriever.search_medical_sources(&candidate("pneumonia"), &sources).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().any(|r| r.source_id == "pubmed"));
        assert!(results.iter().any(|r| r.source_id == "medlineplus"));
        assert!(results.iter().all(|r| r.term == "pneumonia"));
    }

    #[tokio::test]
    async fn failing_source_does_not_abort_others() {
        let mut kb = StaticSourceClient::new();
        kb.add("pneumonia", hit("lung infection", 0.9));
        let sources = two_sources();
        let mut retriever = Retriever::new(Duration::from_secs(1));
        retriever.register("pubmed", Arc::new(FailingClient));
        retriever.register("medlineplus", Arc::new(kb));

        let results = retriever.search_medical_sources(&candidate("pneumonia"), &sources).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source_id, "medlineplus");
    }

    #[tokio::test]
    async fn outcome_counts_failed_lookups() {
        let mut kb = StaticSourceClient::new();
        kb.add("pneumonia", hit("lung infection", 0.9));
        let sources = two_sources();
        let mut retriever = Retriever::new(Duration::from_secs(1));
        retriever.register("pubmed", Arc::new(FailingClient));
        retriever.register("medlineplus", Arc::new(kb));

        let outcome = retriever.retrieve(&candidate("pneumonia"), &sources).await;
        assert_eq!(outcome.failed_sources, 1);
        assert_eq!(outcome.results.len(), 1);

        let outcome = retriever.retrieve(&candidate("unlisted"), &sources).await;
        assert_eq!(outcome.failed_sources, 1);
        assert!(outcome.results.is_empty());
    }

    #[tokio::test]
    async fn total_failure_yields_empty() {
        let sources = two_sources();
        let retriever =
            Retriever::with_shared_client(&sources, Arc::new(FailingClient), Duration::from_secs(1));
        let results = retriever.search_medical_sources(&candidate("pneumonia"), &sources).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn missing_client_is_skipped() {
        let sources = two_sources();
        let retriever = Retriever::new(Duration::from_secs(1));
        let results = retriever.search_medical_sources(&candidate("pneumonia"), &sources).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn slow_source_times_out() {
        let sources = two_sources();
        let retriever = Retriever::with_shared_client(
            &sources,
            Arc::new(SlowClient { delay: Duration::from_secs(10) }),
            Duration::from_millis(50),
        );
        let started = Instant::now();
        let results = retriever.search_medical_sources(&candidate("pneumonia"), &sources).await;
        assert!(results.is_empty());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn lookups_run_concurrently() {
        let sources = two_sources();
        let retriever = Retriever::with_shared_client(
            &sources,
            Arc::new(SlowClient { delay: Duration::from_millis(300) }),
            Duration::from_secs(5),
        );
        let started = Instant::now();
        let results = retriever.search_medical_sources(&candidate("pneumonia"), &sources).await;
        assert_eq!(results.len(), 2);
        // Sequential lookups would take at least 600ms
        assert!(started.elapsed() < Duration::from_millis(590));
    }

    #[tokio::test]
    async fn disabled_sources_not_queried() {
        let mut registry = SourceRegistry::builtin();
        registry.set_enabled("pubmed", false);
        let mut kb = StaticSourceClient::new();
        kb.add("pneumonia", hit("lung infection", 0.9));
        let retriever =
            Retriever::with_shared_client(registry.all(), Arc::new(kb), Duration::from_secs(1));

        let results = retriever
            .search_medical_sources(&candidate("pneumonia"), registry.all())
            .await;
        assert!(results.iter().all(|r| r.source_id != "pubmed"));
        assert_eq!(results.len(), registry.all().len() - 1);
    }

    #[test]
    fn static_client_follows_spelling_correction() {
        let kb = StaticSourceClient::builtin();
        let direct = kb.lookup("pneumonia");
        let corrected = kb.lookup("pnemonia");
        assert_eq!(direct.len(), 1);
        assert_eq!(corrected.len(), 1);
        assert!(corrected[0].confidence < direct[0].confidence);
        assert!(kb.lookup("unknownterm").is_empty());
    }

    #[test]
    fn hit_confidence_clamped_on_attribution() {
        let registry = SourceRegistry::builtin();
        let source = &registry.all()[0];
        let result = hit("x", 1.7).into_result("term", source);
        assert!((result.confidence - 1.0).abs() < f64::EPSILON);
        assert_eq!(result.trust_score, source.trust_score);
    }
}
