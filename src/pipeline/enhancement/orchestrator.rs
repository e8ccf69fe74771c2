use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Instant;

use tracing::Instrument;
use uuid::Uuid;

use super::builder::{fallback_enhancement, generate_term_enhancement};
use super::cache::EnhancementCache;
use super::extract::extract_medical_terms;
use super::http_source::HttpSourceClient;
use super::metrics::{PerformanceStats, PerformanceTracker};
use super::retrieval::{Retriever, StaticSourceClient};
use super::rewrite::{aggregate_sources, apply_corrections, collect_suggestions, mean_confidence};
use super::sources::SourceRegistry;
use super::types::{
    AnalysisResult, EnhanceOptions, EnhancementRecord, KnowledgeSource, PreferencesUpdate,
    ProcessedTerm, TermCandidate, UserPreferences,
};
use super::validate::validate_search_results;
use super::EnhancementError;
use crate::config::RagConfig;

/// Terminology enhancement service.
///
/// Coordinates: extract → retrieve → validate → build → rewrite.
/// Shareable across tasks as `Arc<MedicalRagService>`; the cache and the
/// tracker are guarded independently so concurrent analyses only contend
/// on short critical sections.
pub struct MedicalRagService {
    config: RagConfig,
    registry: SourceRegistry,
    retriever: Retriever,
    cache: Mutex<EnhancementCache>,
    tracker: Mutex<PerformanceTracker>,
    preferences: RwLock<UserPreferences>,
}

impl MedicalRagService {
    pub fn new(config: RagConfig, registry: SourceRegistry, retriever: Retriever) -> Self {
        let preferences = UserPreferences {
            preferred_sources: Vec::new(),
            confidence_threshold: config.confidence_threshold,
            max_suggestions: config.max_suggestions,
        };

        Self {
            cache: Mutex::new(EnhancementCache::new(config.cache_ttl)),
            tracker: Mutex::new(PerformanceTracker::new()),
            preferences: RwLock::new(preferences),
            config,
            registry,
            retriever,
        }
    }

    /// Service backed by the built-in source catalog and knowledge base.
    /// Needs no network access.
    pub fn offline(config: RagConfig) -> Self {
        let registry = SourceRegistry::builtin();
        let retriever = Retriever::with_shared_client(
            registry.all(),
            Arc::new(StaticSourceClient::builtin()),
            config.source_timeout,
        );
        Self::new(config, registry, retriever)
    }

    /// Service querying every source in `registry` over HTTP.
    pub fn with_http_clients(
        config: RagConfig,
        registry: SourceRegistry,
    ) -> Result<Self, EnhancementError> {
        let client = HttpSourceClient::new(config.source_timeout)?;
        let retriever =
            Retriever::with_shared_client(registry.all(), Arc::new(client), config.source_timeout);
        Ok(Self::new(config, registry, retriever))
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Analyse a report and return its enhanced form.
    ///
    /// Never fails: a pipeline error yields the report unchanged with
    /// `fallback_used` set and the error message attached.
    pub async fn enhance_medical_report(
        &self,
        text: &str,
        options: &EnhanceOptions,
    ) -> AnalysisResult {
        let started = Instant::now();
        let analysis_id = Uuid::new_v4();
        let span = tracing::info_span!("enhance_report", %analysis_id);

        let outcome = self
            .try_enhance(analysis_id, text, options)
            .instrument(span)
            .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        self.record_timing(elapsed_ms);

        match outcome {
            Ok(mut result) => {
                result.processing_time_ms = elapsed_ms;
                tracing::info!(
                    %analysis_id,
                    terms = result.terms_processed,
                    corrections = result.corrections.len(),
                    suggestions = result.suggestions.len(),
                    confidence = result.confidence,
                    elapsed_ms,
                    "Report enhanced"
                );
                result
            }
            Err(e) => {
                tracing::error!(
                    %analysis_id,
                    error = %e,
                    elapsed_ms,
                    "Enhancement failed, returning original report"
                );
                AnalysisResult {
                    analysis_id,
                    original_report: text.to_string(),
                    enhanced_report: text.to_string(),
                    corrections: Vec::new(),
                    suggestions: Vec::new(),
                    confidence: 0.0,
                    sources: Vec::new(),
                    processing_time_ms: elapsed_ms,
                    terms_processed: 0,
                    error: Some(e.to_string()),
                    fallback_used: true,
                }
            }
        }
    }

    async fn try_enhance(
        &self,
        analysis_id: Uuid,
        text: &str,
        options: &EnhanceOptions,
    ) -> Result<AnalysisResult, EnhancementError> {
        let preferences = self.user_preferences()?;

        let candidates = extract_medical_terms(text, self.config.context_window);
        let sources = self.registry.enabled_sources(&preferences.preferred_sources);
        tracing::debug!(
            terms = candidates.len(),
            sources = sources.len(),
            "Processing extracted terms"
        );

        // One term at a time, in extraction order; only the per-source
        // lookups of a single term run concurrently.
        let mut processed: Vec<ProcessedTerm> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let enhancement = self.process_term(&candidate, &sources).await;
            processed.push(ProcessedTerm {
                candidate,
                enhancement,
            });
        }

        let (enhanced_report, corrections) = if options.enable_corrections.unwrap_or(true) {
            apply_corrections(text, &processed, preferences.confidence_threshold)?
        } else {
            (text.to_string(), Vec::new())
        };

        let suggestions = if options.include_suggestions.unwrap_or(true) {
            let max = options.max_suggestions.unwrap_or(preferences.max_suggestions);
            collect_suggestions(&processed, max)
        } else {
            Vec::new()
        };

        Ok(AnalysisResult {
            analysis_id,
            original_report: text.to_string(),
            enhanced_report,
            corrections,
            suggestions,
            confidence: mean_confidence(&processed),
            sources: aggregate_sources(&processed),
            processing_time_ms: 0,
            terms_processed: processed.len(),
            error: None,
            fallback_used: false,
        })
    }

    /// Resolve one term, falling back to the low-information record when
    /// processing fails.
    async fn process_term(
        &self,
        term: &TermCandidate,
        sources: &[KnowledgeSource],
    ) -> Arc<EnhancementRecord> {
        match self.try_process_term(term, sources).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(term = %term.term, error = %e, "Term processing failed, using fallback");
                Arc::new(fallback_enhancement(term))
            }
        }
    }

    async fn try_process_term(
        &self,
        term: &TermCandidate,
        sources: &[KnowledgeSource],
    ) -> Result<Arc<EnhancementRecord>, EnhancementError> {
        let key = term.cache_key();
        let cached = self.lock_cache()?.get(&key);
        if let Some(cached) = cached {
            tracing::debug!(term = %term.term, "Cache hit");
            return Ok(cached);
        }

        let outcome = self.retriever.retrieve(term, sources).await;
        let degraded = outcome.results.is_empty() && outcome.failed_sources > 0;
        let validated = validate_search_results(
            outcome.results,
            term,
            self.config.similarity_threshold,
            self.config.max_results_per_source,
        );
        let record = Arc::new(generate_term_enhancement(term, &validated));

        // Records built while every lookup came back empty-handed through
        // failures are never cached.
        if degraded {
            tracing::debug!(
                term = %term.term,
                failed = outcome.failed_sources,
                "Not caching degraded record"
            );
        } else {
            self.lock_cache()?.set(key, record.clone());
        }
        Ok(record)
    }

    fn record_timing(&self, elapsed_ms: u64) {
        match self.tracker.lock() {
            Ok(mut tracker) => tracker.update_performance_metrics(elapsed_ms),
            Err(_) => tracing::warn!("Performance tracker lock poisoned, timing dropped"),
        }
    }

    fn lock_cache(&self) -> Result<MutexGuard<'_, EnhancementCache>, EnhancementError> {
        self.cache.lock().map_err(|_| EnhancementError::LockPoisoned)
    }

    // ═══════════════════════════════════════════════════════════
    // Management
    // ═══════════════════════════════════════════════════════════

    /// Apply a partial preferences update and return the result.
    ///
    /// The update is validated as a whole; on error nothing changes.
    pub fn update_user_preferences(
        &self,
        update: PreferencesUpdate,
    ) -> Result<UserPreferences, EnhancementError> {
        if let Some(threshold) = update.confidence_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(EnhancementError::InvalidPreference(format!(
                    "confidence_threshold must be within [0, 1], got {threshold}"
                )));
            }
        }
        if update.max_suggestions == Some(0) {
            return Err(EnhancementError::InvalidPreference(
                "max_suggestions must be at least 1".into(),
            ));
        }
        if let Some(ids) = &update.preferred_sources {
            if let Some(unknown) = ids.iter().find(|id| !self.registry.contains(id)) {
                return Err(EnhancementError::InvalidPreference(format!(
                    "unknown source '{unknown}'"
                )));
            }
        }

        let mut preferences = self
            .preferences
            .write()
            .map_err(|_| EnhancementError::LockPoisoned)?;
        if let Some(ids) = update.preferred_sources {
            preferences.preferred_sources = ids;
        }
        if let Some(threshold) = update.confidence_threshold {
            preferences.confidence_threshold = threshold;
        }
        if let Some(max) = update.max_suggestions {
            preferences.max_suggestions = max;
        }

        tracing::info!(
            preferred_sources = preferences.preferred_sources.len(),
            confidence_threshold = preferences.confidence_threshold,
            max_suggestions = preferences.max_suggestions,
            "User preferences updated"
        );
        Ok(preferences.clone())
    }

    pub fn user_preferences(&self) -> Result<UserPreferences, EnhancementError> {
        self.preferences
            .read()
            .map(|p| p.clone())
            .map_err(|_| EnhancementError::LockPoisoned)
    }

    pub fn get_performance_stats(&self) -> Result<PerformanceStats, EnhancementError> {
        let (size, hits, misses) = {
            let cache = self.lock_cache()?;
            (cache.len(), cache.hits(), cache.misses())
        };
        let tracker = self
            .tracker
            .lock()
            .map_err(|_| EnhancementError::LockPoisoned)?;
        Ok(tracker.stats(size, hits, misses))
    }

    pub fn clear_cache(&self) -> Result<(), EnhancementError> {
        let mut cache = self.lock_cache()?;
        let dropped = cache.len();
        cache.clear();
        tracing::info!(dropped, "Enhancement cache cleared");
        Ok(())
    }
}
