use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse classification of an extracted term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermType {
    Anatomy,
    Pathology,
    Procedure,
    Finding,
    Measurement,
    Abbreviation,
    General,
}

impl TermType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anatomy => "anatomy",
            Self::Pathology => "pathology",
            Self::Procedure => "procedure",
            Self::Finding => "finding",
            Self::Measurement => "measurement",
            Self::Abbreviation => "abbreviation",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for TermType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A substring of the report flagged as a medical term worth validating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermCandidate {
    /// Normalized lowercase form, unique within one extraction.
    pub term: String,
    /// Exact matched text, case preserved.
    pub original_term: String,
    /// Byte offset of the first occurrence.
    pub position: usize,
    pub context: String,
    pub term_type: TermType,
}

impl TermCandidate {
    /// Cache key: `{term}_{type}`.
    pub fn cache_key(&self) -> String {
        format!("{}_{}", self.term, self.term_type)
    }
}

/// An external authority consulted for term definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSource {
    pub id: String,
    pub name: String,
    pub base_url: String,
    /// Static authority rating, 0-100.
    pub trust_score: u8,
    pub enabled: bool,
    /// Lower is consulted first.
    pub priority: u32,
    pub categories: Vec<String>,
}

/// One raw hit for a term from one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub term: String,
    pub source: String,
    pub source_id: String,
    pub trust_score: u8,
    pub definition: String,
    pub synonyms: Vec<String>,
    pub clinical_context: String,
    pub severity: String,
    pub related_terms: Vec<String>,
    /// Retrieval match confidence, 0-1.
    pub confidence: f64,
    pub url: String,
    pub last_updated: DateTime<Utc>,
}

impl SearchResult {
    /// Ranking score: confidence weighted by source trust.
    pub fn rank_score(&self) -> f64 {
        self.confidence * f64::from(self.trust_score)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub term: String,
    pub definition: String,
    pub confidence: f64,
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionType {
    Spelling,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionSuggestion {
    pub suggested: String,
    pub confidence: f64,
    pub correction_type: CorrectionType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermSuggestions {
    pub synonyms: Vec<String>,
    pub alternatives: Vec<Alternative>,
    pub corrections: Vec<CorrectionSuggestion>,
    pub contextual_terms: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodySystem {
    Cardiovascular,
    Respiratory,
    Nervous,
    Musculoskeletal,
    Gastrointestinal,
    Urogenital,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinicalSignificance {
    High,
    Moderate,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalContext {
    pub severity: String,
    pub body_system: BodySystem,
    pub imaging_findings: Vec<String>,
    pub clinical_significance: ClinicalSignificance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAttribution {
    pub name: String,
    pub url: String,
    pub trust_score: u8,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// More than one validated result agreed on the term.
    pub source_consensus: bool,
    pub peer_reviewed: bool,
    /// At least one result updated within the last 365 days.
    pub recently_updated: bool,
}

/// Validated, enriched description of one term. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancementRecord {
    pub original_term: String,
    pub validated_definition: String,
    pub confidence: f64,
    pub suggestions: TermSuggestions,
    pub clinical_context: ClinicalContext,
    pub sources: Vec<SourceAttribution>,
    pub quality_metrics: QualityMetrics,
}

/// A term paired with the enhancement it resolved to in one analysis.
#[derive(Debug, Clone)]
pub struct ProcessedTerm {
    pub candidate: TermCandidate,
    pub enhancement: Arc<EnhancementRecord>,
}

/// A correction written back into the enhanced report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub original: String,
    pub corrected: String,
    pub confidence: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub term: String,
    pub synonyms: Vec<String>,
    pub confidence: f64,
}

/// Top-level result of `enhance_medical_report`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub analysis_id: Uuid,
    pub original_report: String,
    pub enhanced_report: String,
    pub corrections: Vec<Correction>,
    pub suggestions: Vec<Suggestion>,
    /// Mean of per-term enhancement confidences, 0 when no terms.
    pub confidence: f64,
    pub sources: Vec<String>,
    pub processing_time_ms: u64,
    pub terms_processed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set when the pipeline failed and the report was returned unchanged.
    /// Callers should present the result as a partial analysis.
    #[serde(default)]
    pub fallback_used: bool,
}

/// Per-service preferences, mutable through `update_user_preferences`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Source ids to consult. Empty means every enabled source.
    pub preferred_sources: Vec<String>,
    pub confidence_threshold: f64,
    pub max_suggestions: usize,
}

/// Partial update for `UserPreferences`. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferencesUpdate {
    pub preferred_sources: Option<Vec<String>>,
    pub confidence_threshold: Option<f64>,
    pub max_suggestions: Option<usize>,
}

/// Per-call options. Unset fields fall back to preferences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnhanceOptions {
    pub include_suggestions: Option<bool>,
    pub enable_corrections: Option<bool>,
    pub max_suggestions: Option<usize>,
}
