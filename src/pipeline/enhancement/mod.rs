//! Medical terminology enhancement for free-text reports.
//!
//! extract → retrieve → validate → build → rewrite, with a per-service
//! cache of enhancement records and running performance counters.

pub mod types;
pub mod vocabulary;
pub mod extract;
pub mod sources;
pub mod retrieval;
pub mod http_source;
pub mod validate;
pub mod builder;
pub mod rewrite;
pub mod cache;
pub mod metrics;
pub mod orchestrator;

pub use types::*;
pub use orchestrator::MedicalRagService;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnhancementError {
    #[error("Internal lock error")]
    LockPoisoned,

    #[error("Invalid preference: {0}")]
    InvalidPreference(String),

    #[error("Invalid term pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// Failure of a single knowledge-source lookup.
///
/// Always recovered inside the retriever; never surfaces from
/// `enhance_medical_report`.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Cannot reach source at {0}")]
    Connection(String),

    #[error("Source lookup timed out after {0}ms")]
    Timeout(u128),

    #[error("Source returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("No client registered for source '{0}'")]
    NoClient(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}
