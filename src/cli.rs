use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::pipeline::enhancement::{EnhanceOptions, EnhancementError, PreferencesUpdate};

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Cannot read report: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Enhancement(#[from] EnhancementError),

    #[error("Invalid source catalog: {0}")]
    SourceCatalog(String),

    #[error("Cannot serialize result: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Enhance the medical terminology of a free-text report
#[derive(Parser, Debug)]
#[command(name = "medlens", version)]
#[command(about = "Validate and correct medical terms in a report against trusted sources")]
pub struct Args {
    /// Report file to read. Reads stdin when omitted.
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Leave the report text unchanged
    #[arg(long)]
    pub no_corrections: bool,

    /// Omit synonym suggestions from the output
    #[arg(long)]
    pub no_suggestions: bool,

    /// Maximum number of suggestion entries
    #[arg(long)]
    pub max_suggestions: Option<usize>,

    /// Minimum confidence before a correction is applied
    #[arg(long)]
    pub threshold: Option<f64>,

    /// JSON catalog of HTTP knowledge sources. Each endpoint must answer
    /// `GET {base_url}/search?term=..&type=..` with `{"results": [...]}`.
    /// Without it the built-in offline knowledge base is used.
    #[arg(long, value_name = "FILE")]
    pub sources: Option<PathBuf>,
}

impl Args {
    pub fn enhance_options(&self) -> EnhanceOptions {
        EnhanceOptions {
            include_suggestions: Some(!self.no_suggestions),
            enable_corrections: Some(!self.no_corrections),
            max_suggestions: self.max_suggestions,
        }
    }

    /// Preference overrides given on the command line, if any.
    /// `--max-suggestions` is a per-call option and never touches preferences.
    pub fn preferences_update(&self) -> Option<PreferencesUpdate> {
        self.threshold.map(|threshold| PreferencesUpdate {
            confidence_threshold: Some(threshold),
            ..Default::default()
        })
    }
}
