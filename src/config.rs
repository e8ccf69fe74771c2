use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "Medlens";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Source id treated as peer-reviewed literature by the quality metrics.
pub const PEER_REVIEWED_SOURCE_ID: &str = "pubmed";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "medlens=info,medlens_lib=info"
}

/// Tunables for the enhancement pipeline.
///
/// `Default` carries the production values; `from_env()` lets operators
/// override them with `MEDLENS_*` variables without a rebuild.
#[derive(Debug, Clone, PartialEq)]
pub struct RagConfig {
    /// Results below this retrieval confidence are discarded by the validator.
    pub similarity_threshold: f64,
    /// Width of the context window captured around each extracted term.
    pub context_window: usize,
    /// Ranked results kept per term after validation.
    pub max_results_per_source: usize,
    /// Minimum enhancement confidence before a correction is written back.
    pub confidence_threshold: f64,
    /// Default cap on suggestion entries per report.
    pub max_suggestions: usize,
    /// Deadline for a single source lookup.
    pub source_timeout: Duration,
    /// Cache entry lifetime. `None` keeps entries until `clear_cache()`.
    pub cache_ttl: Option<Duration>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.75,
            context_window: 100,
            max_results_per_source: 10,
            confidence_threshold: 0.8,
            max_suggestions: 5,
            source_timeout: Duration::from_secs(5),
            cache_ttl: None,
        }
    }
}

impl RagConfig {
    /// Defaults overridden by any valid `MEDLENS_*` environment variable.
    ///
    /// Unparseable or out-of-range values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = parse_var::<f64>(&lookup, "MEDLENS_SIMILARITY_THRESHOLD") {
            if (0.0..=1.0).contains(&v) {
                config.similarity_threshold = v;
            } else {
                tracing::warn!(value = v, "MEDLENS_SIMILARITY_THRESHOLD outside [0, 1], ignored");
            }
        }
        if let Some(v) = parse_var::<f64>(&lookup, "MEDLENS_CONFIDENCE_THRESHOLD") {
            if (0.0..=1.0).contains(&v) {
                config.confidence_threshold = v;
            } else {
                tracing::warn!(value = v, "MEDLENS_CONFIDENCE_THRESHOLD outside [0, 1], ignored");
            }
        }
        if let Some(v) = parse_var::<usize>(&lookup, "MEDLENS_CONTEXT_WINDOW") {
            config.context_window = v;
        }
        if let Some(v) = parse_var::<usize>(&lookup, "MEDLENS_MAX_RESULTS") {
            config.max_results_per_source = v;
        }
        if let Some(v) = parse_var::<usize>(&lookup, "MEDLENS_MAX_SUGGESTIONS") {
            if v > 0 {
                config.max_suggestions = v;
            } else {
                tracing::warn!("MEDLENS_MAX_SUGGESTIONS must be at least 1, ignored");
            }
        }
        if let Some(v) = parse_var::<u64>(&lookup, "MEDLENS_SOURCE_TIMEOUT_MS") {
            config.source_timeout = Duration::from_millis(v);
        }
        if let Some(v) = parse_var::<u64>(&lookup, "MEDLENS_CACHE_TTL_SECS") {
            config.cache_ttl = (v > 0).then(|| Duration::from_secs(v));
        }

        config
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Invalid configuration value, ignored");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_values() {
        let config = RagConfig::default();
        assert!((config.similarity_threshold - 0.75).abs() < f64::EPSILON);
        assert_eq!(config.context_window, 100);
        assert_eq!(config.max_results_per_source, 10);
        assert!((config.confidence_threshold - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.source_timeout, Duration::from_secs(5));
        assert!(config.cache_ttl.is_none());
    }

    #[test]
    fn env_overrides_applied() {
        let config = RagConfig::from_lookup(lookup_from(&[
            ("MEDLENS_SIMILARITY_THRESHOLD", "0.6"),
            ("MEDLENS_CONTEXT_WINDOW", "40"),
            ("MEDLENS_SOURCE_TIMEOUT_MS", "250"),
            ("MEDLENS_CACHE_TTL_SECS", "3600"),
        ]));
        assert!((config.similarity_threshold - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.context_window, 40);
        assert_eq!(config.source_timeout, Duration::from_millis(250));
        assert_eq!(config.cache_ttl, Some(Duration::from_secs(3600)));
    }

    #[test]
    fn invalid_env_values_ignored() {
        let config = RagConfig::from_lookup(lookup_from(&[
            ("MEDLENS_SIMILARITY_THRESHOLD", "1.5"),
            ("MEDLENS_CONFIDENCE_THRESHOLD", "high"),
            ("MEDLENS_MAX_RESULTS", "-3"),
        ]));
        assert_eq!(config, RagConfig::default());
    }

    #[test]
    fn zero_max_suggestions_ignored() {
        let config = RagConfig::from_lookup(lookup_from(&[("MEDLENS_MAX_SUGGESTIONS", "0")]));
        assert_eq!(config.max_suggestions, 5);

        let config = RagConfig::from_lookup(lookup_from(&[("MEDLENS_MAX_SUGGESTIONS", "2")]));
        assert_eq!(config.max_suggestions, 2);
    }

    #[test]
    fn zero_ttl_means_no_expiry() {
        let config = RagConfig::from_lookup(lookup_from(&[("MEDLENS_CACHE_TTL_SECS", "0")]));
        assert!(config.cache_ttl.is_none());
    }

    #[test]
    fn app_name_is_medlens() {
        assert_eq!(APP_NAME, "Medlens");
    }
}
