use super::types::KnowledgeSource;

fn source(
    id: &str,
    name: &str,
    base_url: &str,
    trust_score: u8,
    priority: u32,
    categories: &[&str],
) -> KnowledgeSource {
    KnowledgeSource {
        id: id.into(),
        name: name.into(),
        base_url: base_url.into(),
        trust_score,
        enabled: true,
        priority,
        categories: categories.iter().map(|c| c.to_string()).collect(),
    }
}

/// Catalog of knowledge sources. Read-only once the service is built.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Vec<KnowledgeSource>,
}

impl SourceRegistry {
    pub fn with_sources(sources: Vec<KnowledgeSource>) -> Self {
        Self { sources }
    }

    /// Built-in catalog of medical reference sources.
    pub fn builtin() -> Self {
        Self::with_sources(vec![
            source(
                "pubmed",
                "PubMed",
                "https://pubmed.ncbi.nlm.nih.gov",
                95,
                1,
                &["literature", "pathology", "procedure"],
            ),
            source(
                "medlineplus",
                "MedlinePlus",
                "https://medlineplus.gov",
                90,
                2,
                &["definitions", "pathology", "anatomy"],
            ),
            source(
                "radiopaedia",
                "Radiopaedia",
                "https://radiopaedia.org",
                88,
                3,
                &["imaging", "finding", "anatomy"],
            ),
            source(
                "snomed",
                "SNOMED CT Browser",
                "https://browser.ihtsdotools.org",
                92,
                4,
                &["terminology", "abbreviation"],
            ),
            source(
                "icd11",
                "ICD-11",
                "https://icd.who.int",
                90,
                5,
                &["classification", "pathology"],
            ),
            source(
                "merck",
                "Merck Manual",
                "https://www.merckmanuals.com",
                85,
                6,
                &["clinical", "pathology", "procedure"],
            ),
        ])
    }

    /// Catalog read from a JSON array of `KnowledgeSource` objects.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let sources: Vec<KnowledgeSource> = serde_json::from_str(json)?;
        Ok(Self::with_sources(sources))
    }

    pub fn all(&self) -> &[KnowledgeSource] {
        &self.sources
    }

    pub fn get(&self, id: &str) -> Option<&KnowledgeSource> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Toggle a source. Returns false if the id is unknown.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.sources.iter_mut().find(|s| s.id == id) {
            Some(s) => {
                s.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Enabled sources in priority order, restricted to `preferred` ids
    /// when that list is non-empty.
    pub fn enabled_sources(&self, preferred: &[String]) -> Vec<KnowledgeSource> {
        let mut enabled: Vec<KnowledgeSource> = self
            .sources
            .iter()
            .filter(|s| s.enabled)
            .filter(|s| preferred.is_empty() || preferred.iter().any(|p| *p == s.id))
            .cloned()
            .collect();
        enabled.sort_by_key(|s| s.priority);
        enabled
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
