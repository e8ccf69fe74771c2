//! HTTP adapter for knowledge sources exposing a search endpoint.
//!
//! Wire contract: `GET {base_url}/search?term=<term>&type=<term type>`
//! answering `{"results": [SourceHit, ...]}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::retrieval::{SourceClient, SourceHit};
use super::types::{KnowledgeSource, SearchResult, TermCandidate};
use super::SourceError;
use crate::config::{APP_NAME, APP_VERSION};

/// Response body from `/search`
#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<SourceHit>,
}

/// Async HTTP client shared by every HTTP-backed source.
pub struct HttpSourceClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpSourceClient {
    pub fn new(timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("{APP_NAME}/{APP_VERSION}"))
            .build()
            .map_err(|e| SourceError::HttpClient(e.to_string()))?;

        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl SourceClient for HttpSourceClient {
    async fn search(
        &self,
        source: &KnowledgeSource,
        term: &TermCandidate,
    ) -> Result<Vec<SearchResult>, SourceError> {
        let url = format!("{}/search", source.base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .query(&[("term", term.term.as_str()), ("type", term.term_type.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    SourceError::Connection(source.base_url.clone())
                } else if e.is_timeout() {
                    SourceError::Timeout(self.timeout.as_millis())
                } else {
                    SourceError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| SourceError::ResponseParsing(e.to_string()))?;

        Ok(parsed
            .results
            .into_iter()
            .map(|hit| hit.into_result(&term.term, source))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::enhancement::types::TermType;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::collections::HashMap;

    async fn spawn_source(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn source_at(base_url: &str) -> KnowledgeSource {
        KnowledgeSource {
            id: "local".into(),
            name: "Local Reference".into(),
            base_url: base_url.into(),
            trust_score: 80,
            enabled: true,
            priority: 1,
            categories: vec![],
        }
    }

    fn candidate(term: &str) -> TermCandidate {
        TermCandidate {
            term: term.into(),
            original_term: term.into(),
            position: 0,
            context: term.into(),
            term_type: TermType::Pathology,
        }
    }

    async fn echo_search(Query(params): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
        let term = params.get("term").cloned().unwrap_or_default();
        let term_type = params.get("type").cloned().unwrap_or_default();
        Json(serde_json::json!({
            "results": [{
                "definition": format!("{term} ({term_type})"),
                "synonyms": ["lung infection"],
                "confidence": 0.9,
                "url": "https://example.org/pneumonia",
                "last_updated": "2026-01-01T00:00:00Z"
            }]
        }))
    }

    #[tokio::test]
    async fn search_returns_attributed_results() {
        let base = spawn_source(Router::new().route("/search", get(echo_search))).await;
        let client = HttpSourceClient::new(Duration::from_secs(5)).unwrap();
        let source = source_at(&format!("{base}/"));

        let results = client.search(&source, &candidate("pneumonia")).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].definition, "pneumonia (pathology)");
        assert_eq!(results[0].source, "Local Reference");
        assert_eq!(results[0].source_id, "local");
        assert_eq!(results[0].trust_score, 80);
        assert_eq!(results[0].synonyms, vec!["lung infection"]);
        assert!(results[0].related_terms.is_empty());
    }

    #[tokio::test]
    async fn error_status_maps_to_http_error() {
        let router = Router::new().route(
            "/search",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        );
        let base = spawn_source(router).await;
        let client = HttpSourceClient::new(Duration::from_secs(5)).unwrap();

        let err = client
            .search(&source_at(&base), &candidate("pneumonia"))
            .await
            .unwrap_err();
        match err {
            SourceError::Http { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_maps_to_parse_error() {
        let router = Router::new().route("/search", get(|| async { "not json" }));
        let base = spawn_source(router).await;
        let client = HttpSourceClient::new(Duration::from_secs(5)).unwrap();

        let err = client
            .search(&source_at(&base), &candidate("pneumonia"))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::ResponseParsing(_)));
    }

    #[tokio::test]
    async fn unreachable_source_maps_to_connection_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpSourceClient::new(Duration::from_secs(5)).unwrap();
        let err = client
            .search(&source_at(&format!("http://{addr}")), &candidate("pneumonia"))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Connection(_)));
    }
}
