//! Search provider seam and the Serper-compatible HTTP client.

use crate::config::SearchSettings;
use crate::constants::{SEARCH_COUNTRY, SEARCH_LANGUAGE};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const API_KEY_HEADER: &str = "X-API-KEY";

/// Result containers checked in order; the first non-empty one is used.
const RESULT_KEYS: [&str; 3] = ["places", "organic", "local"];

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search provider is not configured")]
    NotConfigured,
    #[error("request to search provider failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("search provider returned status {0}")]
    Status(u16),
    #[error("search provider returned an unreadable response: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Web,
    Places,
}

/// One search hit. Web results carry `link`/`snippet`; place results usually carry
/// `website`/`address` instead.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl SearchHit {
    pub fn web(title: &str, link: &str, snippet: &str) -> Self {
        Self {
            title: Some(title.into()),
            link: Some(link.into()),
            snippet: Some(snippet.into()),
            ..Self::default()
        }
    }

    /// `link`, falling back to `website`.
    pub fn url(&self) -> Option<&str> {
        non_blank(&self.link).or_else(|| non_blank(&self.website))
    }

    /// `snippet`, falling back to `address`.
    pub fn summary(&self) -> Option<&str> {
        non_blank(&self.snippet).or_else(|| non_blank(&self.address))
    }

    pub fn title(&self) -> Option<&str> {
        non_blank(&self.title)
    }

    /// Lowercased title, snippet and address for keyword checks.
    pub fn searchable_text(&self) -> String {
        [&self.title, &self.snippet, &self.address]
            .iter()
            .filter_map(|field| field.as_deref())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(
        &self,
        query: &str,
        location: &str,
        kind: SearchKind,
    ) -> Result<Vec<SearchHit>, SearchError>;
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
    location: &'a str,
    gl: &'a str,
    hl: &'a str,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<&'a str>,
}

pub struct SerperClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl SerperClient {
    pub fn new(client: reqwest::Client, settings: &SearchSettings) -> Self {
        Self {
            client,
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
        }
    }
}

/// Pull hits out of a provider response body.
pub fn parse_hits(body: &Value) -> Result<Vec<SearchHit>, SearchError> {
    if !body.is_object() {
        return Err(SearchError::Malformed("expected a JSON object".into()));
    }
    for key in RESULT_KEYS {
        if let Some(items) = body.get(key).and_then(Value::as_array) {
            if !items.is_empty() {
                return items
                    .iter()
                    .map(|item| {
                        serde_json::from_value(item.clone())
                            .map_err(|e| SearchError::Malformed(e.to_string()))
                    })
                    .collect();
            }
        }
    }
    Ok(Vec::new())
}

#[async_trait]
impl SearchProvider for SerperClient {
    async fn search(
        &self,
        query: &str,
        location: &str,
        kind: SearchKind,
    ) -> Result<Vec<SearchHit>, SearchError> {
        if self.endpoint.is_empty() {
            return Err(SearchError::NotConfigured);
        }

        let request = SearchRequest {
            q: query,
            location,
            gl: SEARCH_COUNTRY,
            hl: SEARCH_LANGUAGE,
            kind: match kind {
                SearchKind::Web => None,
                SearchKind::Places => Some("places"),
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::Malformed(e.to_string()))?;
        let hits = parse_hits(&body)?;
        tracing::debug!(query, count = hits.len(), "search provider returned hits");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_prefers_places() {
        let body = json!({
            "places": [{ "title": "Skin Clinic", "address": "Makati", "website": "https://a" }],
            "organic": [{ "title": "Other", "link": "https://b", "snippet": "x" }]
        });
        let hits = parse_hits(&body).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url(), Some("https://a"));
        assert_eq!(hits[0].summary(), Some("Makati"));
    }

    #[test]
    fn test_parse_falls_through_empty_containers() {
        let body = json!({
            "places": [],
            "organic": [],
            "local": [{ "title": "Derm Center", "link": "https://c", "snippet": "y" }]
        });
        assert_eq!(parse_hits(&body).unwrap()[0].title(), Some("Derm Center"));
    }

    #[test]
    fn test_parse_without_results() {
        assert!(parse_hits(&json!({ "searchParameters": {} })).unwrap().is_empty());
        assert!(parse_hits(&json!("nope")).is_err());
    }

    #[test]
    fn test_request_omits_type_for_web() {
        let request = SearchRequest {
            q: "q",
            location: "Manila",
            gl: SEARCH_COUNTRY,
            hl: SEARCH_LANGUAGE,
            kind: None,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body, json!({ "q": "q", "location": "Manila", "gl": "ph", "hl": "en" }));
    }
}
