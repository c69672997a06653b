//! Specialist and clinic enrichment.
//!
//! [`Enricher`] runs the specialist and clinic lookups for a classification concurrently.
//! Each lookup checks its own cache, queries the [`SearchProvider`] on a miss, filters and
//! truncates the hits and caches the result. A failing lookup yields an empty list and never
//! affects the other one.

mod filters;
mod search;

pub use filters::{has_excluded_term, normalise_name, select_clinics, select_specialists};
pub use search::{parse_hits, SearchError, SearchHit, SearchKind, SearchProvider, SerperClient};

use crate::best_effort::best_effort_or_default;
use crate::cache::ExpiringCache;
use crate::clock::Clock;
use crate::constants::{MAX_CACHED_SEARCHES, UNCLASSIFIED_LABEL};
use api_shared::{Clinic, Specialist};
use std::sync::Arc;

/// Search term used when a result has no concrete label.
const GENERIC_SEARCH_TERM: &str = "skin condition";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    pub specialists: Vec<Specialist>,
    pub clinics: Vec<Clinic>,
}

/// (normalised condition, normalised location)
type CacheKey = (String, String);

pub struct Enricher {
    provider: Arc<dyn SearchProvider>,
    specialists: ExpiringCache<CacheKey, Vec<Specialist>>,
    clinics: ExpiringCache<CacheKey, Vec<Clinic>>,
    default_location: String,
}

impl Enricher {
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        clock: Arc<dyn Clock>,
        cache_ttl: chrono::Duration,
        default_location: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            specialists: ExpiringCache::new(cache_ttl, MAX_CACHED_SEARCHES, Arc::clone(&clock)),
            clinics: ExpiringCache::new(cache_ttl, MAX_CACHED_SEARCHES, clock),
            default_location: default_location.into(),
        }
    }

    /// Specialists and clinics for `classification` near `location` (default location when
    /// absent or blank).
    pub async fn enrich(&self, classification: &str, location: Option<&str>) -> Enrichment {
        let location = self.resolve_location(location);
        let (specialists, clinics) = tokio::join!(
            self.find_specialists(classification, &location),
            self.find_clinics(classification, &location)
        );
        Enrichment {
            specialists,
            clinics,
        }
    }

    pub async fn find_specialists(&self, classification: &str, location: &str) -> Vec<Specialist> {
        let term = search_term(classification);
        let key = cache_key(term, location);
        if let Some(cached) = self.specialists.get(&key) {
            tracing::debug!(condition = term, location, "specialist cache hit");
            return cached;
        }

        let query = format!("dermatologist doctor specialist for {} in {}", term, location);
        let hits = best_effort_or_default(
            "specialist search",
            self.provider.search(&query, location, SearchKind::Web),
        )
        .await;
        if hits.is_empty() {
            tracing::warn!(condition = term, location, "no specialist results found");
            return Vec::new();
        }

        let specialists = select_specialists(&hits, classification);
        self.specialists.insert(key, specialists.clone());
        specialists
    }

    pub async fn find_clinics(&self, classification: &str, location: &str) -> Vec<Clinic> {
        let term = search_term(classification);
        let key = cache_key(term, location);
        if let Some(cached) = self.clinics.get(&key) {
            tracing::debug!(condition = term, location, "clinic cache hit");
            return cached;
        }

        let query = format!(
            "dermatology clinic {} treatment skin specialist near {}",
            term, location
        );
        let hits = best_effort_or_default(
            "clinic search",
            self.provider.search(&query, location, SearchKind::Places),
        )
        .await;
        if hits.is_empty() {
            tracing::warn!(condition = term, location, "no clinic results found");
            return Vec::new();
        }

        let clinics = select_clinics(&hits, classification);
        self.clinics.insert(key, clinics.clone());
        clinics
    }

    fn resolve_location(&self, location: Option<&str>) -> String {
        location
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(self.default_location.as_str())
            .to_string()
    }
}

fn search_term(classification: &str) -> &str {
    let trimmed = classification.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(UNCLASSIFIED_LABEL) {
        GENERIC_SEARCH_TERM
    } else {
        trimmed
    }
}

fn cache_key(term: &str, location: &str) -> CacheKey {
    (normalise_name(term), normalise_name(location))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeSearch {
        calls: Mutex<Vec<(String, String, SearchKind)>>,
        fail_places: bool,
    }

    impl FakeSearch {
        fn calls(&self) -> Vec<(String, String, SearchKind)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SearchProvider for FakeSearch {
        async fn search(
            &self,
            query: &str,
            location: &str,
            kind: SearchKind,
        ) -> Result<Vec<SearchHit>, SearchError> {
            self.calls
                .lock()
                .unwrap()
                .push((query.to_string(), location.to_string(), kind));
            match kind {
                SearchKind::Web => Ok(vec![
                    SearchHit::web("Dr. Ana Cruz", "https://a", "Acne care"),
                    SearchHit::web("Acne blog", "https://b", "dermatologist tips"),
                ]),
                SearchKind::Places if self.fail_places => Err(SearchError::Status(503)),
                SearchKind::Places => Ok(vec![SearchHit::web(
                    "Makati Skin Clinic",
                    "https://c",
                    "Ayala Ave",
                )]),
            }
        }
    }

    fn enricher(provider: Arc<FakeSearch>, clock: Arc<ManualClock>) -> Enricher {
        Enricher::new(provider, clock, Duration::hours(24), "Philippines")
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()))
    }

    #[tokio::test]
    async fn test_enrich_builds_queries_and_filters() {
        let provider = Arc::new(FakeSearch::default());
        let enrichment = enricher(provider.clone(), clock())
            .enrich("Acne", Some("Makati"))
            .await;

        assert_eq!(enrichment.specialists.len(), 1);
        assert_eq!(enrichment.specialists[0].name, "Dr. Ana Cruz");
        assert_eq!(enrichment.clinics.len(), 1);
        assert_eq!(enrichment.clinics[0].condition, "Acne");

        let calls = provider.calls();
        assert!(calls.contains(&(
            "dermatologist doctor specialist for Acne in Makati".into(),
            "Makati".into(),
            SearchKind::Web
        )));
        assert!(calls.contains(&(
            "dermatology clinic Acne treatment skin specialist near Makati".into(),
            "Makati".into(),
            SearchKind::Places
        )));
    }

    #[tokio::test]
    async fn test_second_lookup_hits_cache() {
        let provider = Arc::new(FakeSearch::default());
        let enricher = enricher(provider.clone(), clock());

        let first = enricher.enrich("Acne", Some("Makati")).await;
        let second = enricher.enrich("acne", Some(" makati ")).await;

        assert_eq!(first, second);
        assert_eq!(provider.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_cache_expires() {
        let provider = Arc::new(FakeSearch::default());
        let clock = clock();
        let enricher = enricher(provider.clone(), clock.clone());

        enricher.enrich("Acne", None).await;
        clock.advance(Duration::hours(25));
        enricher.enrich("Acne", None).await;

        assert_eq!(provider.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_specialists_and_clinics_cached_separately() {
        let provider = Arc::new(FakeSearch::default());
        let enricher = enricher(provider.clone(), clock());

        let specialists = enricher.find_specialists("Acne", "Manila").await;
        let clinics = enricher.find_clinics("Acne", "Manila").await;

        assert_eq!(specialists[0].name, "Dr. Ana Cruz");
        assert_eq!(clinics[0].title, "Makati Skin Clinic");
    }

    #[tokio::test]
    async fn test_failing_leg_degrades_to_empty() {
        let provider = Arc::new(FakeSearch {
            fail_places: true,
            ..FakeSearch::default()
        });
        let enricher = enricher(provider.clone(), clock());

        let enrichment = enricher.enrich("Acne", None).await;
        assert_eq!(enrichment.specialists.len(), 1);
        assert!(enrichment.clinics.is_empty());

        // failures are not cached
        enricher.enrich("Acne", None).await;
        let places_calls = provider
            .calls()
            .iter()
            .filter(|(_, _, kind)| *kind == SearchKind::Places)
            .count();
        assert_eq!(places_calls, 2);
    }

    #[tokio::test]
    async fn test_default_location_and_generic_term() {
        let provider = Arc::new(FakeSearch::default());
        enricher(provider.clone(), clock())
            .enrich(UNCLASSIFIED_LABEL, Some("  "))
            .await;

        assert!(provider.calls().contains(&(
            "dermatologist doctor specialist for skin condition in Philippines".into(),
            "Philippines".into(),
            SearchKind::Web
        )));
    }
}
