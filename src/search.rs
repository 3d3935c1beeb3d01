//! Search and details flows shared by the terminal shell and the HTTP handlers.

use log::{debug, info, warn};
use serde::Serialize;

use crate::analysis::{analyze_reviews, CompletionProvider};
use crate::error::PlacesError;
use crate::google_places::{PlacesProvider, DEFAULT_RADIUS};
use crate::models::{AnalyzedPlace, BusinessSummary, Coordinate, SearchResults};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchSource {
    Nearby,
    TextFallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BusinessSearch {
    pub status: String,
    pub results: Vec<BusinessSummary>,
    pub source: SearchSource,
}

impl BusinessSearch {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Nearby search, falling back to a single text search when it comes back empty.
pub async fn find_businesses(
    places: &dyn PlacesProvider,
    location: Coordinate,
    keyword: Option<&str>,
) -> BusinessSearch {
    let nearby = places
        .nearby_search(location, DEFAULT_RADIUS, keyword)
        .await
        .unwrap_or_else(|e| {
            warn!("Nearby search failed, treating as no results: {}", e);
            SearchResults::empty("REQUEST_FAILED")
        });

    if !nearby.results.is_empty() {
        info!("Nearby search found {} businesses", nearby.results.len());
        return BusinessSearch {
            status: nearby.status,
            results: nearby.results,
            source: SearchSource::Nearby,
        };
    }

    info!("No nearby results (status {}), trying text search", nearby.status);
    let fallback = places
        .text_search(keyword, Some(location))
        .await
        .unwrap_or_else(|e| {
            warn!("Text search failed, treating as no results: {}", e);
            SearchResults::empty("REQUEST_FAILED")
        });
    debug!("Text search returned {} businesses", fallback.results.len());

    BusinessSearch {
        status: fallback.status,
        results: fallback.results,
        source: SearchSource::TextFallback,
    }
}

pub fn no_results_message(keyword: Option<&str>) -> String {
    match keyword {
        Some(keyword) => format!("No businesses found matching '{}'!", keyword),
        None => "No businesses found!".to_string(),
    }
}

/// Fetch details and, when the place has reviews, a recommendation summary.
pub async fn fetch_place(
    places: &dyn PlacesProvider,
    analyst: &dyn CompletionProvider,
    place_id: &str,
) -> Result<AnalyzedPlace, PlacesError> {
    let detail = places.place_details(place_id).await?;

    let ai_analysis = if detail.reviews.is_empty() {
        debug!("{} has no reviews, skipping analysis", detail.name);
        None
    } else {
        analyze_reviews(analyst, &detail.name, &detail.reviews).await
    };

    Ok(AnalyzedPlace { detail, ai_analysis })
}


#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;

    const HERE: Coordinate = Coordinate { lat: 42.9634, lng: -85.6681 };

    #[tokio::test]
    async fn test_nearby_results_skip_fallback() {
        let places = FakePlaces {
            nearby: vec![business("a", "Luigi's"), business("b", "Bella")],
            ..Default::default()
        };
        let search = find_businesses(&places, HERE, Some("pizza")).await;

        assert_eq!(search.source, SearchSource::Nearby);
        assert_eq!(search.status, "OK");
        assert_eq!(search.results.len(), 2);
        assert_eq!(search.results[0].name, "Luigi's");
        assert_eq!(
            places.calls(),
            vec![Call::Nearby(HERE, DEFAULT_RADIUS, Some("pizza".to_string()))]
        );
    }

    #[tokio::test]
    async fn test_empty_nearby_falls_back_once_with_same_keyword() {
        let places = FakePlaces {
            text: vec![business("t", "Taqueria")],
            ..Default::default()
        };
        let search = find_businesses(&places, HERE, Some("cantina")).await;

        assert_eq!(search.source, SearchSource::TextFallback);
        assert_eq!(search.results.len(), 1);
        assert_eq!(
            places.calls(),
            vec![
                Call::Nearby(HERE, DEFAULT_RADIUS, Some("cantina".to_string())),
                Call::Text(Some("cantina".to_string()), Some(HERE)),
            ]
        );
    }

    #[tokio::test]
    async fn test_both_searches_empty() {
        let places = FakePlaces::default();
        let search = find_businesses(&places, HERE, None).await;

        assert!(search.is_empty());
        assert_eq!(search.status, "ZERO_RESULTS");
        let text_calls = places
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Text(..)))
            .count();
        assert_eq!(text_calls, 1);
    }

    #[tokio::test]
    async fn test_failed_nearby_is_treated_as_empty() {
        let places = FakePlaces {
            nearby_fails: true,
            text: vec![business("t", "Taqueria")],
            ..Default::default()
        };
        let search = find_businesses(&places, HERE, None).await;
        assert_eq!(search.source, SearchSource::TextFallback);
        assert_eq!(search.results[0].place_id, "t");
    }

    #[tokio::test]
    async fn test_failed_fallback_yields_empty_result() {
        let places = FakePlaces {
            text_fails: true,
            ..Default::default()
        };
        let search = find_businesses(&places, HERE, Some("ramen")).await;

        assert!(search.is_empty());
        assert_eq!(search.source, SearchSource::TextFallback);
        assert_eq!(search.status, "REQUEST_FAILED");
        assert_eq!(
            places.calls(),
            vec![
                Call::Nearby(HERE, DEFAULT_RADIUS, Some("ramen".to_string())),
                Call::Text(Some("ramen".to_string()), Some(HERE)),
            ]
        );
    }

    #[test]
    fn test_no_results_message() {
        assert_eq!(no_results_message(Some("sushi")), "No businesses found matching 'sushi'!");
        assert_eq!(no_results_message(None), "No businesses found!");
    }

    #[tokio::test]
    async fn test_fetch_place_with_reviews_is_analyzed() {
        let places = FakePlaces {
            details: Some(detail("Luigi's", vec![review(5, "great"), review(3, "ok")])),
            ..Default::default()
        };
        let analyst = FakeAnalyst::replying("Go for the lasagna.");

        let place = fetch_place(&places, &analyst, "abc").await.unwrap();
        assert_eq!(place.detail.place_id, "abc");
        assert_eq!(place.ai_analysis.as_deref(), Some("Go for the lasagna."));
        assert!(analyst.prompts.lock().unwrap()[0].contains("4.0/5"));
    }

    #[tokio::test]
    async fn test_fetch_place_without_reviews_skips_analysis() {
        let places = FakePlaces {
            details: Some(detail("Quiet Cafe", vec![])),
            ..Default::default()
        };
        let analyst = FakeAnalyst::replying("unused");

        let place = fetch_place(&places, &analyst, "abc").await.unwrap();
        assert_eq!(place.ai_analysis, None);
        assert_eq!(analyst.prompt_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_place_status_failure() {
        let places = FakePlaces {
            details_status: Some("INVALID_REQUEST".to_string()),
            ..Default::default()
        };
        let analyst = FakeAnalyst::replying("unused");

        let err = fetch_place(&places, &analyst, "abc").await.unwrap_err();
        assert_eq!(err.provider_status(), Some("INVALID_REQUEST"));
        assert_eq!(analyst.prompt_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_place_survives_analysis_failure() {
        let places = FakePlaces {
            details: Some(detail("Luigi's", vec![review(1, "cold")])),
            ..Default::default()
        };
        let analyst = FakeAnalyst::default();

        let place = fetch_place(&places, &analyst, "abc").await.unwrap();
        assert_eq!(place.ai_analysis, None);
        assert_eq!(analyst.prompt_count(), 1);
    }
}
