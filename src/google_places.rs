use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use log::{info, error, debug};

use crate::config::Settings;
use crate::error::PlacesError;
use crate::models::{Coordinate, Geometry, PlaceDetail, SearchResults};

/// Search radius used when the caller does not pick one.
pub const DEFAULT_RADIUS: u32 = 5000;
/// Radius used to bias a text search around a coordinate.
pub const TEXT_SEARCH_RADIUS: u32 = 5000;
/// Category applied to keyword searches.
pub const RESTAURANT_TYPE: &str = "restaurant";
/// Field set requested from the details endpoint.
pub const DETAIL_FIELDS: &str = "name,rating,formatted_phone_number,formatted_address,reviews,url,website";

pub const STATUS_OK: &str = "OK";

const GEOCODE_PATH: &str = "/geocode/json";
const NEARBY_SEARCH_PATH: &str = "/place/nearbysearch/json";
const TEXT_SEARCH_PATH: &str = "/place/textsearch/json";
const DETAILS_PATH: &str = "/place/details/json";

/// The places provider as seen by the rest of the crate.
#[async_trait]
pub trait PlacesProvider: Send + Sync {
    /// Resolve a free-text address or postal code to a coordinate.
    async fn geocode(&self, address: &str) -> Result<Coordinate, PlacesError>;

    /// Any provider status is returned as-is; only transport failures are errors.
    async fn nearby_search(
        &self,
        location: Coordinate,
        radius: u32,
        keyword: Option<&str>,
    ) -> Result<SearchResults, PlacesError>;

    async fn text_search(
        &self,
        query: Option<&str>,
        location: Option<Coordinate>,
    ) -> Result<SearchResults, PlacesError>;

    /// Fails with [`PlacesError::Status`] unless the provider reports `OK`.
    async fn place_details(&self, place_id: &str) -> Result<PlaceDetail, PlacesError>;
}

pub type QueryParams = Vec<(&'static str, String)>;

pub fn geocode_params(address: &str) -> QueryParams {
    vec![("address", address.to_string())]
}

pub fn nearby_search_params(location: Coordinate, radius: u32, keyword: Option<&str>) -> QueryParams {
    let mut params = vec![
        ("location", location.to_query_value()),
        ("radius", radius.to_string()),
    ];
    if let Some(keyword) = keyword {
        params.push(("keyword", keyword.to_string()));
        params.push(("type", RESTAURANT_TYPE.to_string()));
    }
    params
}

pub fn text_search_params(query: Option<&str>, location: Option<Coordinate>) -> QueryParams {
    let mut params = Vec::new();
    if let Some(query) = query {
        params.push(("query", query.to_string()));
    }
    params.push(("type", RESTAURANT_TYPE.to_string()));
    if let Some(location) = location {
        params.push(("location", location.to_query_value()));
        params.push(("radius", TEXT_SEARCH_RADIUS.to_string()));
    }
    params
}

pub fn place_details_params(place_id: &str) -> QueryParams {
    vec![
        ("place_id", place_id.to_string()),
        ("fields", DETAIL_FIELDS.to_string()),
    ]
}

fn describe_params(params: &QueryParams) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
    #[serde(default)]
    formatted_address: Option<String>,
}

/// Details envelope. `result` stays undecoded until the status is known to be `OK`.
#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    result: Option<serde_json::Value>,
}

fn coordinate_from_geocode(response: GeocodeResponse) -> Result<Coordinate, PlacesError> {
    if response.status != STATUS_OK {
        return Err(PlacesError::status("geocode", response.status, response.error_message));
    }
    let first = response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| PlacesError::status("geocode", "ZERO_RESULTS", None))?;
    debug!("Formatted address: {}", first.formatted_address.as_deref().unwrap_or("unknown"));
    Ok(first.geometry.location)
}

fn detail_from_response(place_id: &str, response: DetailsResponse) -> Result<PlaceDetail, PlacesError> {
    if response.status != STATUS_OK {
        return Err(PlacesError::status("place details", response.status, response.error_message));
    }
    let raw = response
        .result
        .ok_or_else(|| PlacesError::status("place details", "MISSING_RESULT", None))?;
    let mut detail: PlaceDetail = serde_json::from_value(raw).map_err(|e| {
        PlacesError::status("place details", "INVALID_RESULT", Some(e.to_string()))
    })?;
    detail.place_id = place_id.to_string();
    Ok(detail)
}

fn log_distance_diagnostics(location: Coordinate, results: &SearchResults) {
    if results.results.is_empty() || !log::log_enabled!(log::Level::Debug) {
        return;
    }
    debug!("Distance from search point:");
    for place in &results.results {
        if let Some(geometry) = &place.geometry {
            let lat_diff = (location.lat - geometry.location.lat).abs();
            let lng_diff = (location.lng - geometry.location.lng).abs();
            debug!("{}: Lat diff {:.4}, Lng diff {:.4}", place.name, lat_diff, lng_diff);
        }
    }
}

/// Google Places web service client. Holds the provider key for its whole lifetime.
#[derive(Clone)]
pub struct GooglePlacesClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GooglePlacesClient {
    pub fn new(client: Client, settings: &Settings) -> Self {
        Self {
            client,
            api_key: settings.places_api_key.clone(),
            base_url: settings.places_base_url.clone(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        params: &QueryParams,
    ) -> Result<T, PlacesError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Requesting {} with parameters: {}", endpoint, describe_params(params));

        let transport = |source| PlacesError::Transport { endpoint, source };
        self.client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(transport)?
            .json::<T>()
            .await
            .map_err(transport)
    }
}

#[async_trait]
impl PlacesProvider for GooglePlacesClient {
    async fn geocode(&self, address: &str) -> Result<Coordinate, PlacesError> {
        info!("Geocoding address: {}", address);
        let response: GeocodeResponse = self
            .get_json("geocode", GEOCODE_PATH, &geocode_params(address))
            .await
            .map_err(|e| {
                error!("Error making geocode request: {}", e);
                e
            })?;
        debug!("Geocoding status: {}", response.status);

        let coordinate = coordinate_from_geocode(response).map_err(|e| {
            debug!("Geocoding failed: {}", e);
            e
        })?;
        debug!("Returned coordinates: ({}, {})", coordinate.lat, coordinate.lng);
        Ok(coordinate)
    }

    async fn nearby_search(
        &self,
        location: Coordinate,
        radius: u32,
        keyword: Option<&str>,
    ) -> Result<SearchResults, PlacesError> {
        debug!("Search coordinates: ({}, {})", location.lat, location.lng);
        debug!("Search radius: {}m", radius);

        let results: SearchResults = self
            .get_json("nearby search", NEARBY_SEARCH_PATH, &nearby_search_params(location, radius, keyword))
            .await
            .map_err(|e| {
                error!("Error making nearby search request: {}", e);
                e
            })?;

        debug!("Status: {}", results.status);
        debug!("Results found: {}", results.results.len());
        log_distance_diagnostics(location, &results);
        Ok(results)
    }

    async fn text_search(
        &self,
        query: Option<&str>,
        location: Option<Coordinate>,
    ) -> Result<SearchResults, PlacesError> {
        debug!("Text search query: {}", query.unwrap_or("<none>"));
        if let Some(location) = location {
            debug!("Near location: ({}, {})", location.lat, location.lng);
        }

        let results: SearchResults = self
            .get_json("text search", TEXT_SEARCH_PATH, &text_search_params(query, location))
            .await
            .map_err(|e| {
                error!("Error making text search request: {}", e);
                e
            })?;

        debug!("Status: {}", results.status);
        debug!("Results found: {}", results.results.len());
        Ok(results)
    }

    async fn place_details(&self, place_id: &str) -> Result<PlaceDetail, PlacesError> {
        info!("Getting place details for: {}", place_id);
        let response: DetailsResponse = self
            .get_json("place details", DETAILS_PATH, &place_details_params(place_id))
            .await
            .map_err(|e| {
                error!("Error making place details request: {}", e);
                e
            })?;

        let detail = detail_from_response(place_id, response).map_err(|e| {
            error!("Error getting place details: {}", e);
            e
        })?;
        debug!("Retrieved place details: {:?}", detail);
        Ok(detail)
    }
}
