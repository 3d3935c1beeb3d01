use std::future::{ready, Ready};
use std::sync::Arc;

use actix_web::{
    dev::Payload,
    http::{header, Method},
    middleware::DefaultHeaders,
    web, FromRequest, HttpRequest, HttpResponse, Responder,
};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::analysis::CompletionProvider;
use crate::error::{AuthError, PlacesError};
use crate::google_places::{PlacesProvider, STATUS_OK};
use crate::models::{BusinessSummary, Coordinate, PlaceDetail};
use crate::search::{fetch_place, find_businesses, no_results_message, SearchSource};
use crate::utils::{constant_time_eq, normalize_keyword, validate_place_id};

pub const API_KEY_HEADER: &str = "X-API-Key";

const CORS_ALLOW_METHODS: &str = "GET, POST, OPTIONS";
const CORS_ALLOW_HEADERS: &str = "Content-Type, X-API-Key";
const CORS_MAX_AGE_SECS: &str = "3600";

/// Everything a handler needs. Shared read-only across workers.
pub struct AppState {
    pub places: Arc<dyn PlacesProvider>,
    pub analyst: Arc<dyn CompletionProvider>,
    pub api_key: String,
}

/// Extractor that rejects requests without the configured API key.
pub struct ApiKeyAuth;

impl FromRequest for ApiKeyAuth {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>() else {
            error!("Application state missing, rejecting request");
            return ready(Err(AuthError::Invalid.into()));
        };

        let result = match req.headers().get(API_KEY_HEADER).map(|v| v.to_str()) {
            None => Err(AuthError::Missing),
            Some(Ok(key)) if constant_time_eq(key.as_bytes(), state.api_key.as_bytes()) => Ok(ApiKeyAuth),
            Some(_) => Err(AuthError::Invalid),
        };

        ready(result.map_err(|e| {
            warn!("Rejected {} {}: {}", req.method(), req.path(), e);
            e.into()
        }))
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LocationInput {
    Point(Coordinate),
    Pair([f64; 2]),
    Address(String),
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    location: LocationInput,
    #[serde(default)]
    keyword: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_format: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            expected_format: None,
            status: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    status: String,
    source: SearchSource,
    results: Vec<BusinessSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct PlaceDetailsResponse {
    status: &'static str,
    result: PlaceDetail,
    #[serde(skip_serializing_if = "Option::is_none")]
    ai_analysis: Option<String>,
}

fn expected_search_format() -> serde_json::Value {
    serde_json::json!({
        "location": "Grand Rapids, MI | {\"lat\": 42.9634, \"lng\": -85.6681} | [42.9634, -85.6681]",
        "keyword": "pizza (optional)"
    })
}

fn request_id() -> String {
    chrono::Utc::now().format("%Y%m%d%H%M%S%f").to_string()
}

async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "message": "Server is running"
    }))
}

async fn search(
    _auth: ApiKeyAuth,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> HttpResponse {
    let request_id = request_id();
    info!("Request {}: Search request received", request_id);
    debug!("Request {}: Raw request body: {}", request_id, String::from_utf8_lossy(&body));

    let req = match serde_json::from_slice::<SearchRequest>(&body) {
        Ok(req) => req,
        Err(e) => {
            let error_msg = format!("Invalid request format: {}", e);
            error!("Request {}: {}", request_id, error_msg);
            return HttpResponse::BadRequest().json(ErrorResponse {
                expected_format: Some(expected_search_format()),
                ..ErrorResponse::new(error_msg)
            });
        }
    };
    debug!("Request {}: Parsed request body: {:?}", request_id, req);

    let location = match req.location {
        LocationInput::Point(coordinate) => coordinate,
        LocationInput::Pair([lat, lng]) => Coordinate::new(lat, lng),
        LocationInput::Address(address) => match state.places.geocode(&address).await {
            Ok(coordinate) => coordinate,
            Err(e) => {
                error!("Request {}: Could not geocode '{}': {}", request_id, address, e);
                return HttpResponse::NotFound()
                    .json(ErrorResponse::new("Could not find coordinates for that address"));
            }
        },
    };

    let keyword = normalize_keyword(req.keyword.as_deref());
    let found = find_businesses(state.places.as_ref(), location, keyword.as_deref()).await;
    info!(
        "Request {}: {} businesses found via {:?}",
        request_id,
        found.results.len(),
        found.source
    );

    let message = found
        .is_empty()
        .then(|| no_results_message(keyword.as_deref()));
    HttpResponse::Ok().json(SearchResponse {
        status: found.status,
        source: found.source,
        results: found.results,
        message,
    })
}

async fn place_details(
    _auth: ApiKeyAuth,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let request_id = request_id();
    let place_id = path.into_inner();
    info!("Request {}: Place details requested for {}", request_id, place_id);

    let place_id = match validate_place_id(&place_id) {
        Ok(id) => id,
        Err(e) => {
            error!("Request {}: Place id validation failed: {}", request_id, e);
            return HttpResponse::BadRequest().json(ErrorResponse::new(e));
        }
    };

    match fetch_place(state.places.as_ref(), state.analyst.as_ref(), place_id).await {
        Ok(place) => {
            info!(
                "Request {}: Returning details for {} (analysis: {})",
                request_id,
                place.detail.name,
                place.ai_analysis.is_some()
            );
            HttpResponse::Ok().json(PlaceDetailsResponse {
                status: STATUS_OK,
                result: place.detail,
                ai_analysis: place.ai_analysis,
            })
        }
        Err(e @ PlacesError::Status { .. }) => {
            error!("Request {}: Error getting place details: {}", request_id, e);
            HttpResponse::BadGateway().json(ErrorResponse {
                status: e.provider_status().map(String::from),
                ..ErrorResponse::new("Could not fetch details for this place")
            })
        }
        Err(e) => {
            error!("Request {}: Error getting place details: {}", request_id, e);
            HttpResponse::BadGateway().json(ErrorResponse::new(format!(
                "Failed to reach the places provider: {}",
                e
            )))
        }
    }
}

/// Answers CORS preflight. Browsers send these without the API key.
async fn preflight() -> HttpResponse {
    HttpResponse::NoContent()
        .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, CORS_ALLOW_METHODS))
        .insert_header((header::ACCESS_CONTROL_ALLOW_HEADERS, CORS_ALLOW_HEADERS))
        .insert_header((header::ACCESS_CONTROL_MAX_AGE, CORS_MAX_AGE_SECS))
        .finish()
}

/// Headers added to every response so browser clients on any origin can read them.
pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .add((header::ACCESS_CONTROL_ALLOW_HEADERS, CORS_ALLOW_HEADERS))
}

/// Registers every route. Middleware is left to the caller.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .service(
            web::scope("/api")
                .service(
                    web::resource("/search")
                        .route(web::post().to(search))
                        .route(web::method(Method::OPTIONS).to(preflight)),
                )
                .service(
                    web::resource("/place-details/{place_id}")
                        .route(web::get().to(place_details))
                        .route(web::method(Method::OPTIONS).to(preflight)),
                ),
        );
}
