use serde::{Deserialize, Serialize};

/// A point in degrees. Field names match the provider's `geometry.location` object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// The `location` query value expected by the places provider.
    pub fn to_query_value(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub location: Coordinate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessSummary {
    pub place_id: String,
    pub name: String,
    /// Address fragment from nearby search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vicinity: Option<String>,
    /// Full address from text search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
}

impl BusinessSummary {
    /// Whichever address the search endpoint supplied, preferring `vicinity`.
    pub fn address(&self) -> Option<&str> {
        self.vicinity.as_deref().or(self.formatted_address.as_deref())
    }
}

/// Response envelope shared by nearby search and text search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub status: String,
    #[serde(default)]
    pub results: Vec<BusinessSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl SearchResults {
    pub fn empty(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            results: Vec::new(),
            error_message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub relative_time_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetail {
    /// Not part of the requested field set; filled in from the requested id.
    #[serde(default)]
    pub place_id: String,
    pub name: String,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub formatted_phone_number: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

/// Place details together with the optional recommendation summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzedPlace {
    pub detail: PlaceDetail,
    pub ai_analysis: Option<String>,
}
