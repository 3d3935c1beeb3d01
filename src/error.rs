use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

/// Failure of a single call to the places provider.
#[derive(Error, Debug)]
pub enum PlacesError {
    /// The request never produced a decodable response.
    #[error("{endpoint} request failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered with something other than `OK`.
    #[error("{endpoint} returned status {status}{}", detail_suffix(.message))]
    Status {
        endpoint: &'static str,
        status: String,
        message: Option<String>,
    },
}

fn detail_suffix(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

impl PlacesError {
    pub fn status<S: Into<String>>(endpoint: &'static str, status: S, message: Option<String>) -> Self {
        Self::Status {
            endpoint,
            status: status.into(),
            message,
        }
    }

    /// Provider status code, if the provider answered at all.
    pub fn provider_status(&self) -> Option<&str> {
        match self {
            PlacesError::Status { status, .. } => Some(status),
            PlacesError::Transport { .. } => None,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variable(s): {}", missing.join(", "))]
    Missing { missing: Vec<&'static str> },

    #[error("Invalid value for {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

#[derive(Error, Debug, PartialEq)]
pub enum AuthError {
    #[error("Missing API key")]
    Missing,

    #[error("Invalid API key")]
    Invalid,
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string(),
        }))
    }
}
