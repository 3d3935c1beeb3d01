//! Nearby business search with review-based recommendations, shared by the
//! `repast` HTTP server and the `dest-recs` terminal tool.

pub mod analysis;
pub mod config;
pub mod error;
pub mod gemini;
pub mod google_places;
pub mod logging;
pub mod models;
pub mod search;
pub mod server;
pub mod shell;
pub mod utils;

pub use analysis::CompletionProvider;
pub use config::{Settings, Surface};
pub use error::{AuthError, ConfigError, PlacesError};
pub use gemini::GeminiClient;
pub use google_places::{GooglePlacesClient, PlacesProvider};
