use std::sync::Arc;

use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use log::{info, LevelFilter};
use reqwest::Client;

use repast::logging::{self, LogOptions};
use repast::server::{self, AppState};
use repast::{GeminiClient, GooglePlacesClient, Settings, Surface};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let settings = match Settings::load(Surface::Server) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let log_options = LogOptions {
        dir: &settings.log_dir,
        file_name: "repast.log",
        level: if settings.debug { LevelFilter::Debug } else { LevelFilter::Info },
        console: true,
    };
    if let Err(e) = logging::setup_logging(&log_options) {
        eprintln!("Failed to set up logging: {}", e);
        return Ok(());
    }

    info!(
        "Settings: {}",
        serde_json::to_string_pretty(&settings.redacted()).unwrap_or_default()
    );

    let client = Client::new();
    let state = web::Data::new(AppState {
        places: Arc::new(GooglePlacesClient::new(client.clone(), &settings)),
        analyst: Arc::new(GeminiClient::new(client, &settings)),
        api_key: settings.api_key.clone().unwrap_or_default(),
    });

    let governor_config = GovernorConfigBuilder::default()
        .per_second(5)
        .burst_size(10)
        .finish()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "invalid rate limit configuration"))?;

    info!("Starting Repast server on {} ({})", settings.bind_address, settings.environment);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Governor::new(&governor_config))
            .wrap(server::cors_headers())
            .app_data(state.clone())
            .configure(server::configure)
    })
    .bind(&settings.bind_address)?
    .run()
    .await
}
