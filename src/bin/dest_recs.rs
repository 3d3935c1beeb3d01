use std::io;

use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use log::{debug, info, LevelFilter};
use reqwest::Client;

use repast::logging::{self, LogOptions};
use repast::shell::Shell;
use repast::{GeminiClient, GooglePlacesClient, Settings, Surface};

/// Restaurant recommendation tool
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

async fn session(settings: &Settings) -> Result<()> {
    let client = Client::new();
    let places = GooglePlacesClient::new(client.clone(), settings);
    let analyst = GeminiClient::new(client, settings);

    let stdin = io::stdin();
    let mut shell = Shell::new(&places, &analyst, stdin.lock(), io::stdout());
    shell.run().await
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    dotenv().ok();

    let settings = match Settings::load(Surface::Terminal) {
        Ok(settings) => settings,
        Err(e) => {
            println!("{}", e);
            return;
        }
    };

    let log_options = LogOptions {
        dir: &settings.log_dir,
        file_name: "dest_recs.log",
        level: LevelFilter::Debug,
        console: args.debug,
    };
    if let Err(e) = logging::setup_logging(&log_options) {
        eprintln!("Failed to set up logging: {}", e);
    }

    debug!("Settings: {}", settings.redacted());
    info!("Starting session");

    if let Err(e) = session(&settings).await {
        println!("An error occurred: {}", e);
        println!("{:?}", e);
    }
}
