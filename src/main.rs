//! jwtbearer - OAuth 2.0 JWT-Bearer assertion grant client
//!
#![doc = "jwtbearer - OAuth 2.0 JWT-Bearer assertion grant client"]
#![doc = "Main entry point for the jwtbearer application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jwtbearer::cli::{Cli, Commands};
use jwtbearer::commands;
use jwtbearer::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    match cli.command {
        Commands::Token { json } => {
            commands::token::run_token(&config, json).await?;
            Ok(())
        }
        Commands::Discover => {
            tracing::info!("Discovering token endpoint for {}", config.oauth.issuer);
            commands::discover::run_discover(&config).await?;
            Ok(())
        }
        Commands::Assertions { verify } => {
            tracing::info!("Building assertions for client {}", config.oauth.client_id);
            commands::assertions::run_assertions(&config, verify)?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "jwtbearer=debug"
    } else {
        "jwtbearer=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
