//! Main entry point for the sponsor-gate service.
//!
//! This binary authorizes sponsor-paid operations and deploys per-owner
//! sponsor contracts at deterministic addresses. It uses a modular
//! architecture with pluggable verifier schemes and deployment hosts.

use clap::Parser;
use sponsor_config::Config;
use std::path::PathBuf;
use std::sync::Arc;

mod factory_registry;
mod server;

use factory_registry::{build_auth_from_config, build_deployer_from_config};

/// Command-line arguments for the sponsor-gate service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the sponsor-gate service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the dispatcher and deployer from registered implementations
/// 5. Serves the HTTP API until interrupted
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started sponsor gate");

	// Load configuration
	let config = Config::from_file(&args.config)?;
	tracing::info!("Loaded configuration [{}]", config.sponsor.id);

	// Build services from registered implementations
	let auth = Arc::new(build_auth_from_config(&config)?);
	let deployer = Arc::new(build_deployer_from_config(&config)?);

	match config.api {
		Some(ref api_config) if api_config.enabled => {
			server::start_server(api_config.clone(), config.sponsor.chain_id, auth, deployer)
				.await?;
		},
		_ => {
			tracing::warn!("API server disabled in configuration; nothing to serve");
		},
	}

	tracing::info!("Stopped sponsor gate");
	Ok(())
}
