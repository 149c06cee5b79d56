//! Configuration module for the sponsor-gate system.
//!
//! This module provides structures and utilities for managing the gate's
//! configuration. It supports loading configuration from TOML files with
//! `${ENV_VAR}` interpolation, so secrets like the deployer key stay out of
//! the files themselves.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the sponsor gate.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Configuration specific to this gate instance.
	pub sponsor: SponsorConfig,
	/// Configuration for authorization scheme verifiers.
	pub auth: AuthConfig,
	/// Configuration for the deterministic deployer.
	pub deployer: DeployerConfig,
	/// Configuration for the HTTP API server.
	pub api: Option<ApiConfig>,
}

/// Configuration specific to the gate instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SponsorConfig {
	/// Unique identifier for this gate instance.
	pub id: String,
	/// Chain identifier bound into every canonical digest.
	pub chain_id: u64,
}

/// Configuration for authorization scheme verifiers.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
	/// Name of the implementation handling untagged and unknown blobs.
	pub default: String,
	/// Map of verifier implementation names to their configurations.
	/// Each implementation has its own format stored as raw TOML values.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the deterministic deployer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeployerConfig {
	/// Which host implementation to use as primary.
	pub primary: String,
	/// Address of the deployment factory.
	pub factory_address: String,
	/// Identifier of the sponsor template this deployer serves.
	pub template_id: String,
	/// Hex-encoded deployment code of the sponsor template.
	pub template_code: String,
	/// Map of host implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
}

/// Returns the default API bind address.
fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

/// Returns the default API port.
fn default_api_port() -> u16 {
	8080
}

impl Config {
	/// Loads configuration from a TOML file.
	///
	/// Environment-variable references of the form `${VAR}` are resolved
	/// before parsing; a reference to an unset variable is an error.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path)?;
		content.parse()
	}
}

impl std::str::FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		Ok(toml::from_str(&resolved)?)
	}
}

/// Resolves `${ENV_VAR}` references in raw configuration text.
pub fn resolve_env_vars(content: &str) -> Result<String, ConfigError> {
	// Pattern is anchored to uppercase env-style names so TOML content
	// containing literal "${...}" strings of other shapes passes through.
	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
		.map_err(|e| ConfigError::Validation(format!("Invalid env var pattern: {}", e)))?;

	let mut missing = Vec::new();
	let resolved = re.replace_all(content, |caps: &regex::Captures<'_>| {
		let name = &caps[1];
		match std::env::var(name) {
			Ok(value) => value,
			Err(_) => {
				missing.push(name.to_string());
				String::new()
			},
		}
	});

	if missing.is_empty() {
		Ok(resolved.into_owned())
	} else {
		Err(ConfigError::Validation(format!(
			"Unset environment variables referenced in config: {}",
			missing.join(", ")
		)))
	}
}
