//! Common types module for the sponsor-gate system.
//!
//! This module defines the core data types and structures shared by the
//! authorization, deployment, and service crates. It provides a centralized
//! location for shared types to ensure consistency across all components.

/// API types for HTTP endpoints and request/response structures.
pub mod api;
/// Authorization scheme tags and blob framing constants.
pub mod auth;
/// Operation, validity code, and execution context types.
pub mod operation;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Secure string type for sensitive configuration values.
pub mod secret_string;
/// Utility functions for hashing and formatting.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

// Re-export the alloy primitives used across component interfaces
pub use alloy_primitives::{Address, Bytes, B256, U256};

// Re-export all types for convenient access
pub use api::*;
pub use auth::*;
pub use operation::*;
pub use registry::*;
pub use secret_string::*;
pub use utils::{
	authorization_digest, truncate_id, with_0x_prefix, without_0x_prefix, AbiWordEncoder,
};
pub use validation::*;
