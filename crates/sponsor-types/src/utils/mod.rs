//! Utility functions shared across the sponsor-gate crates.

/// Canonical authorization digest and ABI word encoding.
pub mod digest;
/// String formatting helpers for hex values and log output.
pub mod formatting;

pub use digest::{authorization_digest, AbiWordEncoder};
pub use formatting::{truncate_id, with_0x_prefix, without_0x_prefix};
