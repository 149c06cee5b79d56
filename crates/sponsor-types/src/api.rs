//! API types for the sponsor-gate HTTP API.
//!
//! This module defines the request and response types for the validation and
//! sponsor-deployment endpoints, plus the structured error type mapped onto
//! HTTP status codes.

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{SponsoredOperation, ValidityCode};

/// Request to validate a sponsored operation's authorization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateOperationRequest {
	/// The operation carrying the authorization blob.
	pub operation: SponsoredOperation,
	/// Host-supplied operation hash, consumed as-is by the default scheme.
	pub operation_hash: B256,
	/// The claimed owner the authorization must verify against.
	pub owner: Address,
}

/// Response carrying the verifier's validity code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateOperationResponse {
	/// Numeric validity code; zero denotes valid.
	pub code: ValidityCode,
	/// Convenience flag equal to `code == 0`.
	pub valid: bool,
}

/// Request to validate a signature over a bare hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateSignatureRequest {
	/// The claimed owner.
	pub owner: Address,
	/// The externally supplied hash the blob must sign.
	pub hash: B256,
	/// Authorization blob: scheme tag, framing, and payload.
	pub authorization: Bytes,
}

/// Response for bare-hash signature validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateSignatureResponse {
	pub valid: bool,
}

/// Response describing a sponsor contract slot, deployed or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SponsorAddressResponse {
	/// Predicted (and, once deployed, realized) sponsor address.
	pub address: Address,
	/// Whether code exists at the address.
	pub deployed: bool,
	/// Registry credit currently held for the address.
	pub balance: U256,
}

/// Request to deploy and fund a sponsor contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploySponsorRequest {
	/// Identifier of the deployment template.
	pub template_id: B256,
	/// Owner the sponsor is deployed for.
	pub owner: Address,
	/// Per-owner salt index.
	pub index: U256,
	/// Value to credit to the registry for the new sponsor.
	#[serde(default)]
	pub value: U256,
}

/// Response carrying the realized sponsor address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploySponsorResponse {
	pub address: Address,
}

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code.
	pub error: String,
	/// Human-readable description.
	pub message: String,
}

/// Structured API error type with HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Bad request, e.g. malformed authorization input (400).
	BadRequest { error_type: String, message: String },
	/// Business-logic failure, e.g. an occupied deployment slot (422).
	UnprocessableEntity { error_type: String, message: String },
	/// Upstream host unavailable (503).
	ServiceUnavailable { error_type: String, message: String },
	/// Internal server error (500).
	InternalServerError { error_type: String, message: String },
}

impl APIError {
	/// Returns the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::BadRequest { .. } => 400,
			APIError::UnprocessableEntity { .. } => 422,
			APIError::ServiceUnavailable { .. } => 503,
			APIError::InternalServerError { .. } => 500,
		}
	}

	/// Converts to an ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		let (error_type, message) = match self {
			APIError::BadRequest {
				error_type,
				message,
			}
			| APIError::UnprocessableEntity {
				error_type,
				message,
			}
			| APIError::ServiceUnavailable {
				error_type,
				message,
			}
			| APIError::InternalServerError {
				error_type,
				message,
			} => (error_type, message),
		};
		ErrorResponse {
			error: error_type.clone(),
			message: message.clone(),
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			APIError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
			APIError::UnprocessableEntity { message, .. } => {
				write!(f, "Unprocessable Entity: {}", message)
			},
			APIError::ServiceUnavailable { message, .. } => {
				write!(f, "Service Unavailable: {}", message)
			},
			APIError::InternalServerError { message, .. } => {
				write!(f, "Internal Server Error: {}", message)
			},
		}
	}
}

impl std::error::Error for APIError {}

impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = StatusCode::from_u16(self.status_code())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		(status, Json(self.to_error_response())).into_response()
	}
}
