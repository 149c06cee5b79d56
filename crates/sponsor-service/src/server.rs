//! HTTP server for the sponsor-gate API.
//!
//! Exposes operation and bare-hash validation plus the sponsor address
//! predictor and the deploy-and-fund action. Validation handlers are pure
//! reads; the deploy handler performs the single side-effecting action of
//! the system.

use axum::{
	extract::{Path, State},
	response::Json,
	routing::{get, post},
	Router,
};
use sponsor_auth::{AuthError, AuthService};
use sponsor_config::ApiConfig;
use sponsor_deployer::{DeployerError, DeployerService};
use sponsor_types::{
	APIError, Address, DeploySponsorRequest, DeploySponsorResponse, ExecutionContext,
	SponsorAddressResponse, ValidateOperationRequest, ValidateOperationResponse,
	ValidateSignatureRequest, ValidateSignatureResponse, U256,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Authorization dispatcher.
	pub auth: Arc<AuthService>,
	/// Deterministic deployer.
	pub deployer: Arc<DeployerService>,
	/// Chain identifier bound into every validation context.
	pub chain_id: u64,
}

/// Starts the HTTP server for the API.
pub async fn start_server(
	api_config: ApiConfig,
	chain_id: u64,
	auth: Arc<AuthService>,
	deployer: Arc<DeployerService>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app_state = AppState {
		auth,
		deployer,
		chain_id,
	};

	let app = Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/operations/validate", post(handle_validate_operation))
				.route("/signatures/validate", post(handle_validate_signature))
				.route("/sponsors", post(handle_deploy_sponsor))
				.route("/sponsors/{owner}/{index}", get(handle_get_sponsor)),
		)
		.layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
		.with_state(app_state);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Sponsor gate API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Handles POST /api/operations/validate requests.
///
/// Dispatches the operation's authorization blob to its scheme verifier and
/// returns the numeric validity code.
async fn handle_validate_operation(
	State(state): State<AppState>,
	Json(request): Json<ValidateOperationRequest>,
) -> Result<Json<ValidateOperationResponse>, APIError> {
	let context = ExecutionContext::now(state.chain_id);
	let code = state
		.auth
		.validate_operation(
			&request.operation,
			&request.operation_hash,
			&request.owner,
			&context,
		)
		.await
		.map_err(auth_error_to_api)?;

	Ok(Json(ValidateOperationResponse {
		code,
		valid: code.is_valid(),
	}))
}

/// Handles POST /api/signatures/validate requests.
async fn handle_validate_signature(
	State(state): State<AppState>,
	Json(request): Json<ValidateSignatureRequest>,
) -> Result<Json<ValidateSignatureResponse>, APIError> {
	let valid = state
		.auth
		.validate_signature_for_owner(&request.owner, &request.hash, &request.authorization)
		.await
		.map_err(auth_error_to_api)?;

	Ok(Json(ValidateSignatureResponse { valid }))
}

/// Handles GET /api/sponsors/{owner}/{index} requests.
///
/// Read-only prediction so callers can reference or pre-fund a sponsor
/// before it exists.
async fn handle_get_sponsor(
	Path((owner, index)): Path<(String, u64)>,
	State(state): State<AppState>,
) -> Result<Json<SponsorAddressResponse>, APIError> {
	let owner: Address = owner.parse().map_err(|_| APIError::BadRequest {
		error_type: "invalid_owner".to_string(),
		message: format!("'{}' is not a valid address", owner),
	})?;
	let index = U256::from(index);
	let template_id = state.deployer.template_id();

	let address = state
		.deployer
		.predict_address(&template_id, &owner, index)
		.map_err(deployer_error_to_api)?;
	let deployed = state
		.deployer
		.is_deployed(&template_id, &owner, index)
		.await
		.map_err(deployer_error_to_api)?;
	let balance = state
		.deployer
		.registry_balance(&address)
		.await
		.map_err(deployer_error_to_api)?;

	Ok(Json(SponsorAddressResponse {
		address,
		deployed,
		balance,
	}))
}

/// Handles POST /api/sponsors requests.
///
/// Deploys a sponsor at its predicted address and credits the registry as
/// one atomic action.
async fn handle_deploy_sponsor(
	State(state): State<AppState>,
	Json(request): Json<DeploySponsorRequest>,
) -> Result<Json<DeploySponsorResponse>, APIError> {
	let address = state
		.deployer
		.deploy_and_fund(
			&request.template_id,
			&request.owner,
			request.index,
			request.value,
		)
		.await
		.map_err(deployer_error_to_api)?;

	Ok(Json(DeploySponsorResponse { address }))
}

/// Maps authorization errors onto API errors.
///
/// Malformed input is the caller's fault (400); a delegate failure is a
/// processing failure (422). Note that a non-verifying signature is not an
/// error at all, it is a negative verdict in the response body.
fn auth_error_to_api(error: AuthError) -> APIError {
	match error {
		AuthError::MalformedAuthorization(_) | AuthError::InvalidSignatureLength(_) => {
			APIError::BadRequest {
				error_type: "malformed_input".to_string(),
				message: error.to_string(),
			}
		},
		AuthError::Verifier(_) => APIError::UnprocessableEntity {
			error_type: "verifier_failure".to_string(),
			message: error.to_string(),
		},
		AuthError::InvalidConfig(_) => APIError::InternalServerError {
			error_type: "configuration".to_string(),
			message: error.to_string(),
		},
	}
}

/// Maps deployer errors onto API errors.
fn deployer_error_to_api(error: DeployerError) -> APIError {
	match error {
		DeployerError::UnknownTemplate(_) => APIError::BadRequest {
			error_type: "unknown_template".to_string(),
			message: error.to_string(),
		},
		DeployerError::AlreadyDeployed(_)
		| DeployerError::DeploymentFailed(_)
		| DeployerError::FundingFailed(_) => APIError::UnprocessableEntity {
			error_type: "deployment_failed".to_string(),
			message: error.to_string(),
		},
		DeployerError::AddressMismatch { .. } => APIError::InternalServerError {
			error_type: "address_mismatch".to_string(),
			message: error.to_string(),
		},
		DeployerError::Host(_) => APIError::ServiceUnavailable {
			error_type: "host_unavailable".to_string(),
			message: error.to_string(),
		},
		DeployerError::InvalidConfig(_) => APIError::InternalServerError {
			error_type: "configuration".to_string(),
			message: error.to_string(),
		},
	}
}
