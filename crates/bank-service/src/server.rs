//! HTTP server for the bank account API.
//!
//! Exposes the session view and the session commands as JSON endpoints under
//! `/api`.

use crate::apis::session::{apply_command, apply_intent, current_view};
use axum::{
	extract::State,
	response::Json,
	routing::{get, post},
	Router,
};
use bank_config::ApiConfig;
use bank_core::{SessionCommand, SessionHandle};
use bank_types::{APIError, Intent, SessionView};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Handle to the running session engine.
	pub session: SessionHandle,
}

/// Builds the router with every session endpoint under `/api`.
pub fn router(session: SessionHandle) -> Router {
	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/session", get(handle_get_session))
				.route("/session/verify", post(handle_verify))
				.route("/session/accounts", post(handle_view_accounts))
				.route("/session/accounts/create", post(handle_create_account))
				.route("/session/refresh", post(handle_refresh))
				.route("/wallet/connect", post(handle_connect))
				.route("/wallet/disconnect", post(handle_disconnect)),
		)
		.layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
		.with_state(AppState { session })
}

/// Starts the HTTP server for the API.
pub async fn start_server(
	api_config: ApiConfig,
	session: SessionHandle,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(session);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Bank account API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Handles GET /api/session requests.
async fn handle_get_session(State(state): State<AppState>) -> Json<SessionView> {
	Json(current_view(&state.session))
}

/// Handles POST /api/session/verify requests.
async fn handle_verify(State(state): State<AppState>) -> Result<Json<SessionView>, APIError> {
	apply_intent(&state.session, Intent::Verify).await.map(Json)
}

/// Handles POST /api/session/accounts requests.
async fn handle_view_accounts(
	State(state): State<AppState>,
) -> Result<Json<SessionView>, APIError> {
	apply_intent(&state.session, Intent::ViewAccounts)
		.await
		.map(Json)
}

/// Handles POST /api/session/accounts/create requests.
async fn handle_create_account(
	State(state): State<AppState>,
) -> Result<Json<SessionView>, APIError> {
	apply_intent(&state.session, Intent::CreateAccount)
		.await
		.map(Json)
}

/// Handles POST /api/session/refresh requests.
async fn handle_refresh(State(state): State<AppState>) -> Result<Json<SessionView>, APIError> {
	apply_intent(&state.session, Intent::Refresh).await.map(Json)
}

/// Handles POST /api/wallet/connect requests.
async fn handle_connect(State(state): State<AppState>) -> Result<Json<SessionView>, APIError> {
	apply_command(&state.session, SessionCommand::Connect)
		.await
		.map(Json)
}

/// Handles POST /api/wallet/disconnect requests.
async fn handle_disconnect(State(state): State<AppState>) -> Result<Json<SessionView>, APIError> {
	apply_command(&state.session, SessionCommand::Disconnect)
		.await
		.map(Json)
}
