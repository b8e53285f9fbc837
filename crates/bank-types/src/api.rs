//! API error types for the session HTTP surface.

use serde::{Deserialize, Serialize};
use std::fmt;

/// JSON body returned for failed API requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Machine readable error kind.
	pub error: String,
	/// Human readable description.
	pub message: String,
}

/// Errors returned by API handlers.
#[derive(Debug)]
pub enum APIError {
	/// The session engine is not running (503).
	ServiceUnavailable { error_type: String, message: String },
	/// Anything else (500).
	InternalServerError { error_type: String, message: String },
}

impl APIError {
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::ServiceUnavailable { .. } => 503,
			APIError::InternalServerError { .. } => 500,
		}
	}

	pub fn to_error_response(&self) -> ErrorResponse {
		let (error_type, message) = match self {
			APIError::ServiceUnavailable {
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

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = StatusCode::from_u16(self.status_code())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		(status, Json(self.to_error_response())).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_codes() {
		let err = APIError::ServiceUnavailable {
			error_type: "ENGINE_STOPPED".into(),
			message: "session engine is not running".into(),
		};
		assert_eq!(err.status_code(), 503);
		assert_eq!(err.to_error_response().error, "ENGINE_STOPPED");
		assert!(err.to_string().starts_with("Service Unavailable"));
	}
}
