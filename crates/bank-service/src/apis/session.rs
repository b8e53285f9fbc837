//! Session API implementation.
//!
//! Every operation goes through the session handle, so the HTTP surface never
//! talks to the wallet or the node directly. Mutating operations answer with
//! the view the engine published after applying them.

use bank_core::{EngineError, SessionCommand, SessionHandle};
use bank_types::{APIError, Intent, SessionView};
use tracing::{debug, warn};

/// Returns the latest published session view.
pub fn current_view(handle: &SessionHandle) -> SessionView {
	handle.view()
}

/// Applies a command and returns the resulting view.
pub async fn apply_command(
	handle: &SessionHandle,
	command: SessionCommand,
) -> Result<SessionView, APIError> {
	debug!(command = ?command, "Applying session command");
	handle.send(command).await.map_err(|e| {
		warn!(command = ?command, error = %e, "Session command failed");
		engine_error(e)
	})
}

/// Applies a user intent and returns the resulting view.
pub async fn apply_intent(handle: &SessionHandle, intent: Intent) -> Result<SessionView, APIError> {
	apply_command(handle, SessionCommand::Intent(intent)).await
}

fn engine_error(error: EngineError) -> APIError {
	match error {
		EngineError::Stopped => APIError::ServiceUnavailable {
			error_type: "ENGINE_STOPPED".to_string(),
			message: "Session engine is not running".to_string(),
		},
		EngineError::Service(message) => APIError::InternalServerError {
			error_type: "ENGINE_ERROR".to_string(),
			message,
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_stopped_engine_is_unavailable() {
		let error = engine_error(EngineError::Stopped);
		assert_eq!(error.status_code(), 503);
		assert_eq!(error.to_error_response().error, "ENGINE_STOPPED");
	}

	#[test]
	fn test_service_error_keeps_message() {
		let error = engine_error(EngineError::Service("channel closed".to_string()));
		assert_eq!(error.status_code(), 500);
		assert_eq!(error.to_error_response().message, "channel closed");
	}
}
