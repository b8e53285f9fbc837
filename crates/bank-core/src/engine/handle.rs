//! Client side of the session engine.

use super::EngineError;
use bank_types::{Intent, SessionView};
use tokio::sync::{mpsc, oneshot, watch};

/// Commands accepted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
	/// Apply a user intent to the session.
	Intent(Intent),
	/// Ask the wallet to connect.
	Connect,
	/// Ask the wallet to disconnect.
	Disconnect,
}

pub(crate) struct Envelope {
	pub(crate) command: SessionCommand,
	pub(crate) reply: oneshot::Sender<SessionView>,
}

/// Cloneable handle for issuing commands and observing the session.
#[derive(Clone)]
pub struct SessionHandle {
	commands: mpsc::Sender<Envelope>,
	view: watch::Receiver<SessionView>,
}

impl SessionHandle {
	pub(crate) fn new(commands: mpsc::Sender<Envelope>, view: watch::Receiver<SessionView>) -> Self {
		Self { commands, view }
	}

	/// Sends a command and returns the view once the engine has applied it.
	pub async fn send(&self, command: SessionCommand) -> Result<SessionView, EngineError> {
		let (reply, response) = oneshot::channel();
		self.commands
			.send(Envelope { command, reply })
			.await
			.map_err(|_| EngineError::Stopped)?;
		response.await.map_err(|_| EngineError::Stopped)
	}

	pub async fn intent(&self, intent: Intent) -> Result<SessionView, EngineError> {
		self.send(SessionCommand::Intent(intent)).await
	}

	/// The latest published view.
	pub fn view(&self) -> SessionView {
		self.view.borrow().clone()
	}

	/// Receiver notified on every published view.
	pub fn subscribe(&self) -> watch::Receiver<SessionView> {
		self.view.clone()
	}
}
