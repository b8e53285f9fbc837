//! Session engine that drives the account session.
//!
//! The engine is a single task owning the [`AccountSession`]. It takes one
//! input at a time from the command queue, the results inbox and the wallet's
//! connectivity channel, executes the resulting effects on spawned tasks and
//! publishes a fresh [`SessionView`] after every input.

mod executor;
pub mod handle;

use crate::session::{AccountSession, Effect, SessionSettings};
use bank_channel::{ConfirmationTracker, ReadChannel, WriteChannel};
use bank_types::{Connection, ContractDescriptor, SessionEvent, SessionView};
use bank_wallet::WalletService;
use executor::{execute_read, execute_submit, execute_track, Inbox};
use handle::Envelope;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

pub use handle::{SessionCommand, SessionHandle};

/// Capacity of the command queue.
const COMMAND_QUEUE: usize = 64;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Service error: {0}")]
	Service(String),
	#[error("Session engine stopped")]
	Stopped,
}

/// Contract channels the engine executes effects with.
#[derive(Clone)]
pub struct Channels {
	pub reader: Arc<dyn ReadChannel>,
	pub writer: Arc<dyn WriteChannel>,
	pub tracker: Arc<dyn ConfirmationTracker>,
}

/// Main engine owning the session state.
pub struct SessionEngine {
	session: AccountSession,
	descriptor: Arc<ContractDescriptor>,
	wallet: Arc<WalletService>,
	channels: Channels,
	commands: mpsc::Receiver<Envelope>,
	inbox: Inbox,
	results: mpsc::UnboundedReceiver<SessionEvent>,
	views: watch::Sender<SessionView>,
	tracking: Option<JoinHandle<()>>,
}

impl SessionEngine {
	/// Creates an engine and the handle used to drive it.
	pub fn new(
		settings: SessionSettings,
		descriptor: ContractDescriptor,
		wallet: Arc<WalletService>,
		channels: Channels,
	) -> (Self, SessionHandle) {
		let session = AccountSession::new(settings);
		let (command_tx, commands) = mpsc::channel(COMMAND_QUEUE);
		let (inbox, results) = mpsc::unbounded_channel();
		let (views, view_rx) = watch::channel(session.view());

		let engine = Self {
			session,
			descriptor: Arc::new(descriptor),
			wallet,
			channels,
			commands,
			inbox,
			results,
			views,
			tracking: None,
		};
		(engine, SessionHandle::new(command_tx, view_rx))
	}

	/// Main execution loop for the session engine.
	///
	/// Runs until `shutdown` completes or every handle has been dropped.
	pub async fn run<S>(mut self, shutdown: S) -> Result<(), EngineError>
	where
		S: Future<Output = ()> + Send,
	{
		tokio::pin!(shutdown);
		let mut connectivity = self.wallet.connection();

		let initial = connectivity.borrow_and_update().clone();
		self.apply(SessionEvent::ConnectionChanged(initial));
		tracing::info!(contract = %self.descriptor.address, "Session engine started");

		let result = loop {
			tokio::select! {
				_ = &mut shutdown => {
					tracing::info!("Shutdown requested");
					break Ok(());
				}

				Some(event) = self.results.recv() => {
					self.apply(event);
				}

				changed = connectivity.changed() => {
					if changed.is_err() {
						break Err(EngineError::Service("Wallet connectivity channel closed".into()));
					}
					let connection = connectivity.borrow_and_update().clone();
					self.apply(SessionEvent::ConnectionChanged(connection));
				}

				envelope = self.commands.recv() => {
					let Some(Envelope { command, reply }) = envelope else {
						tracing::info!("All session handles dropped");
						break Ok(());
					};
					self.handle_command(command).await;
					reply.send(self.session.view()).ok();
				}
			}
		};

		self.cancel_tracking();
		tracing::info!("Session engine stopped");
		result
	}

	async fn handle_command(&mut self, command: SessionCommand) {
		match command {
			SessionCommand::Intent(intent) => {
				let effects = self.session.handle_intent(intent);
				self.execute(effects);
			},
			SessionCommand::Connect => {
				if let Err(e) = self.wallet.connect().await {
					tracing::warn!(error = %e, "Wallet connection failed");
					self.session.record_error(e.to_string());
				}
				self.sync_connection();
			},
			SessionCommand::Disconnect => {
				self.wallet.disconnect().await;
				self.sync_connection();
			},
		}
		self.publish();
	}

	/// Applies the wallet's current connectivity without waiting for the
	/// change notification, so a command's reply reflects it.
	fn sync_connection(&mut self) {
		let connection: Connection = self.wallet.connection().borrow().clone();
		let effects = self
			.session
			.handle_event(SessionEvent::ConnectionChanged(connection));
		self.execute(effects);
	}

	fn apply(&mut self, event: SessionEvent) {
		let effects = self.session.handle_event(event);
		self.execute(effects);
		self.publish();
	}

	fn publish(&self) {
		self.views.send_replace(self.session.view());
	}

	fn execute(&mut self, effects: Vec<Effect>) {
		for effect in effects {
			match effect {
				Effect::Read { request, queries } => {
					tokio::spawn(execute_read(
						self.channels.reader.clone(),
						self.descriptor.clone(),
						request,
						queries,
						self.inbox.clone(),
					));
				},
				Effect::Submit { request, query } => {
					tokio::spawn(execute_submit(
						self.channels.writer.clone(),
						self.descriptor.clone(),
						request,
						query,
						self.inbox.clone(),
					));
				},
				Effect::Track { hash } => {
					self.cancel_tracking();
					self.tracking = Some(tokio::spawn(execute_track(
						self.channels.tracker.clone(),
						hash,
						self.inbox.clone(),
					)));
				},
				Effect::CancelTracking => self.cancel_tracking(),
			}
		}
	}

	fn cancel_tracking(&mut self) {
		if let Some(handle) = self.tracking.take() {
			if !handle.is_finished() {
				tracing::debug!("Cancelling confirmation tracker");
			}
			handle.abort();
		}
	}
}
