//! The account session state machine.
//!
//! [`AccountSession`] owns the phase, the account set and the live
//! transaction. It performs no I/O: intents and events go in, [`Effect`]s
//! come out, and the engine executes them and feeds the results back in as
//! further events. Every failure becomes state, so handling never fails.

pub mod transitions;

use bank_config::FunctionsConfig;
use bank_types::{
	truncate_id, Connection, ContractQuery, Intent, QueryBatch, QueryResult, RequestId,
	SessionEvent, SessionPhase, SessionView, TrackerStatus, Transaction, TransactionHash,
};
use std::collections::{BTreeMap, HashMap};
use transitions::is_valid_transition;

/// Work requested by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
	/// Run the queries as one batch and report [`SessionEvent::BatchResolved`].
	Read {
		request: RequestId,
		queries: Vec<ContractQuery>,
	},
	/// Submit the call and report [`SessionEvent::SubmissionResolved`].
	Submit {
		request: RequestId,
		query: ContractQuery,
	},
	/// Start tracking the transaction, replacing any running tracker.
	Track { hash: TransactionHash },
	/// Stop the running tracker, if any.
	CancelTracking,
}

/// Contract functions and fixed arguments the session works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
	pub sentinel_function: String,
	pub expected_sentinel: String,
	pub accounts_function: String,
	pub create_account_function: String,
	/// Arguments passed to the create-account call.
	pub create_account_args: Vec<serde_json::Value>,
}

impl From<&FunctionsConfig> for SessionSettings {
	fn from(config: &FunctionsConfig) -> Self {
		let signers = config
			.create_account_signers
			.iter()
			.cloned()
			.map(serde_json::Value::String)
			.collect();

		Self {
			sentinel_function: config.sentinel.clone(),
			expected_sentinel: config.expected_sentinel.clone(),
			accounts_function: config.accounts.clone(),
			create_account_function: config.create_account.clone(),
			create_account_args: vec![serde_json::Value::Array(signers)],
		}
	}
}

impl Default for SessionSettings {
	fn default() -> Self {
		Self::from(&FunctionsConfig::default())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadPurpose {
	Verify,
	Accounts,
	Refresh,
}

/// Session state for one wallet connection at a time.
#[derive(Debug)]
pub struct AccountSession {
	settings: SessionSettings,
	phase: SessionPhase,
	connection: Connection,
	accounts: Vec<String>,
	transaction: Transaction,
	reads: BTreeMap<String, QueryResult>,
	pending_reads: HashMap<RequestId, ReadPurpose>,
	pending_write: Option<RequestId>,
	next_request: u64,
	last_error: Option<String>,
}

impl AccountSession {
	pub fn new(settings: SessionSettings) -> Self {
		Self {
			settings,
			phase: SessionPhase::Disconnected,
			connection: Connection::disconnected(),
			accounts: Vec::new(),
			transaction: Transaction::default(),
			reads: BTreeMap::new(),
			pending_reads: HashMap::new(),
			pending_write: None,
			next_request: 0,
			last_error: None,
		}
	}

	pub fn phase(&self) -> SessionPhase {
		self.phase
	}

	pub fn accounts(&self) -> &[String] {
		&self.accounts
	}

	pub fn transaction(&self) -> &Transaction {
		&self.transaction
	}

	/// True while any read or write request is outstanding.
	pub fn is_loading(&self) -> bool {
		!self.pending_reads.is_empty() || self.pending_write.is_some()
	}

	/// Snapshot for the rendering collaborator.
	pub fn view(&self) -> SessionView {
		SessionView {
			phase: self.phase,
			connection: self.connection.clone(),
			accounts: self.accounts.clone(),
			transaction: self.transaction.clone(),
			loading: self.is_loading(),
			reads: self.reads.clone(),
			last_error: self.last_error.clone(),
		}
	}

	/// Records a failure that is not attached to a query or the transaction.
	pub fn record_error(&mut self, message: impl Into<String>) {
		self.last_error = Some(message.into());
	}

	/// Applies a user intent.
	///
	/// Intents that are not available in the current phase are ignored.
	pub fn handle_intent(&mut self, intent: Intent) -> Vec<Effect> {
		match (intent, self.phase) {
			(Intent::Verify, SessionPhase::Connected) => {
				self.transition(SessionPhase::Verifying);
				let query = ContractQuery::call(&self.settings.sentinel_function);
				vec![self.read(ReadPurpose::Verify, vec![query])]
			},
			(Intent::ViewAccounts, SessionPhase::Unlocked) => {
				let query = ContractQuery::call(&self.settings.accounts_function);
				vec![self.read(ReadPurpose::Accounts, vec![query])]
			},
			(Intent::Refresh, SessionPhase::Connected | SessionPhase::Unlocked) => {
				let queries = vec![
					ContractQuery::call(&self.settings.sentinel_function),
					ContractQuery::call(&self.settings.accounts_function),
				];
				vec![self.read(ReadPurpose::Refresh, queries)]
			},
			(Intent::CreateAccount, SessionPhase::Unlocked) => self.create_account(),
			(intent, phase) => {
				tracing::debug!(intent = ?intent, phase = %phase, "Ignoring unavailable intent");
				Vec::new()
			},
		}
	}

	/// Applies a result or notification.
	pub fn handle_event(&mut self, event: SessionEvent) -> Vec<Effect> {
		match event {
			SessionEvent::ConnectionChanged(connection) => self.connection_changed(connection),
			SessionEvent::BatchResolved { request, batch } => {
				self.batch_resolved(request, batch);
				Vec::new()
			},
			SessionEvent::SubmissionResolved { request, outcome } => {
				self.submission_resolved(request, outcome)
			},
			SessionEvent::Tracker { hash, status } => {
				self.tracker_update(hash, status);
				Vec::new()
			},
		}
	}

	fn transition(&mut self, to: SessionPhase) {
		if !is_valid_transition(self.phase, to) {
			tracing::warn!(from = %self.phase, to = %to, "Invalid session transition");
			return;
		}
		if self.phase != to {
			tracing::info!(from = %self.phase, to = %to, "Session phase changed");
		}
		self.phase = to;
	}

	fn next_request(&mut self) -> RequestId {
		self.next_request += 1;
		RequestId(self.next_request)
	}

	fn read(&mut self, purpose: ReadPurpose, queries: Vec<ContractQuery>) -> Effect {
		let request = self.next_request();
		for query in &queries {
			self.reads
				.insert(query.function_name().to_string(), QueryResult::pending());
		}
		self.pending_reads.insert(request, purpose);
		tracing::debug!(request = %request, purpose = ?purpose, "Issuing read");
		Effect::Read { request, queries }
	}

	fn create_account(&mut self) -> Vec<Effect> {
		if self.pending_write.is_some() || self.transaction.confirming {
			tracing::debug!("Create account rejected while a transaction is in flight");
			return Vec::new();
		}

		let request = self.next_request();
		self.pending_write = Some(request);
		self.transaction = Transaction::default();

		let query = ContractQuery::new(
			&self.settings.create_account_function,
			self.settings.create_account_args.clone(),
		);
		tracing::info!(request = %request, function = %query.function_name(), "Submitting transaction");
		vec![Effect::Submit { request, query }]
	}

	/// Drops accounts, the transaction and outstanding requests.
	fn reset(&mut self) {
		self.accounts.clear();
		self.transaction = Transaction::default();
		self.reads.clear();
		self.pending_reads.clear();
		self.pending_write = None;
	}

	fn connection_changed(&mut self, connection: Connection) -> Vec<Effect> {
		if !connection.is_ready() {
			self.connection = connection;
			if self.phase == SessionPhase::Disconnected {
				return Vec::new();
			}
			self.reset();
			self.transition(SessionPhase::Disconnected);
			return vec![Effect::CancelTracking];
		}

		let previous = std::mem::replace(&mut self.connection, connection);
		self.last_error = None;

		if self.phase == SessionPhase::Disconnected {
			self.transition(SessionPhase::Connected);
			return Vec::new();
		}

		if previous.address != self.connection.address {
			tracing::info!(phase = %self.phase, "Active address changed, resetting session");
			self.reset();
			self.transition(SessionPhase::Connected);
			return vec![Effect::CancelTracking];
		}

		// A newer epoch means the wallet disconnected in between.
		if previous.epoch != self.connection.epoch {
			tracing::info!(
				phase = %self.phase,
				epoch = self.connection.epoch,
				"Wallet reconnected, resetting session"
			);
			self.reset();
			self.transition(SessionPhase::Connected);
			return vec![Effect::CancelTracking];
		}

		Vec::new()
	}

	fn batch_resolved(&mut self, request: RequestId, batch: QueryBatch) {
		if batch.is_pending() {
			tracing::debug!(request = %request, "Ignoring partially resolved batch");
			return;
		}
		let Some(purpose) = self.pending_reads.remove(&request) else {
			tracing::debug!(request = %request, "Ignoring stale read result");
			return;
		};

		for (query, result) in batch.iter() {
			self.reads
				.insert(query.function_name().to_string(), result.clone());
		}

		match purpose {
			ReadPurpose::Verify if self.phase == SessionPhase::Verifying => {
				let verified = batch
					.get(&self.settings.sentinel_function)
					.is_some_and(|result| self.is_expected_sentinel(result));
				if verified {
					self.transition(SessionPhase::Unlocked);
				} else {
					tracing::info!("Sentinel mismatch, contract not verified");
					self.transition(SessionPhase::Connected);
				}
			},
			ReadPurpose::Accounts if self.phase == SessionPhase::Unlocked => {
				match batch
					.get(&self.settings.accounts_function)
					.and_then(decode_accounts)
				{
					Some(accounts) => {
						tracing::info!(count = accounts.len(), "Loaded accounts");
						self.accounts = accounts;
					},
					None => tracing::debug!("Accounts read empty or malformed, keeping current set"),
				}
			},
			_ => {},
		}
	}

	fn is_expected_sentinel(&self, result: &QueryResult) -> bool {
		result
			.value
			.as_ref()
			.and_then(|payload| payload.normalize_into::<String>().ok())
			.is_some_and(|value| value == self.settings.expected_sentinel)
	}

	fn submission_resolved(
		&mut self,
		request: RequestId,
		outcome: Result<TransactionHash, String>,
	) -> Vec<Effect> {
		if self.pending_write != Some(request) {
			tracing::debug!(request = %request, "Ignoring stale submission result");
			return Vec::new();
		}
		self.pending_write = None;

		match outcome {
			Ok(hash) => {
				tracing::info!(tx_hash = %truncate_id(&hash.to_string()), "Transaction submitted");
				self.transaction = Transaction {
					id: Some(hash.clone()),
					submitted: true,
					confirming: true,
					confirmed: false,
					error: None,
				};
				vec![Effect::Track { hash }]
			},
			Err(error) => {
				tracing::warn!(error = %error, "Transaction submission failed");
				self.transaction.error = Some(error);
				Vec::new()
			},
		}
	}

	fn tracker_update(&mut self, hash: TransactionHash, status: TrackerStatus) {
		if !self.transaction.tracks(&hash)
			|| !self.transaction.confirming
			|| self.transaction.is_terminal()
		{
			tracing::debug!(tx_hash = %truncate_id(&hash.to_string()), status = ?status, "Ignoring stale tracker event");
			return;
		}

		match status {
			TrackerStatus::Idle | TrackerStatus::Pending => {},
			TrackerStatus::Confirmed { block_number } => {
				tracing::info!(tx_hash = %truncate_id(&hash.to_string()), block = block_number, "Transaction confirmed");
				self.transaction.confirming = false;
				self.transaction.confirmed = true;
			},
			TrackerStatus::Failed { reason } => {
				tracing::warn!(tx_hash = %truncate_id(&hash.to_string()), reason = %reason, "Transaction failed");
				self.transaction.confirming = false;
				self.transaction.error = Some(reason);
			},
		}
	}
}

/// Normalizes an accounts read into a non-empty list of identifiers.
fn decode_accounts(result: &QueryResult) -> Option<Vec<String>> {
	let accounts: Vec<String> = result.value.as_ref()?.normalize_into().ok()?;
	(!accounts.is_empty()).then_some(accounts)
}
