//! Executors for session effects.
//!
//! Each executor runs on its own task and reports back to the engine inbox.
//! A closed inbox means the engine has stopped, so send failures are dropped.

use bank_channel::{ConfirmationTracker, ReadChannel, WriteChannel};
use bank_types::{
	truncate_id, ContractDescriptor, ContractQuery, RequestId, SessionEvent, TransactionHash,
};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::instrument;

pub(crate) type Inbox = mpsc::UnboundedSender<SessionEvent>;

#[instrument(skip_all, fields(request = %request, queries = queries.len()))]
pub(crate) async fn execute_read(
	reader: Arc<dyn ReadChannel>,
	descriptor: Arc<ContractDescriptor>,
	request: RequestId,
	queries: Vec<ContractQuery>,
	inbox: Inbox,
) {
	let batch = reader.read_batch(&descriptor, queries).await;
	tracing::debug!("Read batch resolved");
	inbox
		.send(SessionEvent::BatchResolved { request, batch })
		.ok();
}

#[instrument(skip_all, fields(request = %request, function = %query.function_name()))]
pub(crate) async fn execute_submit(
	writer: Arc<dyn WriteChannel>,
	descriptor: Arc<ContractDescriptor>,
	request: RequestId,
	query: ContractQuery,
	inbox: Inbox,
) {
	let outcome = writer
		.submit(&descriptor, query)
		.await
		.map_err(|e| e.to_string());
	if let Err(error) = &outcome {
		tracing::warn!(error = %error, "Submission failed");
	}
	inbox
		.send(SessionEvent::SubmissionResolved { request, outcome })
		.ok();
}

#[instrument(skip_all, fields(tx_hash = %truncate_id(&hash.to_string())))]
pub(crate) async fn execute_track(
	tracker: Arc<dyn ConfirmationTracker>,
	hash: TransactionHash,
	inbox: Inbox,
) {
	let mut statuses = tracker.track(Some(hash.clone()));
	while let Some(status) = statuses.next().await {
		let terminal = status.is_terminal();
		let event = SessionEvent::Tracker {
			hash: hash.clone(),
			status,
		};
		if inbox.send(event).is_err() || terminal {
			break;
		}
	}
	tracing::debug!("Tracking finished");
}
