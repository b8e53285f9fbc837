//! Confirmation tracking for submitted transactions.

use crate::RpcInterface;
use bank_types::{truncate_id, TrackerStatus, TransactionHash};
use futures::stream::BoxStream;
use std::sync::Arc;
use std::time::Duration;

/// Stream of status updates for one tracked transaction.
pub type TrackerStream = BoxStream<'static, TrackerStatus>;

/// Observes a transaction from submission to a terminal outcome.
pub trait ConfirmationTracker: Send + Sync {
	/// Starts tracking `hash`.
	///
	/// The stream does nothing until polled and every call returns a fresh,
	/// independent stream. It yields `Pending` until the transaction reaches
	/// the configured depth, then exactly one terminal status and ends. With no
	/// hash it yields a single `Idle`.
	fn track(&self, hash: Option<TransactionHash>) -> TrackerStream;
}

/// Polling parameters for [`ReceiptTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerSettings {
	pub poll_interval: Duration,
	/// Blocks required counting the inclusion block, so 1 means mined.
	pub min_confirmations: u64,
	/// Consecutive failed lookups after which the transaction counts as lost.
	pub max_consecutive_failures: u32,
}

impl Default for TrackerSettings {
	fn default() -> Self {
		Self {
			poll_interval: Duration::from_secs(1),
			min_confirmations: 1,
			max_consecutive_failures: 5,
		}
	}
}

/// [`ConfirmationTracker`] polling `eth_getTransactionReceipt`.
pub struct ReceiptTracker {
	rpc: Arc<dyn RpcInterface>,
	settings: TrackerSettings,
}

impl ReceiptTracker {
	pub fn new(rpc: Arc<dyn RpcInterface>, settings: TrackerSettings) -> Self {
		Self { rpc, settings }
	}
}

impl ConfirmationTracker for ReceiptTracker {
	fn track(&self, hash: Option<TransactionHash>) -> TrackerStream {
		let rpc = self.rpc.clone();
		let settings = self.settings;

		Box::pin(async_stream::stream! {
			let Some(hash) = hash else {
				yield TrackerStatus::Idle;
				return;
			};

			let tx_hash = truncate_id(&hash.to_string());
			let mut failures = 0u32;

			loop {
				let lookup = match rpc.get_receipt(&hash).await {
					Ok(None) => Ok(None),
					Ok(Some(receipt)) if !receipt.success => {
						tracing::warn!(tx_hash = %tx_hash, block = receipt.block_number, "Transaction reverted");
						yield TrackerStatus::Failed {
							reason: "Transaction reverted".to_string(),
						};
						return;
					},
					Ok(Some(receipt)) if settings.min_confirmations <= 1 => Ok(Some((receipt.block_number, receipt.block_number))),
					Ok(Some(receipt)) => rpc
						.get_block_number()
						.await
						.map(|current| Some((receipt.block_number, current))),
					Err(e) => Err(e),
				};

				match lookup {
					Ok(None) => {
						failures = 0;
						tracing::debug!(tx_hash = %tx_hash, "Transaction not yet mined");
						yield TrackerStatus::Pending;
					},
					Ok(Some((block_number, current))) => {
						failures = 0;
						let confirmations = current.saturating_sub(block_number) + 1;
						if confirmations >= settings.min_confirmations {
							tracing::info!(tx_hash = %tx_hash, block = block_number, "Transaction confirmed");
							yield TrackerStatus::Confirmed { block_number };
							return;
						}
						tracing::debug!(
							tx_hash = %tx_hash,
							confirmations,
							required = settings.min_confirmations,
							"Waiting for confirmations"
						);
						yield TrackerStatus::Pending;
					},
					Err(e) => {
						failures += 1;
						tracing::warn!(tx_hash = %tx_hash, failures, error = %e, "Receipt lookup failed");
						if failures >= settings.max_consecutive_failures {
							yield TrackerStatus::Failed {
								reason: format!("Lost transaction after {} failed lookups: {}", failures, e),
							};
							return;
						}
					},
				}

				tokio::time::sleep(settings.poll_interval).await;
			}
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ChannelError;
	use async_trait::async_trait;
	use bank_types::{Address, TransactionReceipt};
	use futures::StreamExt;
	use std::collections::VecDeque;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Mutex;

	/// Node double replaying scripted receipt lookups; the last entry repeats.
	struct ScriptedRpc {
		receipts: Mutex<VecDeque<Result<Option<(u64, bool)>, String>>>,
		block_number: u64,
		lookups: AtomicUsize,
	}

	impl ScriptedRpc {
		fn new(script: Vec<Result<Option<(u64, bool)>, String>>, block_number: u64) -> Arc<Self> {
			Arc::new(Self {
				receipts: Mutex::new(script.into()),
				block_number,
				lookups: AtomicUsize::new(0),
			})
		}
	}

	#[async_trait]
	impl RpcInterface for ScriptedRpc {
		async fn call(&self, _to: &Address, _data: Vec<u8>) -> Result<Vec<u8>, ChannelError> {
			Err(ChannelError::Network("not scripted".into()))
		}

		async fn get_receipt(
			&self,
			hash: &TransactionHash,
		) -> Result<Option<TransactionReceipt>, ChannelError> {
			self.lookups.fetch_add(1, Ordering::SeqCst);
			let mut receipts = self.receipts.lock().unwrap();
			let next = if receipts.len() > 1 {
				receipts.pop_front()
			} else {
				receipts.front().cloned()
			};
			match next {
				Some(Ok(Some((block_number, success)))) => Ok(Some(TransactionReceipt {
					hash: hash.clone(),
					block_number,
					success,
				})),
				Some(Ok(None)) | None => Ok(None),
				Some(Err(e)) => Err(ChannelError::Network(e)),
			}
		}

		async fn get_block_number(&self) -> Result<u64, ChannelError> {
			Ok(self.block_number)
		}
	}

	fn hash() -> Option<TransactionHash> {
		Some(TransactionHash(vec![0xde, 0xad]))
	}

	fn settings(min_confirmations: u64) -> TrackerSettings {
		TrackerSettings {
			poll_interval: Duration::from_millis(100),
			min_confirmations,
			max_consecutive_failures: 3,
		}
	}

	#[tokio::test]
	async fn test_no_hash_yields_single_idle() {
		let rpc = ScriptedRpc::new(vec![], 0);
		let tracker = ReceiptTracker::new(rpc.clone(), settings(1));
		let statuses: Vec<_> = tracker.track(None).collect().await;
		assert_eq!(statuses, vec![TrackerStatus::Idle]);
		assert_eq!(rpc.lookups.load(Ordering::SeqCst), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn test_pending_then_confirmed() {
		let rpc = ScriptedRpc::new(vec![Ok(None), Ok(None), Ok(Some((7, true)))], 7);
		let tracker = ReceiptTracker::new(rpc, settings(1));
		let statuses: Vec<_> = tracker.track(hash()).collect().await;
		assert_eq!(
			statuses,
			vec![
				TrackerStatus::Pending,
				TrackerStatus::Pending,
				TrackerStatus::Confirmed { block_number: 7 },
			]
		);
	}

	#[tokio::test(start_paused = true)]
	async fn test_reverted_receipt_fails() {
		let rpc = ScriptedRpc::new(vec![Ok(Some((3, false)))], 3);
		let tracker = ReceiptTracker::new(rpc, settings(1));
		let statuses: Vec<_> = tracker.track(hash()).collect().await;
		assert_eq!(
			statuses,
			vec![TrackerStatus::Failed {
				reason: "Transaction reverted".into()
			}]
		);
	}

	#[tokio::test(start_paused = true)]
	async fn test_waits_for_depth() {
		// Mined in block 10 with the head at 11: two of three confirmations.
		let rpc = ScriptedRpc::new(vec![Ok(Some((10, true)))], 11);
		let tracker = ReceiptTracker::new(rpc, settings(3));
		let mut stream = tracker.track(hash());
		assert_eq!(stream.next().await, Some(TrackerStatus::Pending));
		assert_eq!(stream.next().await, Some(TrackerStatus::Pending));

		let rpc = ScriptedRpc::new(vec![Ok(Some((10, true)))], 12);
		let tracker = ReceiptTracker::new(rpc, settings(3));
		let statuses: Vec<_> = tracker.track(hash()).collect().await;
		assert_eq!(statuses, vec![TrackerStatus::Confirmed { block_number: 10 }]);
	}

	#[tokio::test(start_paused = true)]
	async fn test_consecutive_failures_lose_transaction() {
		let rpc = ScriptedRpc::new(
			vec![Err("timeout".into()), Err("timeout".into()), Err("timeout".into())],
			0,
		);
		let tracker = ReceiptTracker::new(rpc.clone(), settings(1));
		let statuses: Vec<_> = tracker.track(hash()).collect().await;
		assert_eq!(statuses.len(), 1);
		assert!(matches!(
			&statuses[0],
			TrackerStatus::Failed { reason } if reason.contains("Lost transaction")
		));
		assert_eq!(rpc.lookups.load(Ordering::SeqCst), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn test_success_resets_failure_count() {
		let rpc = ScriptedRpc::new(
			vec![
				Err("timeout".into()),
				Err("timeout".into()),
				Ok(None),
				Err("timeout".into()),
				Err("timeout".into()),
				Ok(Some((5, true))),
			],
			5,
		);
		let tracker = ReceiptTracker::new(rpc, settings(1));
		let statuses: Vec<_> = tracker.track(hash()).collect().await;
		assert_eq!(
			statuses,
			vec![
				TrackerStatus::Pending,
				TrackerStatus::Confirmed { block_number: 5 }
			]
		);
	}

	#[tokio::test(start_paused = true)]
	async fn test_lazy_and_restartable() {
		let rpc = ScriptedRpc::new(vec![Ok(Some((1, true)))], 1);
		let tracker = ReceiptTracker::new(rpc.clone(), settings(1));

		let first = tracker.track(hash());
		let second = tracker.track(hash());
		assert_eq!(rpc.lookups.load(Ordering::SeqCst), 0);

		let first: Vec<_> = first.collect().await;
		let second: Vec<_> = second.collect().await;
		assert_eq!(first, second);
		assert_eq!(rpc.lookups.load(Ordering::SeqCst), 2);
	}
}
