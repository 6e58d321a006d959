//! Supervised background cache writes.
//!
//! Resolution tasks hand finished records to the [`CacheWriter`] and move on.
//! Writes travel over a channel to a supervisor task that runs each one
//! detached from the request under its own timeout, so a cancelled or failed
//! request never aborts a write already handed over.

use lime_storage::StorageInterface;
use lime_types::{OwnershipToken, TransactionRecord};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, warn};

enum WriterCommand {
	Write(TransactionRecord, Option<OwnershipToken>),
	Drain(oneshot::Sender<()>),
}

#[derive(Clone)]
pub struct CacheWriter {
	commands: mpsc::UnboundedSender<WriterCommand>,
	in_flight: Arc<AtomicUsize>,
}

impl CacheWriter {
	/// Starts the supervisor task; must be called inside a Tokio runtime.
	pub fn new(storage: Arc<dyn StorageInterface>, timeout: Duration) -> Self {
		let (commands, command_rx) = mpsc::unbounded_channel();
		let in_flight = Arc::new(AtomicUsize::new(0));
		tokio::spawn(supervise(storage, timeout, command_rx, in_flight.clone()));

		Self {
			commands,
			in_flight,
		}
	}

	/// Schedules `record` (and its link to `token`) to be stored.
	/// Failures are logged and dropped.
	pub fn submit(&self, record: TransactionRecord, token: Option<OwnershipToken>) {
		self.in_flight.fetch_add(1, Ordering::SeqCst);
		if self
			.commands
			.send(WriterCommand::Write(record, token))
			.is_err()
		{
			self.in_flight.fetch_sub(1, Ordering::SeqCst);
			warn!("Cache writer stopped, dropping write");
		}
	}

	/// Number of submitted writes that have not finished yet.
	pub fn in_flight(&self) -> usize {
		self.in_flight.load(Ordering::SeqCst)
	}

	/// Waits until every submitted write has finished, including writes
	/// submitted while draining.
	pub async fn drain(&self) {
		let (done, finished) = oneshot::channel();
		if self.commands.send(WriterCommand::Drain(done)).is_err() {
			return;
		}
		let _ = finished.await;
	}
}

async fn supervise(
	storage: Arc<dyn StorageInterface>,
	timeout: Duration,
	mut commands: mpsc::UnboundedReceiver<WriterCommand>,
	in_flight: Arc<AtomicUsize>,
) {
	let mut tasks = JoinSet::new();
	let mut waiters: Vec<oneshot::Sender<()>> = Vec::new();
	let mut open = true;

	loop {
		tokio::select! {
			command = commands.recv(), if open => match command {
				Some(WriterCommand::Write(record, token)) => {
					tasks.spawn(write(storage.clone(), timeout, record, token));
				}
				Some(WriterCommand::Drain(done)) => waiters.push(done),
				None => open = false,
			},
			Some(result) = tasks.join_next(), if !tasks.is_empty() => {
				in_flight.fetch_sub(1, Ordering::SeqCst);
				if let Err(e) = result {
					warn!(error = %e, "Cache write task failed");
				}
			}
			else => break,
		}

		if tasks.is_empty() {
			for done in waiters.drain(..) {
				let _ = done.send(());
			}
		}
	}
}

async fn write(
	storage: Arc<dyn StorageInterface>,
	timeout: Duration,
	record: TransactionRecord,
	token: Option<OwnershipToken>,
) {
	let hash = record.transaction_hash.clone();
	match tokio::time::timeout(timeout, storage.store_tx(&record, token.as_ref())).await {
		Ok(Ok(())) => debug!(hash = %hash, "Cached transaction"),
		Ok(Err(e)) => warn!(hash = %hash, error = %e, "Failed to cache transaction"),
		Err(_) => warn!(
			hash = %hash,
			timeout_ms = timeout.as_millis() as u64,
			"Cache write timed out"
		),
	}
}
