use crate::engine::{
	EngineError, EngineEvent, EngineState, EngineStream, SyncEngine, TransactionOverview, bounded,
};
use crate::wallet::handle::{Control, HandleShared, WalletHandle};
use crate::wallet::sync::events::{EventDispatcher, OutboundRecord};
use crate::wallet::sync::transaction_detector::{
	TransactionChangeDetector, TransactionMemo, summarize,
};
use crate::wallet::sync::translator::{EventTranslator, TranslatorCache};
use crate::wallet::types::{BridgeError, LifecycleState};

use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// The tasks consuming one subscription set, tagged with the generation they
/// were installed under.
pub(crate) struct Subscription {
	generation: u64,
	tasks: Vec<JoinHandle<()>>,
}

impl Subscription {
	fn cancel(self) {
		debug!("Cancelling subscription generation {}", self.generation);
		for task in self.tasks {
			task.abort();
		}
	}
}

/// Everything a subscription task needs, without a reference back to the handle.
struct SubscriptionContext {
	alias: String,
	generation: u64,
	translator: EventTranslator,
	detector: TransactionChangeDetector,
	shared: Arc<HandleShared>,
	engine: Arc<dyn SyncEngine>,
	dispatcher: Arc<EventDispatcher>,
}

impl SubscriptionContext {
	fn dispatch_all(&self, records: &[OutboundRecord]) {
		for record in records {
			self.dispatcher.dispatch(record);
		}
	}

	/// Returns false once the subscription has been superseded.
	fn on_state(&self, state: &EngineState) -> bool {
		self.shared
			.with_generation(self.generation, |cached| {
				let translation = self.translator.translate_state(&cached.translator, state);
				cached.translator = translation.cache;
				self.dispatch_all(&translation.records);
			})
			.is_some()
	}

	async fn on_event(&self, event: EngineEvent) -> bool {
		match event {
			EngineEvent::TransactionsUpdated(transactions) => {
				self.on_transactions(&transactions).await
			}
			other => {
				let Some(translation) = self.translator.translate_error(&other) else {
					return true;
				};
				self.shared
					.with_generation(self.generation, |_| {
						if translation.critical {
							error!("[{}] Critical engine error", self.alias);
							self.shared.mark_degraded();
						}
						self.dispatcher.dispatch(&translation.record);
					})
					.is_some()
			}
		}
	}

	/// The memo is committed together with the record it produced, so a
	/// transaction dropped by cancellation is reported again later.
	///
	/// Only this task writes the memo during its generation.
	async fn on_transactions(&self, transactions: &[TransactionOverview]) -> bool {
		let Some(memo) = self
			.shared
			.with_generation(self.generation, |cached| cached.memo.clone())
		else {
			return false;
		};
		let detection = self.detector.detect(&memo, transactions);
		if detection.changed.is_empty() {
			return self
				.shared
				.with_generation(self.generation, |cached| cached.memo = detection.memo)
				.is_some();
		}

		debug!(
			"[{}] {} of {} transactions changed",
			self.alias,
			detection.changed.len(),
			transactions.len()
		);

		let mut summaries = Vec::with_capacity(detection.changed.len());
		for tx in &detection.changed {
			let outcome = summarize(self.engine.as_ref(), tx).await;
			for omission in &outcome.omissions {
				debug!(
					"[{}] Omitted {} from transaction {}: {}",
					self.alias, omission.field, outcome.summary.raw_id_hex, omission.reason
				);
			}
			summaries.push(outcome.summary);
		}

		let record = OutboundRecord::TransactionsChanged {
			alias: self.alias.clone(),
			transactions: summaries,
		};
		let memo = detection.memo;
		self.shared
			.with_generation(self.generation, |cached| {
				cached.memo = memo;
				self.dispatcher.dispatch(&record);
			})
			.is_some()
	}
}

async fn consume_states(context: Arc<SubscriptionContext>, mut states: EngineStream<EngineState>) {
	while let Some(state) = states.next().await {
		if !context.on_state(&state) {
			break;
		}
	}
	debug!(
		"[{}] State subscription {} finished",
		context.alias, context.generation
	);
}

async fn consume_events(context: Arc<SubscriptionContext>, mut events: EngineStream<EngineEvent>) {
	while let Some(event) = events.next().await {
		if !context.on_event(event).await {
			break;
		}
	}
	debug!(
		"[{}] Event subscription {} finished",
		context.alias, context.generation
	);
}

/// Drives start, stop and rescan for wallet handles.
///
/// Operations on one handle are serialized by the handle's control lock.
/// Each `start` installs exactly one subscription set; `stop` and `rescan`
/// retire its generation before anything else so no record can leave a
/// cancelled subscription.
pub struct SyncController {
	dispatcher: Arc<EventDispatcher>,
	engine_timeout: Duration,
}

impl SyncController {
	pub fn new(dispatcher: Arc<EventDispatcher>, engine_timeout: Duration) -> Self {
		Self {
			dispatcher,
			engine_timeout,
		}
	}

	/// Start syncing. A no-op while already starting or running.
	///
	/// Fails with `WalletNotFound` once the handle has been retired.
	pub async fn start(&self, handle: &WalletHandle) -> Result<(), BridgeError> {
		let mut control = handle.control.lock().await;
		if control.retired {
			return Err(BridgeError::WalletNotFound(handle.alias().to_string()));
		}
		let current = handle.lifecycle_state();
		if matches!(current, LifecycleState::Running | LifecycleState::Starting) {
			debug!("[{}] Start ignored, wallet is {}", handle.alias(), current);
			return Ok(());
		}

		info!("[{}] Starting synchronizer", handle.alias());
		handle.shared.set_lifecycle(LifecycleState::Starting);

		match self.bring_up(handle, &mut control).await {
			Ok(subscription) => {
				control.subscription = Some(subscription);
				handle.shared.set_lifecycle(LifecycleState::Running);
				info!("[{}] Synchronizer running", handle.alias());
				Ok(())
			}
			Err(e) => {
				warn!("[{}] Synchronizer failed to start: {}", handle.alias(), e);
				handle.shared.set_lifecycle(LifecycleState::Stopped);
				Err(BridgeError::Start(e.to_string()))
			}
		}
	}

	async fn bring_up(
		&self,
		handle: &WalletHandle,
		control: &mut Control,
	) -> Result<Subscription, EngineError> {
		if !control.prepared {
			bounded(self.engine_timeout, "prepare", handle.engine().prepare()).await?;
			control.prepared = true;
		}

		handle.shared.update(|cached| {
			cached.translator.fully_synced = false;
			cached.translator.suppress_next_synced = false;
		});
		handle.shared.clear_degraded();

		self.launch(handle).await
	}

	/// Subscribe, then start the engine so no early notification is missed.
	async fn launch(&self, handle: &WalletHandle) -> Result<Subscription, EngineError> {
		let subscription = self.subscribe(handle);
		if let Err(e) = bounded(self.engine_timeout, "start", handle.engine().start()).await {
			handle.shared.invalidate();
			subscription.cancel();
			return Err(e);
		}
		Ok(subscription)
	}

	fn subscribe(&self, handle: &WalletHandle) -> Subscription {
		let generation = handle.shared.generation();
		let engine = handle.engine();
		let context = Arc::new(SubscriptionContext {
			alias: handle.alias().to_string(),
			generation,
			translator: EventTranslator::new(handle.alias(), handle.birthday_height()),
			detector: TransactionChangeDetector,
			shared: handle.shared.clone(),
			engine: engine.clone(),
			dispatcher: self.dispatcher.clone(),
		});

		let states = engine.state_stream();
		let events = engine.event_stream();
		debug!(
			"[{}] Installing subscription generation {}",
			handle.alias(),
			generation
		);

		Subscription {
			generation,
			tasks: vec![
				tokio::spawn(consume_states(context.clone(), states)),
				tokio::spawn(consume_events(context, events)),
			],
		}
	}

	/// Retire the current generation and abort its tasks.
	fn cancel_subscription(handle: &WalletHandle, control: &mut Control) {
		handle.shared.invalidate();
		if let Some(subscription) = control.subscription.take() {
			subscription.cancel();
		}
	}

	/// Stop syncing. Never fails; a no-op on a stopped handle.
	pub async fn stop(&self, handle: &WalletHandle) {
		let mut control = handle.control.lock().await;
		self.stop_locked(handle, &mut control).await;
	}

	/// Stop the handle for good. Later `start` and `rescan` calls on it fail
	/// with `WalletNotFound`, so a caller racing a removal cannot revive it.
	pub async fn retire(&self, handle: &WalletHandle) {
		let mut control = handle.control.lock().await;
		self.stop_locked(handle, &mut control).await;
		control.retired = true;
		debug!("[{}] Handle retired", handle.alias());
	}

	async fn stop_locked(&self, handle: &WalletHandle, control: &mut Control) {
		let current = handle.lifecycle_state();
		if current == LifecycleState::Stopped {
			debug!("[{}] Stop ignored, wallet already stopped", handle.alias());
			return;
		}

		info!("[{}] Stopping synchronizer", handle.alias());
		handle.shared.set_lifecycle(LifecycleState::Stopping);
		Self::cancel_subscription(handle, control);

		if current != LifecycleState::Uninitialized {
			if let Err(e) = bounded(self.engine_timeout, "stop", handle.engine().stop()).await {
				warn!("[{}] Engine failed to stop cleanly: {}", handle.alias(), e);
			}
		}

		handle.shared.set_lifecycle(LifecycleState::Stopped);
		info!("[{}] Synchronizer stopped", handle.alias());
	}

	/// Rewind to `target_height` (the birthday if `None`) and sync forward again.
	///
	/// Only legal while running. On failure the handle is left stopped.
	pub async fn rescan(
		&self,
		handle: &WalletHandle,
		target_height: Option<u64>,
	) -> Result<(), BridgeError> {
		let mut control = handle.control.lock().await;
		if control.retired {
			return Err(BridgeError::WalletNotFound(handle.alias().to_string()));
		}
		let current = handle.lifecycle_state();
		if current != LifecycleState::Running {
			return Err(BridgeError::Rescan(format!(
				"wallet {} is {}, not running",
				handle.alias(),
				current
			)));
		}

		let height = target_height.unwrap_or(handle.birthday_height());
		info!("[{}] Rescanning from height {}", handle.alias(), height);

		handle.shared.set_lifecycle(LifecycleState::Starting);
		Self::cancel_subscription(handle, &mut control);
		handle.shared.update(|cached| {
			cached.translator = TranslatorCache::after_rescan();
			cached.memo = TransactionMemo::default();
		});

		match self.rewind_and_restart(handle, height).await {
			Ok(subscription) => {
				control.subscription = Some(subscription);
				handle.shared.set_lifecycle(LifecycleState::Running);
				info!("[{}] Rescan started", handle.alias());
				Ok(())
			}
			Err(e) => {
				warn!("[{}] Rescan failed: {}", handle.alias(), e);
				if let Err(stop_error) =
					bounded(self.engine_timeout, "stop", handle.engine().stop()).await
				{
					warn!(
						"[{}] Engine failed to stop after rescan failure: {}",
						handle.alias(),
						stop_error
					);
				}
				handle.shared.set_lifecycle(LifecycleState::Stopped);
				Err(BridgeError::Rescan(e.to_string()))
			}
		}
	}

	async fn rewind_and_restart(
		&self,
		handle: &WalletHandle,
		height: u64,
	) -> Result<Subscription, EngineError> {
		bounded(self.engine_timeout, "rewind", handle.engine().rewind(height)).await?;
		self.launch(handle).await
	}
}
