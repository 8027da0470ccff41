//! One wallet: its synchronizer instance and everything emitted on its behalf.

use crate::engine::{Network, SyncEngine};
use crate::wallet::sync::lifecycle::Subscription;
use crate::wallet::sync::transaction_detector::TransactionMemo;
use crate::wallet::sync::translator::{BalanceSnapshot, TranslatorCache};
use crate::wallet::types::LifecycleState;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Emission caches plus the subscription generation that may write to them.
#[derive(Debug, Default)]
pub(crate) struct HandleState {
	generation: u64,
	pub(crate) translator: TranslatorCache,
	pub(crate) memo: TransactionMemo,
}

/// State shared between a handle and its subscription tasks.
#[derive(Debug)]
pub(crate) struct HandleShared {
	state: Mutex<HandleState>,
	lifecycle: Mutex<LifecycleState>,
	degraded: AtomicBool,
}

impl HandleShared {
	fn new() -> Self {
		Self {
			state: Mutex::new(HandleState::default()),
			lifecycle: Mutex::new(LifecycleState::Uninitialized),
			degraded: AtomicBool::new(false),
		}
	}

	fn lock_state(&self) -> MutexGuard<'_, HandleState> {
		self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Run `f` on the caches only if `generation` is still current.
	///
	/// The check and `f` happen under one lock, so once `invalidate` has
	/// returned no stale subscription can touch the caches or emit.
	pub(crate) fn with_generation<R>(
		&self,
		generation: u64,
		f: impl FnOnce(&mut HandleState) -> R,
	) -> Option<R> {
		let mut state = self.lock_state();
		if state.generation != generation {
			return None;
		}
		Some(f(&mut state))
	}

	pub(crate) fn generation(&self) -> u64 {
		self.lock_state().generation
	}

	/// Retire the current generation. Returns the new one.
	pub(crate) fn invalidate(&self) -> u64 {
		let mut state = self.lock_state();
		state.generation += 1;
		state.generation
	}

	pub(crate) fn update(&self, f: impl FnOnce(&mut HandleState)) {
		f(&mut self.lock_state());
	}

	pub(crate) fn lifecycle(&self) -> LifecycleState {
		*self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
	}

	pub(crate) fn set_lifecycle(&self, state: LifecycleState) {
		*self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner) = state;
	}

	pub(crate) fn mark_degraded(&self) {
		self.degraded.store(true, Ordering::SeqCst);
	}

	pub(crate) fn clear_degraded(&self) {
		self.degraded.store(false, Ordering::SeqCst);
	}
}

/// Lifecycle bookkeeping guarded by the handle's async control lock.
#[derive(Default)]
pub(crate) struct Control {
	pub(crate) prepared: bool,
	/// Set once the handle has been removed from service.
	pub(crate) retired: bool,
	pub(crate) subscription: Option<Subscription>,
}

/// Owns one synchronizer instance and its emitted-state caches.
///
/// `start`, `stop` and `rescan` for the same handle are serialized through
/// the control lock; different handles never contend.
pub struct WalletHandle {
	alias: String,
	network: Network,
	birthday_height: u64,
	engine: Arc<dyn SyncEngine>,
	pub(crate) control: tokio::sync::Mutex<Control>,
	pub(crate) shared: Arc<HandleShared>,
}

impl WalletHandle {
	pub(crate) fn new(
		alias: String,
		network: Network,
		birthday_height: u64,
		engine: Arc<dyn SyncEngine>,
	) -> Self {
		Self {
			alias,
			network,
			birthday_height,
			engine,
			control: tokio::sync::Mutex::new(Control::default()),
			shared: Arc::new(HandleShared::new()),
		}
	}

	pub fn alias(&self) -> &str {
		&self.alias
	}

	pub fn network(&self) -> Network {
		self.network
	}

	pub fn birthday_height(&self) -> u64 {
		self.birthday_height
	}

	pub fn lifecycle_state(&self) -> LifecycleState {
		self.shared.lifecycle()
	}

	/// True after a critical engine error, until the next start.
	pub fn is_degraded(&self) -> bool {
		self.shared.degraded.load(Ordering::SeqCst)
	}

	/// Number of transactions currently in the change-detection memo.
	pub fn tracked_transactions(&self) -> usize {
		self.shared.lock_state().memo.len()
	}

	/// Balances last sent outward, or `None` before the first balance
	/// notification of this sync period.
	pub fn last_balances(&self) -> Option<BalanceSnapshot> {
		self.shared.lock_state().translator.emitted_balances
	}

	pub(crate) fn engine(&self) -> &Arc<dyn SyncEngine> {
		&self.engine
	}
}

impl std::fmt::Debug for WalletHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("WalletHandle")
			.field("alias", &self.alias)
			.field("network", &self.network)
			.field("birthday_height", &self.birthday_height)
			.field("lifecycle", &self.lifecycle_state())
			.finish()
	}
}
