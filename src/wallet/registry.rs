//! Alias to wallet handle table.

use crate::engine::{EngineFactory, EngineParams};
use crate::wallet::handle::WalletHandle;
use crate::wallet::types::BridgeError;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OnceCell;
use tracing::{info, warn};

type Slot = Arc<OnceCell<Arc<WalletHandle>>>;

/// Concurrency-safe registry of wallet handles keyed by alias.
///
/// Each alias maps to a once-cell, so concurrent `get_or_create` calls for
/// the same alias construct at most one engine at a time and every caller
/// observes the winner's handle.
pub struct WalletRegistry {
	factory: Arc<dyn EngineFactory>,
	entries: Mutex<HashMap<String, Slot>>,
}

impl WalletRegistry {
	pub fn new(factory: Arc<dyn EngineFactory>) -> Self {
		Self {
			factory,
			entries: Mutex::new(HashMap::new()),
		}
	}

	fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
		self.entries.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Return the handle for `params.alias`, constructing its engine if absent.
	///
	/// An existing wallet wins: the remaining parameters are ignored. If
	/// construction fails nothing is inserted.
	pub async fn get_or_create(&self, params: EngineParams) -> Result<Arc<WalletHandle>, BridgeError> {
		let alias = params.alias.clone();
		let slot = self
			.lock_entries()
			.entry(alias.clone())
			.or_insert_with(|| Arc::new(OnceCell::new()))
			.clone();

		let factory = self.factory.clone();
		let result = slot
			.get_or_try_init(move || async move {
				info!(
					"Creating synchronizer for wallet {} on {} (birthday {})",
					params.alias, params.network, params.birthday_height
				);
				let alias = params.alias.clone();
				let network = params.network;
				let birthday_height = params.birthday_height;
				let engine = factory.create(params).await.map_err(|e| {
					warn!("Engine construction failed for wallet {}: {}", alias, e);
					BridgeError::EngineInitialization(e.to_string())
				})?;
				Ok::<_, BridgeError>(Arc::new(WalletHandle::new(
					alias,
					network,
					birthday_height,
					engine,
				)))
			})
			.await;

		match result {
			Ok(handle) => Ok(handle.clone()),
			Err(e) => {
				let mut entries = self.lock_entries();
				let vacant = entries
					.get(&alias)
					.is_some_and(|existing| Arc::ptr_eq(existing, &slot) && !existing.initialized());
				if vacant {
					entries.remove(&alias);
				}
				Err(e)
			}
		}
	}

	pub fn get(&self, alias: &str) -> Result<Arc<WalletHandle>, BridgeError> {
		self.lock_entries()
			.get(alias)
			.and_then(|slot| slot.get().cloned())
			.ok_or_else(|| BridgeError::WalletNotFound(alias.to_string()))
	}

	/// Drop the entry for `alias`. The caller stops the handle first.
	pub fn remove(&self, alias: &str) -> Option<Arc<WalletHandle>> {
		self.lock_entries()
			.remove(alias)
			.and_then(|slot| slot.get().cloned())
	}

	/// Drop the entry for `alias` only if it still holds `handle`.
	pub fn remove_handle(&self, alias: &str, handle: &Arc<WalletHandle>) -> bool {
		let mut entries = self.lock_entries();
		let current = entries
			.get(alias)
			.and_then(|slot| slot.get())
			.is_some_and(|existing| Arc::ptr_eq(existing, handle));
		if current {
			entries.remove(alias);
		}
		current
	}

	pub fn aliases(&self) -> Vec<String> {
		self.lock_entries()
			.iter()
			.filter(|(_, slot)| slot.initialized())
			.map(|(alias, _)| alias.clone())
			.collect()
	}
}
