//! Seam to the external Zcash wallet engine.
//!
//! Chain sync, note scanning, key derivation and transaction construction all
//! live in the engine. The bridge only drives it through the traits below and
//! consumes its notification streams.

#[cfg(test)]
pub(crate) mod fake;
/// Type definitions for engine data structures
mod types;

pub use types::*;

use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Stream of engine notifications. The engine serializes its own deliveries.
pub type EngineStream<T> = Pin<Box<dyn Stream<Item = T> + Send>>;

/// Await an engine call, failing once `limit` has elapsed.
pub(crate) async fn bounded<T>(
	limit: Duration,
	operation: &str,
	call: impl Future<Output = Result<T, EngineError>>,
) -> Result<T, EngineError> {
	tokio::time::timeout(limit, call).await.map_err(|_| {
		EngineError::Operation(format!(
			"{} timed out after {}s",
			operation,
			limit.as_secs()
		))
	})?
}

/// One running synchronizer instance owned by a wallet handle.
#[async_trait::async_trait]
pub trait SyncEngine: Send + Sync {
	/// Open storage and bind the key material. Called once per handle.
	async fn prepare(&self) -> Result<(), EngineError>;

	async fn start(&self) -> Result<(), EngineError>;

	async fn stop(&self) -> Result<(), EngineError>;

	/// Discard scan progress back to (at most) `height`.
	async fn rewind(&self, height: u64) -> Result<(), EngineError>;

	async fn latest_height(&self) -> Result<u64, EngineError>;

	/// Open a fresh subscription to state notifications.
	fn state_stream(&self) -> EngineStream<EngineState>;

	/// Open a fresh subscription to transaction and error notifications.
	fn event_stream(&self) -> EngineStream<EngineEvent>;

	async fn recipients(&self, tx: &TransactionOverview) -> Result<Vec<Recipient>, EngineError>;

	async fn memos(&self, tx: &TransactionOverview) -> Result<Vec<String>, EngineError>;

	async fn addresses(&self, account: u32) -> Result<UnifiedAddresses, EngineError>;

	async fn send_to_address(
		&self,
		spending_material: &KeyMaterial,
		zatoshi: u64,
		to_address: &str,
		memo: Option<&str>,
	) -> Result<SubmittedTransaction, EngineError>;

	async fn shield_funds(
		&self,
		spending_material: &KeyMaterial,
		memo: &str,
		threshold: u64,
	) -> Result<SubmittedTransaction, EngineError>;
}

/// Constructs synchronizer instances.
#[async_trait::async_trait]
pub trait EngineFactory: Send + Sync {
	async fn create(&self, params: EngineParams) -> Result<Arc<dyn SyncEngine>, EngineError>;
}

/// Stateless key and address tooling, independent of any wallet instance.
#[async_trait::async_trait]
pub trait DerivationTool: Send + Sync {
	async fn derive_viewing_key(
		&self,
		seed: &KeyMaterial,
		network: Network,
	) -> Result<String, EngineError>;

	/// True if `address` is a valid unified, sapling or transparent address on `network`.
	fn is_valid_address(&self, address: &str, network: Network) -> bool;
}

/// Queries a block source directly, without a wallet.
#[async_trait::async_trait]
pub trait BlockSource: Send + Sync {
	async fn latest_block_height(&self, endpoint: &Endpoint) -> Result<u64, EngineError>;
}
