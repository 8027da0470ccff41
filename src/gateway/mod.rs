//! Request/response surface exposed to the application layer.
//!
//! Every operation resolves to a value or exactly one `Rejection`. Engine
//! calls are bounded by the configured timeout, so nothing waits forever.

/// Request, result and rejection types
mod types;

pub use types::*;

use crate::config::BridgeConfig;
use crate::engine::{
	BlockSource, DerivationTool, EngineFactory, EngineParams, InitMode, KeyMaterial, Network,
	UnifiedAddresses, bounded,
};
use crate::utils::{parse_zatoshi, txid_hex};
use crate::wallet::sync::events::{ChannelSink, EventDispatcher, OutboundRecord};
use crate::wallet::{BridgeError, SyncController, WalletRegistry};

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub type GatewayResult<T> = Result<T, Rejection>;

/// Thin facade over the registry and lifecycle controller.
pub struct Gateway {
	config: BridgeConfig,
	registry: WalletRegistry,
	controller: SyncController,
	tools: Arc<dyn DerivationTool>,
	block_source: Arc<dyn BlockSource>,
}

impl Gateway {
	pub fn new(
		config: BridgeConfig,
		factory: Arc<dyn EngineFactory>,
		tools: Arc<dyn DerivationTool>,
		block_source: Arc<dyn BlockSource>,
		dispatcher: EventDispatcher,
	) -> Self {
		let controller = SyncController::new(Arc::new(dispatcher), config.engine_timeout());
		Self {
			registry: WalletRegistry::new(factory),
			controller,
			config,
			tools,
			block_source,
		}
	}

	/// Build a gateway whose outbound records arrive on the returned channel.
	pub fn with_channel(
		config: BridgeConfig,
		factory: Arc<dyn EngineFactory>,
		tools: Arc<dyn DerivationTool>,
		block_source: Arc<dyn BlockSource>,
	) -> (Self, mpsc::UnboundedReceiver<OutboundRecord>) {
		let (sink, rx) = ChannelSink::new();
		let mut dispatcher = EventDispatcher::new();
		dispatcher.register_sink(Box::new(sink));
		(
			Self::new(config, factory, tools, block_source, dispatcher),
			rx,
		)
	}

	pub fn config(&self) -> &BridgeConfig {
		&self.config
	}

	pub fn registry(&self) -> &WalletRegistry {
		&self.registry
	}

	/// Create the wallet if needed, then start it.
	///
	/// An alias that already exists keeps the parameters it was created with.
	pub async fn initialize(&self, request: InitializeRequest) -> GatewayResult<()> {
		let params = EngineParams {
			endpoint: self.config.endpoint(request.host, request.port),
			init_mode: InitMode::from_new_wallet_flag(request.new_wallet),
			alias: request.alias,
			network: request.network,
			key_material: request.key_material,
			birthday_height: request.birthday_height,
		};
		info!(
			"Initializing wallet {} against {}",
			params.alias, params.endpoint
		);

		loop {
			let handle = self.registry.get_or_create(params.clone()).await?;
			match self.controller.start(&handle).await {
				// Retired by a concurrent stop; replace it once it is gone.
				Err(BridgeError::WalletNotFound(_)) => {
					debug!("[{}] Replacing retired wallet", params.alias);
					self.registry.remove_handle(&params.alias, &handle);
				}
				result => return result.map_err(Rejection::from),
			}
		}
	}

	pub async fn start(&self, alias: &str) -> GatewayResult<()> {
		let handle = self.registry.get(alias)?;
		self.controller.start(&handle).await?;
		Ok(())
	}

	/// Stop the wallet and forget it.
	///
	/// The handle is retired under its control lock before it leaves the
	/// registry, so a racing `initialize` cannot restart it.
	pub async fn stop(&self, alias: &str) -> GatewayResult<()> {
		let handle = self.registry.get(alias)?;
		self.controller.retire(&handle).await;
		self.registry.remove_handle(alias, &handle);
		Ok(())
	}

	pub async fn rescan(&self, alias: &str, target_height: Option<u64>) -> GatewayResult<()> {
		let handle = self.registry.get(alias)?;
		self.controller.rescan(&handle, target_height).await?;
		Ok(())
	}

	/// Per-pool balances most recently reported for `alias`; zero until the
	/// first balance notification of the current sync period.
	pub fn balance(&self, alias: &str) -> GatewayResult<BalanceResult> {
		let handle = self.registry.get(alias)?;
		Ok(BalanceResult::from(handle.last_balances().unwrap_or_default()))
	}

	pub async fn latest_network_height(&self, alias: &str) -> GatewayResult<u64> {
		let handle = self.registry.get(alias)?;
		let height = bounded(
			self.config.engine_timeout(),
			"latest_height",
			handle.engine().latest_height(),
		)
		.await
		.map_err(|e| BridgeError::NetworkQuery(e.to_string()))?;
		Ok(height)
	}

	/// Current chain tip of the block source at `host:port`, usable as a new wallet's birthday.
	pub async fn birthday_height(&self, host: &str, port: u16) -> GatewayResult<u64> {
		let endpoint = self.config.endpoint(Some(host.to_string()), Some(port));
		let height = bounded(
			self.config.engine_timeout(),
			"latest_block_height",
			self.block_source.latest_block_height(&endpoint),
		)
		.await
		.map_err(|e| {
			warn!("Block height query against {} failed: {}", endpoint, e);
			BridgeError::NetworkQuery(e.to_string())
		})?;
		Ok(height)
	}

	pub async fn derive_viewing_key(
		&self,
		seed: &KeyMaterial,
		network: Network,
	) -> GatewayResult<String> {
		let key = bounded(
			self.config.engine_timeout(),
			"derive_viewing_key",
			self.tools.derive_viewing_key(seed, network),
		)
		.await
		.map_err(|e| BridgeError::KeyDerivation(e.to_string()))?;
		Ok(key)
	}

	pub async fn derive_addresses(&self, alias: &str) -> GatewayResult<UnifiedAddresses> {
		let handle = self.registry.get(alias)?;
		let addresses = bounded(
			self.config.engine_timeout(),
			"addresses",
			handle.engine().addresses(self.config.account_index),
		)
		.await
		.map_err(|e| BridgeError::KeyDerivation(e.to_string()))?;
		Ok(addresses)
	}

	/// Never fails; malformed input is simply invalid.
	pub fn validate_address(&self, address: &str, network: Network) -> bool {
		!address.trim().is_empty() && self.tools.is_valid_address(address, network)
	}

	pub async fn send(&self, request: SendRequest) -> GatewayResult<SendResult> {
		let zatoshi = parse_zatoshi(&request.zatoshi).map_err(BridgeError::InvalidAmount)?;
		let handle = self.registry.get(&request.alias)?;
		let memo = Some(request.memo.as_str()).filter(|m| !m.is_empty());

		info!(
			"[{}] Sending {} zatoshi to {}",
			request.alias, zatoshi, request.to_address
		);
		let submitted = bounded(
			self.config.engine_timeout(),
			"send",
			handle.engine().send_to_address(
				&request.key_material,
				zatoshi,
				&request.to_address,
				memo,
			),
		)
		.await
		.map_err(|e| BridgeError::Spend(e.to_string()))?;

		let result = SendResult {
			tx_id: txid_hex(&submitted.raw_id),
			raw: submitted.raw.as_deref().map(hex::encode),
		};
		info!("[{}] Submitted transaction {}", request.alias, result.tx_id);
		Ok(result)
	}

	/// Shield transparent funds; returns the new transaction's id.
	pub async fn shield(&self, request: ShieldRequest) -> GatewayResult<String> {
		let threshold = parse_zatoshi(&request.threshold).map_err(BridgeError::Shielding)?;
		let handle = self.registry.get(&request.alias)?;

		info!(
			"[{}] Shielding transparent funds above {} zatoshi (memo: {:?})",
			request.alias, threshold, request.memo
		);
		let submitted = bounded(
			self.config.engine_timeout(),
			"shield",
			handle
				.engine()
				.shield_funds(&request.key_material, &request.memo, threshold),
		)
		.await
		.map_err(|e| BridgeError::Shielding(e.to_string()))?;

		Ok(txid_hex(&submitted.raw_id))
	}
}
