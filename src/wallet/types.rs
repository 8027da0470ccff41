use serde::Serialize;
use std::fmt;

/// Lifecycle of one wallet handle's synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
	Uninitialized,
	Starting,
	Running,
	Stopping,
	Stopped,
}

impl fmt::Display for LifecycleState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			LifecycleState::Uninitialized => "uninitialized",
			LifecycleState::Starting => "starting",
			LifecycleState::Running => "running",
			LifecycleState::Stopping => "stopping",
			LifecycleState::Stopped => "stopped",
		};
		f.write_str(name)
	}
}

/// Failures surfaced across the bridge boundary.
///
/// Engine errors are converted into one of these before leaving the crate;
/// the message carries the engine's diagnostic text verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
	#[error("Wallet does not exist: {0}")]
	WalletNotFound(String),

	#[error("Synchronizer failed to initialize: {0}")]
	EngineInitialization(String),

	#[error("Synchronizer failed to start: {0}")]
	Start(String),

	#[error("Failed to rescan wallet: {0}")]
	Rescan(String),

	#[error("Amount is invalid: {0}")]
	InvalidAmount(String),

	#[error("Failed to spend: {0}")]
	Spend(String),

	#[error("Failed to shield funds: {0}")]
	Shielding(String),

	#[error("Failed to derive key: {0}")]
	KeyDerivation(String),

	#[error("Failed to query block height: {0}")]
	NetworkQuery(String),
}

impl BridgeError {
	/// Stable machine-readable code for the application layer.
	pub fn kind(&self) -> &'static str {
		match self {
			BridgeError::WalletNotFound(_) => "WalletNotFoundError",
			BridgeError::EngineInitialization(_) => "EngineInitializationError",
			BridgeError::Start(_) => "StartError",
			BridgeError::Rescan(_) => "RescanError",
			BridgeError::InvalidAmount(_) => "InvalidAmountError",
			BridgeError::Spend(_) => "SpendError",
			BridgeError::Shielding(_) => "ShieldingError",
			BridgeError::KeyDerivation(_) => "KeyDerivationError",
			BridgeError::NetworkQuery(_) => "NetworkQueryError",
		}
	}
}
