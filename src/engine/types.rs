//! Types exchanged with the external wallet engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Zcash network a wallet runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
	Mainnet,
	Testnet,
}

impl Network {
	pub fn as_str(&self) -> &'static str {
		match self {
			Network::Mainnet => "mainnet",
			Network::Testnet => "testnet",
		}
	}
}

impl fmt::Display for Network {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Network {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"mainnet" => Ok(Network::Mainnet),
			"testnet" => Ok(Network::Testnet),
			other => Err(format!("unknown network: {}", other)),
		}
	}
}

/// Block source endpoint (lightwalletd host and port).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
	pub host: String,
	pub port: u16,
	pub secure: bool,
}

impl Endpoint {
	pub fn new(host: impl Into<String>, port: u16, secure: bool) -> Self {
		Self {
			host: host.into(),
			port,
			secure,
		}
	}
}

impl fmt::Display for Endpoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.host, self.port)
	}
}

/// Whether the engine should treat the wallet as freshly generated or restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitMode {
	NewWallet,
	ExistingWallet,
}

impl InitMode {
	pub fn from_new_wallet_flag(new_wallet: bool) -> Self {
		if new_wallet {
			InitMode::NewWallet
		} else {
			InitMode::ExistingWallet
		}
	}
}

/// Secret or viewing material handed to the engine.
///
/// The engine owns all interpretation of this material; the bridge only
/// moves it around and never logs it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum KeyMaterial {
	SeedPhrase(String),
	ViewingKey(String),
}

impl fmt::Debug for KeyMaterial {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			KeyMaterial::SeedPhrase(_) => f.write_str("SeedPhrase(<redacted>)"),
			KeyMaterial::ViewingKey(_) => f.write_str("ViewingKey(<redacted>)"),
		}
	}
}

/// Everything the engine factory needs to construct one synchronizer.
#[derive(Debug, Clone)]
pub struct EngineParams {
	pub alias: String,
	pub network: Network,
	pub endpoint: Endpoint,
	pub key_material: KeyMaterial,
	pub birthday_height: u64,
	pub init_mode: InitMode,
}

/// Engine-internal synchronizer status.
#[derive(Debug, Clone, PartialEq)]
pub enum InternalSyncStatus {
	Unprepared,
	/// Scan in progress; `progress` is a fraction in `[0.0, 1.0]`.
	Syncing { progress: f64 },
	Synced,
	Stopped,
	Disconnected,
	Error(String),
}

/// Available/total amounts of one value pool, in zatoshi.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolBalance {
	pub available: u64,
	pub total: u64,
}

/// One state notification from the engine's state stream.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineState {
	pub status: InternalSyncStatus,
	pub latest_block_height: Option<u64>,
	pub transparent_balance: Option<PoolBalance>,
	pub sapling_balance: Option<PoolBalance>,
	pub orchard_balance: Option<PoolBalance>,
}

impl EngineState {
	pub fn with_status(status: InternalSyncStatus) -> Self {
		Self {
			status,
			latest_block_height: None,
			transparent_balance: None,
			sapling_balance: None,
			orchard_balance: None,
		}
	}
}

/// Confirmation state of a transaction as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionState {
	Pending,
	Confirmed,
	Expired,
}

/// Engine view of one wallet transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionOverview {
	/// Raw transaction id in internal (little-endian) byte order.
	pub raw_id: Vec<u8>,
	pub raw: Option<Vec<u8>>,
	pub mined_height: Option<u64>,
	pub block_time: Option<u64>,
	pub net_value: i64,
	pub fee: Option<u64>,
	pub state: TransactionState,
	pub is_sent: bool,
	pub is_shielding: bool,
	pub memo_count: usize,
}

/// Recipient of an outbound transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
	Address(String),
	InternalAccount(u32),
}

/// Addresses derived for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedAddresses {
	pub unified_address: String,
	pub sapling_address: String,
	pub transparent_address: String,
}

/// A transaction accepted by the engine for broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTransaction {
	pub raw_id: Vec<u8>,
	pub raw: Option<Vec<u8>>,
}

/// Notifications from the engine's event stream.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
	/// The engine's current full transaction list for the wallet.
	TransactionsUpdated(Vec<TransactionOverview>),
	CriticalError(String),
	ProcessorError(String),
	SetupError(String),
	SubmissionError(String),
	ChainReorg {
		detected_height: u64,
		rewind_height: u64,
	},
}

/// Failures reported by the external engine.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
	#[error("Invalid key material: {0}")]
	InvalidKeyMaterial(String),

	#[error("Storage error: {0}")]
	Storage(String),

	#[error("Network error: {0}")]
	Network(String),

	#[error("Operation failed: {0}")]
	Operation(String),
}
