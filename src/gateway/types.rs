use crate::engine::{KeyMaterial, Network};
use crate::wallet::BridgeError;
use crate::wallet::sync::translator::BalanceSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameters for creating (or reusing) and starting a wallet.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeRequest {
	pub key_material: KeyMaterial,
	pub birthday_height: u64,
	pub alias: String,
	pub network: Network,
	#[serde(default)]
	pub host: Option<String>,
	#[serde(default)]
	pub port: Option<u16>,
	#[serde(default)]
	pub new_wallet: bool,
}

/// A transfer to one address. `zatoshi` is a decimal string.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
	pub alias: String,
	pub zatoshi: String,
	pub to_address: String,
	#[serde(default)]
	pub memo: String,
	pub key_material: KeyMaterial,
}

/// Shield transparent funds above `threshold` zatoshi (decimal string).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShieldRequest {
	pub alias: String,
	pub key_material: KeyMaterial,
	#[serde(default)]
	pub memo: String,
	pub threshold: String,
}

/// Identifier (display hex) and optional raw bytes (hex) of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
	pub tx_id: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub raw: Option<String>,
}

/// Per-pool balances as decimal zatoshi strings, keyed like `BalanceEvent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResult {
	pub transparent_available_zatoshi: String,
	pub transparent_total_zatoshi: String,
	pub sapling_available_zatoshi: String,
	pub sapling_total_zatoshi: String,
	pub orchard_available_zatoshi: String,
	pub orchard_total_zatoshi: String,
}

impl From<BalanceSnapshot> for BalanceResult {
	fn from(snapshot: BalanceSnapshot) -> Self {
		Self {
			transparent_available_zatoshi: snapshot.available.transparent.to_string(),
			transparent_total_zatoshi: snapshot.total.transparent.to_string(),
			sapling_available_zatoshi: snapshot.available.sapling.to_string(),
			sapling_total_zatoshi: snapshot.total.sapling.to_string(),
			orchard_available_zatoshi: snapshot.available.orchard.to_string(),
			orchard_total_zatoshi: snapshot.total.orchard.to_string(),
		}
	}
}

/// Structured failure handed to the application layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
	pub code: &'static str,
	pub message: String,
}

impl From<&BridgeError> for Rejection {
	fn from(error: &BridgeError) -> Self {
		Self {
			code: error.kind(),
			message: error.to_string(),
		}
	}
}

impl From<BridgeError> for Rejection {
	fn from(error: BridgeError) -> Self {
		Self::from(&error)
	}
}

impl fmt::Display for Rejection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {}", self.code, self.message)
	}
}

impl std::error::Error for Rejection {}
