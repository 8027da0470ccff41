use crate::engine::Endpoint;
use serde::Deserialize;
use std::time::Duration;

/// Bridge-wide settings supplied by the host application.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
	/// Lightwalletd host used when an initialize request omits one
	pub default_host: String,
	/// Lightwalletd port used when an initialize request omits one
	pub default_port: u16,
	/// Whether endpoints are reached over TLS
	pub secure_endpoint: bool,
	/// Upper bound for every engine call, in seconds
	pub engine_timeout_secs: u64,
	/// Account whose addresses are derived
	pub account_index: u32,
}

impl Default for BridgeConfig {
	fn default() -> Self {
		Self {
			default_host: "mainnet.lightwalletd.com".to_string(),
			default_port: 9067,
			secure_endpoint: true,
			engine_timeout_secs: 120,
			account_index: 0,
		}
	}
}

impl BridgeConfig {
	/// Parse host-supplied JSON. Missing fields keep their defaults.
	pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(json)
	}

	pub fn engine_timeout(&self) -> Duration {
		Duration::from_secs(self.engine_timeout_secs)
	}

	/// Endpoint for `host`/`port`, falling back to the configured defaults.
	pub fn endpoint(&self, host: Option<String>, port: Option<u16>) -> Endpoint {
		Endpoint::new(
			host.filter(|h| !h.is_empty())
				.unwrap_or_else(|| self.default_host.clone()),
			port.unwrap_or(self.default_port),
			self.secure_endpoint,
		)
	}
}
