//! Outbound records and their delivery.
//!
//! The translator and the transaction change detector produce
//! `OutboundRecord`s; the lifecycle controller hands each one to an
//! `EventDispatcher`, which forwards it to every registered `EventSink`.
//! Sinks are synchronous and non-blocking so a record can be delivered while
//! the handle's cache lock is held. That is what keeps a cancelled
//! subscription from emitting anything once `stop` or `rescan` has begun.

use serde::Serialize;
use serde_json::json;
use std::fmt;
use tokio::sync::mpsc;

/// Externally visible synchronizer status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SyncStatus {
	Stopped,
	Syncing,
	Synced,
}

impl fmt::Display for SyncStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			SyncStatus::Stopped => "STOPPED",
			SyncStatus::Syncing => "SYNCING",
			SyncStatus::Synced => "SYNCED",
		};
		f.write_str(name)
	}
}

/// Per-pool amounts in zatoshi.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolAmounts {
	pub transparent: u64,
	pub sapling: u64,
	pub orchard: u64,
}

/// Severity of an engine error notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorSeverity {
	Critical,
	Processor,
	Setup,
	Submission,
	ChainReorg,
}

impl ErrorSeverity {
	pub fn as_str(&self) -> &'static str {
		match self {
			ErrorSeverity::Critical => "critical",
			ErrorSeverity::Processor => "processor",
			ErrorSeverity::Setup => "setup",
			ErrorSeverity::Submission => "submission",
			ErrorSeverity::ChainReorg => "chainReorg",
		}
	}
}

/// Application-facing view of one transaction.
///
/// Amounts are decimal strings of zatoshi.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
	#[serde(rename = "rawTransactionId")]
	pub raw_id_hex: String,
	pub mined_height: Option<u64>,
	#[serde(rename = "blockTimeInSeconds")]
	pub block_time_seconds: Option<u64>,
	#[serde(rename = "value")]
	pub net_value: String,
	pub fee: Option<String>,
	pub is_shielding: bool,
	pub is_expired: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub to_address: Option<String>,
	pub memos: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub raw: Option<String>,
}

/// A notification bound for the application layer.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundRecord {
	StatusChanged {
		alias: String,
		status: SyncStatus,
	},
	ProgressChanged {
		alias: String,
		scan_progress: u8,
		network_block_height: u64,
	},
	BalanceChanged {
		alias: String,
		available: PoolAmounts,
		total: PoolAmounts,
	},
	TransactionsChanged {
		alias: String,
		transactions: Vec<TransactionSummary>,
	},
	ErrorOccurred {
		alias: String,
		severity: ErrorSeverity,
		message: String,
	},
}

/// Named event with a JSON body, as pushed to the application layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
	pub name: &'static str,
	pub body: serde_json::Value,
}

impl OutboundRecord {
	pub fn alias(&self) -> &str {
		match self {
			OutboundRecord::StatusChanged { alias, .. }
			| OutboundRecord::ProgressChanged { alias, .. }
			| OutboundRecord::BalanceChanged { alias, .. }
			| OutboundRecord::TransactionsChanged { alias, .. }
			| OutboundRecord::ErrorOccurred { alias, .. } => alias,
		}
	}

	/// Event name used on the outbound stream for this record's category.
	pub fn event_name(&self) -> &'static str {
		match self {
			OutboundRecord::StatusChanged { .. } => "StatusEvent",
			OutboundRecord::ProgressChanged { .. } => "UpdateEvent",
			OutboundRecord::BalanceChanged { .. } => "BalanceEvent",
			OutboundRecord::TransactionsChanged { .. } => "TransactionEvent",
			OutboundRecord::ErrorOccurred { .. } => "ErrorEvent",
		}
	}

	pub fn to_notification(&self) -> Notification {
		let body = match self {
			OutboundRecord::StatusChanged { alias, status } => json!({
				"alias": alias,
				"name": status.to_string(),
			}),
			OutboundRecord::ProgressChanged {
				alias,
				scan_progress,
				network_block_height,
			} => json!({
				"alias": alias,
				"scanProgress": scan_progress,
				"networkBlockHeight": network_block_height,
			}),
			OutboundRecord::BalanceChanged {
				alias,
				available,
				total,
			} => json!({
				"alias": alias,
				"transparentAvailableZatoshi": available.transparent.to_string(),
				"transparentTotalZatoshi": total.transparent.to_string(),
				"saplingAvailableZatoshi": available.sapling.to_string(),
				"saplingTotalZatoshi": total.sapling.to_string(),
				"orchardAvailableZatoshi": available.orchard.to_string(),
				"orchardTotalZatoshi": total.orchard.to_string(),
			}),
			OutboundRecord::TransactionsChanged {
				alias,
				transactions,
			} => json!({
				"alias": alias,
				"transactions": transactions,
			}),
			OutboundRecord::ErrorOccurred {
				alias,
				severity,
				message,
			} => json!({
				"alias": alias,
				"level": severity.as_str(),
				"message": message,
			}),
		};

		Notification {
			name: self.event_name(),
			body,
		}
	}
}

/// Error returned by a sink that can no longer accept records.
#[derive(Debug, thiserror::Error)]
#[error("event sink {0} is closed")]
pub struct SinkClosed(pub &'static str);

/// Receiver of outbound records.
///
/// `deliver` runs while the wallet's cache lock is held and must not block.
pub trait EventSink: Send + Sync {
	fn deliver(&self, record: &OutboundRecord) -> Result<(), SinkClosed>;

	/// Get the name of this sink for logging and diagnostics.
	fn name(&self) -> &'static str;
}

/// Fans each record out to all registered sinks.
///
/// Errors from one sink are logged and do not stop the others.
#[derive(Default)]
pub struct EventDispatcher {
	sinks: Vec<Box<dyn EventSink>>,
}

impl EventDispatcher {
	pub fn new() -> Self {
		Self { sinks: Vec::new() }
	}

	/// Sinks are called in the order they are registered.
	pub fn register_sink(&mut self, sink: Box<dyn EventSink>) {
		self.sinks.push(sink);
	}

	pub fn dispatch(&self, record: &OutboundRecord) {
		for sink in &self.sinks {
			if let Err(e) = sink.deliver(record) {
				tracing::error!(
					"Sink {} failed to deliver {}: {}",
					sink.name(),
					record.event_name(),
					e
				);
			}
		}
	}
}

/// Sink forwarding records into an unbounded tokio channel.
pub struct ChannelSink {
	tx: mpsc::UnboundedSender<OutboundRecord>,
}

impl ChannelSink {
	pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundRecord>) {
		let (tx, rx) = mpsc::unbounded_channel();
		(Self { tx }, rx)
	}
}

impl EventSink for ChannelSink {
	fn deliver(&self, record: &OutboundRecord) -> Result<(), SinkClosed> {
		self.tx
			.send(record.clone())
			.map_err(|_| SinkClosed(self.name()))
	}

	fn name(&self) -> &'static str {
		"ChannelSink"
	}
}
