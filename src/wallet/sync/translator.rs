//! Translation of engine notifications into outbound records.
//!
//! `EventTranslator` is a pure stage: it takes the previously emitted values
//! and one raw notification and returns the updated cache together with the
//! records to emit. All change detection for status, progress and balances
//! happens here so it can be tested without an engine.

use crate::engine::{EngineEvent, EngineState, InternalSyncStatus, PoolBalance};
use crate::wallet::sync::events::{ErrorSeverity, OutboundRecord, PoolAmounts, SyncStatus};
use tracing::debug;

/// Last emitted (scan percentage, network height) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
	pub scan_progress: u8,
	pub network_block_height: u64,
}

/// Last emitted per-pool balances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalanceSnapshot {
	pub available: PoolAmounts,
	pub total: PoolAmounts,
}

impl BalanceSnapshot {
	/// Collect per-pool amounts from a state; an absent pool counts as zero.
	pub fn from_state(state: &EngineState) -> Self {
		let pool = |balance: Option<PoolBalance>| balance.unwrap_or_default();
		let transparent = pool(state.transparent_balance);
		let sapling = pool(state.sapling_balance);
		let orchard = pool(state.orchard_balance);

		Self {
			available: PoolAmounts {
				transparent: transparent.available,
				sapling: sapling.available,
				orchard: orchard.available,
			},
			total: PoolAmounts {
				transparent: transparent.total,
				sapling: sapling.total,
				orchard: orchard.total,
			},
		}
	}
}

/// Values already sent outward during the current lifecycle period.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslatorCache {
	pub emitted_status: Option<SyncStatus>,
	pub emitted_progress: Option<ProgressSnapshot>,
	pub emitted_balances: Option<BalanceSnapshot>,
	/// Set once SYNCED has been emitted; freezes the status until reset.
	pub fully_synced: bool,
	/// Set by a rescan; swallows the engine's post-rewind synced flicker.
	pub suppress_next_synced: bool,
}

impl TranslatorCache {
	/// Cache state right after a rescan request.
	pub fn after_rescan() -> Self {
		Self {
			suppress_next_synced: true,
			..Self::default()
		}
	}
}

/// Output of translating one state notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
	pub cache: TranslatorCache,
	pub records: Vec<OutboundRecord>,
}

/// Output of translating one engine error notification.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorTranslation {
	pub record: OutboundRecord,
	/// The lifecycle should be treated as degraded.
	pub critical: bool,
}

/// Per-wallet translator.
#[derive(Debug, Clone)]
pub struct EventTranslator {
	alias: String,
	/// Height reported when the engine does not know the network height yet.
	fallback_height: u64,
}

impl EventTranslator {
	pub fn new(alias: impl Into<String>, fallback_height: u64) -> Self {
		Self {
			alias: alias.into(),
			fallback_height,
		}
	}

	pub fn translate_state(&self, previous: &TranslatorCache, state: &EngineState) -> Translation {
		let mut cache = previous.clone();
		let mut records = Vec::new();

		match state.status {
			InternalSyncStatus::Synced if cache.suppress_next_synced => {
				debug!(
					"[{}] Ignoring synced notification emitted by rewind",
					self.alias
				);
				cache.suppress_next_synced = false;
				return Translation { cache, records };
			}
			InternalSyncStatus::Syncing { .. } => cache.suppress_next_synced = false,
			_ => {}
		}

		if !cache.fully_synced {
			if let Some(status) = collapse_status(&state.status) {
				if status == SyncStatus::Synced {
					cache.fully_synced = true;
				}
				if cache.emitted_status != Some(status) {
					cache.emitted_status = Some(status);
					records.push(OutboundRecord::StatusChanged {
						alias: self.alias.clone(),
						status,
					});
				}
			}
		}

		if let Some(scan_progress) = scan_percentage(&state.status) {
			let progress = ProgressSnapshot {
				scan_progress,
				network_block_height: state.latest_block_height.unwrap_or(self.fallback_height),
			};
			if cache.emitted_progress != Some(progress) {
				cache.emitted_progress = Some(progress);
				records.push(OutboundRecord::ProgressChanged {
					alias: self.alias.clone(),
					scan_progress: progress.scan_progress,
					network_block_height: progress.network_block_height,
				});
			}
		}

		let balances = BalanceSnapshot::from_state(state);
		if cache.emitted_balances != Some(balances) {
			cache.emitted_balances = Some(balances);
			records.push(OutboundRecord::BalanceChanged {
				alias: self.alias.clone(),
				available: balances.available,
				total: balances.total,
			});
		}

		Translation { cache, records }
	}

	/// Map an engine error callback to an `ErrorOccurred` record.
	///
	/// Returns `None` for events that are not errors.
	pub fn translate_error(&self, event: &EngineEvent) -> Option<ErrorTranslation> {
		let (severity, message) = match event {
			EngineEvent::TransactionsUpdated(_) => return None,
			EngineEvent::CriticalError(message) => (ErrorSeverity::Critical, message.clone()),
			EngineEvent::ProcessorError(message) => (ErrorSeverity::Processor, message.clone()),
			EngineEvent::SetupError(message) => (ErrorSeverity::Setup, message.clone()),
			EngineEvent::SubmissionError(message) => (ErrorSeverity::Submission, message.clone()),
			EngineEvent::ChainReorg {
				detected_height,
				rewind_height,
			} => (
				ErrorSeverity::ChainReorg,
				format!(
					"Chain reorg detected at height {}, rewinding to height {}",
					detected_height, rewind_height
				),
			),
		};

		Some(ErrorTranslation {
			record: OutboundRecord::ErrorOccurred {
				alias: self.alias.clone(),
				severity,
				message,
			},
			critical: severity == ErrorSeverity::Critical,
		})
	}
}

/// Collapse engine statuses to the externally visible set.
fn collapse_status(status: &InternalSyncStatus) -> Option<SyncStatus> {
	match status {
		InternalSyncStatus::Syncing { .. } => Some(SyncStatus::Syncing),
		InternalSyncStatus::Synced => Some(SyncStatus::Synced),
		InternalSyncStatus::Unprepared
		| InternalSyncStatus::Stopped
		| InternalSyncStatus::Disconnected => Some(SyncStatus::Stopped),
		InternalSyncStatus::Error(_) => None,
	}
}

/// Integer scan percentage in `[0, 100]`, or `None` if the status carries no progress.
fn scan_percentage(status: &InternalSyncStatus) -> Option<u8> {
	match status {
		InternalSyncStatus::Syncing { progress } => {
			// 0.57 * 100.0 is 56.99999999999999 in f64
			let percent = (progress * 100.0 + 1e-9).floor();
			if percent.is_nan() {
				Some(0)
			} else {
				Some(percent.clamp(0.0, 100.0) as u8)
			}
		}
		InternalSyncStatus::Synced => Some(100),
		InternalSyncStatus::Unprepared
		| InternalSyncStatus::Stopped
		| InternalSyncStatus::Disconnected => Some(0),
		InternalSyncStatus::Error(_) => None,
	}
}
