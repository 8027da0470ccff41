//! Transaction change detection and summary building.
//!
//! The engine reports its full transaction list on every update. The detector
//! compares that list against a per-wallet memo of what was last observed and
//! keeps only first-seen or state-transitioning transactions, so an unchanged
//! transaction is never reported twice. Summaries are then built from the
//! survivors; recipient and memo lookups are best-effort.

use crate::engine::{Recipient, SyncEngine, TransactionOverview, TransactionState};
use crate::utils::txid_hex;
use crate::wallet::sync::events::TransactionSummary;
use std::collections::HashMap;
use std::fmt;

/// Observable state of a transaction at its last observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservedState {
	pub mined_height: Option<u64>,
	pub state: TransactionState,
}

impl ObservedState {
	fn of(tx: &TransactionOverview) -> Self {
		Self {
			mined_height: tx.mined_height,
			state: tx.state,
		}
	}
}

/// Raw id (display hex) to last observed state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionMemo {
	entries: HashMap<String, ObservedState>,
}

impl TransactionMemo {
	pub fn get(&self, raw_id_hex: &str) -> Option<&ObservedState> {
		self.entries.get(raw_id_hex)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// Result of one detection pass.
#[derive(Debug, Clone)]
pub struct Detection {
	pub memo: TransactionMemo,
	/// New or changed transactions worth reporting, in engine order.
	pub changed: Vec<TransactionOverview>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionChangeDetector;

impl TransactionChangeDetector {
	/// Compare `transactions` against `previous` and return the updated memo
	/// with the transactions to report.
	///
	/// Every observed transaction is recorded in the memo. Expired transactions
	/// that were never mined are recorded but never reported.
	pub fn detect(
		&self,
		previous: &TransactionMemo,
		transactions: &[TransactionOverview],
	) -> Detection {
		let mut memo = previous.clone();
		let mut changed = Vec::new();

		for tx in transactions {
			let observed = ObservedState::of(tx);
			let key = txid_hex(&tx.raw_id);
			if memo.entries.insert(key, observed) == Some(observed) {
				continue;
			}
			if is_expired_unmined(tx) {
				continue;
			}
			changed.push(tx.clone());
		}

		Detection { memo, changed }
	}
}

fn is_expired_unmined(tx: &TransactionOverview) -> bool {
	tx.state == TransactionState::Expired && tx.mined_height.is_none()
}

/// Summary field that may be left out when the engine cannot supply it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryField {
	ToAddress,
	Memos,
}

impl fmt::Display for SummaryField {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SummaryField::ToAddress => f.write_str("toAddress"),
			SummaryField::Memos => f.write_str("memos"),
		}
	}
}

/// A best-effort field that was omitted, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOmission {
	pub field: SummaryField,
	pub reason: String,
}

/// A summary plus the fields it had to omit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryOutcome {
	pub summary: TransactionSummary,
	pub omissions: Vec<FieldOmission>,
}

/// Build the application-facing summary of `tx`.
///
/// Never fails: recipient and memo lookups that fail are recorded as
/// omissions and the summary is returned without them.
pub async fn summarize(engine: &dyn SyncEngine, tx: &TransactionOverview) -> SummaryOutcome {
	let mut omissions = Vec::new();

	let to_address = if tx.is_sent {
		match engine.recipients(tx).await {
			Ok(recipients) => {
				let address = recipients.into_iter().find_map(|r| match r {
					Recipient::Address(address) => Some(address),
					Recipient::InternalAccount(_) => None,
				});
				if address.is_none() {
					omissions.push(FieldOmission {
						field: SummaryField::ToAddress,
						reason: "no external recipient address".to_string(),
					});
				}
				address
			}
			Err(e) => {
				omissions.push(FieldOmission {
					field: SummaryField::ToAddress,
					reason: e.to_string(),
				});
				None
			}
		}
	} else {
		None
	};

	let memos = if tx.memo_count > 0 {
		match engine.memos(tx).await {
			Ok(mut memos) => {
				memos.truncate(tx.memo_count);
				memos
			}
			Err(e) => {
				omissions.push(FieldOmission {
					field: SummaryField::Memos,
					reason: e.to_string(),
				});
				Vec::new()
			}
		}
	} else {
		Vec::new()
	};

	let summary = TransactionSummary {
		raw_id_hex: txid_hex(&tx.raw_id),
		mined_height: tx.mined_height,
		block_time_seconds: tx.block_time,
		net_value: tx.net_value.to_string(),
		fee: tx.fee.map(|fee| fee.to_string()),
		is_shielding: tx.is_shielding,
		is_expired: tx.state == TransactionState::Expired,
		to_address,
		memos,
		raw: tx.raw.as_deref().map(hex::encode),
	};

	SummaryOutcome { summary, omissions }
}
