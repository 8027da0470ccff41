//! Wallet Synchronization Module
//!
//! This module turns the engine's raw notification streams into the outbound
//! records the application layer consumes, and drives each wallet's
//! synchronizer through its lifecycle:
//!
//! - `lifecycle`: Starts, stops and rescans wallet handles and owns their subscription tasks.
//! - `events`: Outbound record types, their JSON notifications, and the sink dispatcher.
//! - `translator`: Pure change detection for status, progress and balances.
//! - `transaction_detector`: Memo-based change detection for transactions and summary building.
//!
//! Records leave a subscription only while its generation is current, so a
//! stopped or rescanned wallet never emits stale state.

/// Outbound records and sink dispatch
pub mod events;
/// Lifecycle state machine for wallet handles
pub mod lifecycle;
/// Transaction change detection and summaries
pub mod transaction_detector;
/// Status, progress and balance translation
pub mod translator;

pub use lifecycle::SyncController;
