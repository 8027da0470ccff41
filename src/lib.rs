//! Per-wallet synchronizer lifecycle and change-detection pipeline for a
//! Zcash light-client engine.
//!
//! The [`gateway::Gateway`] is the entry point. It owns a
//! [`wallet::WalletRegistry`] of handles keyed by alias and a
//! [`wallet::SyncController`] that starts, stops and rescans them. Engine
//! notifications are translated into deduplicated [`OutboundRecord`]s and
//! delivered through an [`EventDispatcher`].

pub mod config;
pub mod engine;
pub mod gateway;
pub mod telemetry;
pub mod utils;
pub mod wallet;

pub use config::BridgeConfig;
pub use gateway::{Gateway, Rejection};
pub use wallet::sync::events::{EventDispatcher, EventSink, Notification, OutboundRecord};
pub use wallet::{BridgeError, LifecycleState, WalletHandle};
