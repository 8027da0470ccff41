//!
//! Utility module for the bridge.
//!
//! Amount parsing and transaction id formatting shared by the gateway and the
//! sync pipeline.
/// Helpers for amounts and identifiers crossing the boundary
pub mod format;

pub use format::{parse_zatoshi, txid_hex};
