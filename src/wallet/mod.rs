/// Per-wallet handle owning one synchronizer instance
pub mod handle;
/// Alias to handle table
pub mod registry;
pub mod sync;
pub mod types;

pub use handle::WalletHandle;
pub use registry::WalletRegistry;
pub use sync::SyncController;
pub use types::*;
