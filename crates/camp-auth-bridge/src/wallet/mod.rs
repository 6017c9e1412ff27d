/*
[INPUT]:  External wallet providers (local keys, wallet-connect style brokers)
[OUTPUT]: Connection state, change notifications and message signatures
[POS]:    Wallet layer - capability the auth bridge consumes
[UPDATE]: When adding wallet backends
*/

pub mod capability;
pub mod evm;
pub mod mock;

pub use capability::{WalletCapability, WalletState};
pub use evm::LocalEvmWallet;
pub use mock::MockWallet;
