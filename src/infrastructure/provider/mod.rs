pub mod chain_identity;
pub mod ethereum_provider;
#[cfg(test)]
pub mod mock;

pub use chain_identity::ChainIdentity;
pub use ethereum_provider::{EthereumProvider, LogQuery, ProviderTrait};
