pub mod config;
pub mod errors;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

pub use errors::{AppError, Result};
pub use infrastructure::codec::ContractCodec;
pub use infrastructure::provider::{ChainIdentity, EthereumProvider, ProviderTrait};
pub use services::{CallOptions, Kit};
pub use services::tx::{SignedTransaction, TxRequest, UnsignedTransaction};
