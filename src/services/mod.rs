pub mod kit;
pub mod tx;
pub mod tx_service;

pub use kit::{CallOptions, Kit};
pub use tx_service::TxService;
