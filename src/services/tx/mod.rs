pub mod broadcast;
pub mod builder;
pub mod confirm;
pub mod gas;
pub mod nonce;
pub mod raw;
pub mod signer;
pub mod types;

pub use raw::{RawTransaction, decode_raw_tx_hex, recover_sender};
pub use types::{SignedTransaction, TxRequest, UnsignedTransaction};
