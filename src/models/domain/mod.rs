pub mod network;
pub mod receipt;
pub mod transfer;

pub use network::{ChainInfo, NetworkStatus};
pub use receipt::{LogEntry, Receipt, TxStatus};
pub use transfer::{Transfer, TransferEvent};
