pub mod local_signer;
pub mod sign_service;
pub mod signer_trait;

pub use local_signer::{LocalSigner, verify_message};
pub use sign_service::SignService;
pub use signer_trait::TxSigner;
