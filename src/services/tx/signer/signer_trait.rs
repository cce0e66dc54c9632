use crate::errors::error::AppError;
use async_trait::async_trait;
use ethers_core::types::{Address, Signature, transaction::eip2718::TypedTransaction};

/// 持有私钥的一方。交易里的 chain_id 决定 EIP-155 的 v 值
#[async_trait]
pub trait TxSigner: Send + Sync {
    async fn sign_tx(&self, tx: &TypedTransaction) -> Result<Signature, AppError>;
    fn address(&self) -> Address;
    /// 对 keccak256(message) 签名，返回 65 字节 r‖s‖v
    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, AppError>;
}
