// services/tx/raw.rs

use crate::errors::error::{AppError, Result};
use crate::utils::decode_hex_payload;
use ethers_core::types::transaction::eip2718::TypedTransaction;
use ethers_core::types::{Address, H256, Signature, Transaction};
use ethers_core::utils::keccak256;
use ethers_core::utils::rlp::Rlp;

/// 从签名后的原始交易中解出的内容
#[derive(Debug, Clone)]
pub struct RawTransaction {
    pub tx: TypedTransaction,
    pub signature: Signature,
    /// keccak256(raw)
    pub hash: H256,
    /// 由签名恢复出的发送方
    pub from: Address,
}

impl RawTransaction {
    pub fn chain_id(&self) -> Option<u64> {
        self.tx.chain_id().map(|id| id.as_u64())
    }
}

/// 解析原始交易十六进制（0x 可选），支持 legacy 与 typed envelope
pub fn decode_raw_tx_hex(raw: &str) -> Result<RawTransaction> {
    let bytes = decode_hex_payload(raw)?;
    if bytes.is_empty() {
        return Err(AppError::Decode("原始交易为空".to_string()));
    }

    let (tx, signature) = TypedTransaction::decode_signed(&Rlp::new(&bytes))
        .map_err(|e| AppError::Decode(format!("原始交易 RLP 解码失败: {}", e)))?;
    let from = signature
        .recover(tx.sighash())
        .map_err(|e| AppError::Signing(format!("原始交易签名恢复失败: {}", e)))?;

    Ok(RawTransaction {
        tx,
        signature,
        hash: H256::from(keccak256(&bytes)),
        from,
    })
}

/// 由交易的 v/r/s 恢复发送方，不信任节点返回的 from 字段
pub fn recover_sender(tx: &Transaction) -> Result<Address> {
    tx.recover_from()
        .map_err(|e| AppError::Signing(format!("交易 {:#x} 发送方恢复失败: {}", tx.hash, e)))
}
