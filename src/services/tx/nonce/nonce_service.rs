// services/tx/nonce/nonce_service.rs

use crate::errors::error::{AppError, Result};
use crate::infrastructure::provider::ProviderTrait;
use ethers_core::types::{Address, U256};
use std::sync::Arc;

/// 候选 nonce：每次都向链上查询 pending 计数，本地不缓存。
///
/// 同一账户并发发送时两次查询可能得到相同值，其中一笔会在广播时被节点拒绝；
/// 需要并发发送的调用方自行串行分配 nonce。
pub struct NonceService {
    provider: Arc<dyn ProviderTrait>,
}

impl NonceService {
    pub fn new(provider: Arc<dyn ProviderTrait>) -> Self {
        Self { provider }
    }

    /// 下一个可用 nonce（包含已广播未打包的交易）
    pub async fn pending_nonce(&self, address: Address) -> Result<u64> {
        let nonce = self.provider.get_transaction_count(address).await?;
        if nonce > U256::from(u64::MAX) {
            return Err(AppError::Conversion(format!("nonce 超出 u64: {}", nonce)));
        }
        Ok(nonce.as_u64())
    }
}
