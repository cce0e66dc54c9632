// services/tx/broadcast/broadcast_service.rs

use crate::errors::error::Result;
use crate::infrastructure::provider::ProviderTrait;
use crate::services::tx::types::SignedTransaction;
use crate::{log_info, log_warn};
use ethers_core::types::H256;
use std::sync::Arc;

/// 提交已签名交易，节点接受即返回，不等待打包
pub struct BroadcastService {
    provider: Arc<dyn ProviderTrait>,
}

impl BroadcastService {
    pub fn new(provider: Arc<dyn ProviderTrait>) -> Self {
        Self { provider }
    }

    /// 拒绝原因（nonce too low / insufficient funds 等）原样透传
    pub async fn broadcast(&self, signed: &SignedTransaction) -> Result<H256> {
        let node_hash = self.provider.send_raw_transaction(signed.raw().clone()).await?;
        if node_hash != signed.hash() {
            log_warn!(
                "节点返回的哈希 {:#x} 与本地计算 {:#x} 不一致",
                node_hash,
                signed.hash()
            );
        }
        log_info!("交易已广播: {:#x}", signed.hash());
        Ok(signed.hash())
    }
}
