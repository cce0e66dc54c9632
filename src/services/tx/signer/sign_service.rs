// services/tx/signer/sign_service.rs

use crate::errors::error::{AppError, Result};
use crate::infrastructure::provider::{ChainIdentity, ProviderTrait};
use crate::log_info;
use crate::services::tx::signer::TxSigner;
use crate::services::tx::types::{SignedTransaction, UnsignedTransaction};
use ethers_core::types::Address;
use std::sync::Arc;

/// 把未签名交易绑定到账户私钥和链 ID
pub struct SignService {
    provider: Arc<dyn ProviderTrait>,
    chain: Arc<ChainIdentity>,
    signer: Arc<dyn TxSigner>,
}

impl SignService {
    pub fn new(
        provider: Arc<dyn ProviderTrait>,
        chain: Arc<ChainIdentity>,
        signer: Arc<dyn TxSigner>,
    ) -> Self {
        Self {
            provider,
            chain,
            signer,
        }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn signer(&self) -> &Arc<dyn TxSigner> {
        &self.signer
    }

    /// 缓存优先，首次访问查询 eth_chainId
    pub async fn chain_id(&self) -> Result<u64> {
        self.chain.resolve(self.provider.as_ref()).await
    }

    pub async fn sign(&self, tx: UnsignedTransaction) -> Result<SignedTransaction> {
        let chain_id = self
            .chain_id()
            .await
            .map_err(|e| AppError::Signing(format!("无法确定 chain id: {}", e)))?;

        let from = self.signer.address();
        let typed = tx.to_typed(from, chain_id);
        let signature = self.signer.sign_tx(&typed).await?;
        let signed = SignedTransaction::new(tx, from, chain_id, signature);

        log_info!(
            "交易已签名: hash={:#x} nonce={} chain_id={}",
            signed.hash(),
            signed.tx().nonce,
            chain_id
        );
        Ok(signed)
    }
}
