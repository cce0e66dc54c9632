// services/tx/signer/local_signer.rs

use crate::errors::error::AppError;
use crate::services::tx::signer::TxSigner;
use ethers_core::types::transaction::eip2718::TypedTransaction;
use ethers_core::types::{Address, H256, Signature};
use ethers_core::utils::keccak256;
use ethers_signers::coins_bip39::English;
use ethers_signers::{LocalWallet, MnemonicBuilder, Signer};
use std::sync::Arc;

#[derive(Clone)]
pub struct LocalSigner {
    wallet: Arc<LocalWallet>,
}

impl LocalSigner {
    pub fn new(wallet: LocalWallet) -> Self {
        Self {
            wallet: Arc::new(wallet),
        }
    }

    /// 随机生成私钥
    pub fn random() -> Self {
        Self::new(LocalWallet::new(&mut rand::thread_rng()))
    }

    /// 十六进制私钥，0x 前缀可选
    pub fn from_hex(key: &str) -> Result<Self, AppError> {
        let body = key.trim();
        let body = body.strip_prefix("0x").unwrap_or(body);
        let bytes = hex::decode(body).map_err(|e| AppError::InvalidKey(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(AppError::InvalidKey(format!("私钥应为 32 字节，实际 {} 字节", bytes.len())));
        }
        let wallet =
            LocalWallet::from_bytes(&bytes).map_err(|e| AppError::InvalidKey(e.to_string()))?;
        Ok(Self::new(wallet))
    }

    /// BIP-39 助记词，派生路径 m/44'/60'/0'/0/{index}
    pub fn from_mnemonic(phrase: &str, index: u32) -> Result<Self, AppError> {
        let wallet = MnemonicBuilder::<English>::default()
            .phrase(phrase.trim())
            .index(index)
            .map_err(|e| AppError::InvalidKey(e.to_string()))?
            .build()
            .map_err(|e| AppError::InvalidKey(e.to_string()))?;
        Ok(Self::new(wallet))
    }

    /// 导出私钥（不带 0x）
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.wallet.signer().to_bytes())
    }

    /// 未压缩公钥 X‖Y 的十六进制，不含 0x 和 04 前缀
    pub fn public_key_hex(&self) -> String {
        let point = self.wallet.signer().verifying_key().to_encoded_point(false);
        hex::encode(&point.as_bytes()[1..])
    }
}

#[async_trait::async_trait]
impl TxSigner for LocalSigner {
    async fn sign_tx(&self, tx: &TypedTransaction) -> Result<Signature, AppError> {
        self.wallet
            .sign_transaction(tx)
            .await
            .map_err(|e| AppError::Signing(format!("交易签名失败: {}", e)))
    }

    fn address(&self) -> Address {
        self.wallet.address()
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, AppError> {
        let digest = H256::from(keccak256(message));
        let signature = self
            .wallet
            .sign_hash(digest)
            .map_err(|e| AppError::Signing(format!("消息签名失败: {}", e)))?;
        Ok(signature.to_vec())
    }
}

/// 校验 65 字节消息签名：恢复出的地址与 address 相同即通过
pub fn verify_message(message: &[u8], signature: &[u8], address: Address) -> Result<bool, AppError> {
    let signature = Signature::try_from(signature)
        .map_err(|e| AppError::Signing(format!("签名格式错误: {}", e)))?;
    let digest = H256::from(keccak256(message));
    Ok(matches!(signature.recover(digest), Ok(recovered) if recovered == address))
}
