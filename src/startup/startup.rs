use std::sync::Arc;

use crate::config::{Config, WalletConfig};
use crate::errors::error::Result;
use crate::infrastructure::provider::{ChainIdentity, EthereumProvider, ProviderTrait};
use crate::services::tx::signer::{LocalSigner, TxSigner};
use crate::services::{Kit, TxService};
use crate::{log_info, log_warn};

/// 应用程序组装：Provider → Signer → TxService → Kit
pub struct Application {
    pub kit: Kit,
}

impl Application {
    pub async fn build(config: Config) -> Result<Self> {
        // 1. 先初始化 Provider
        let provider = Arc::new(EthereumProvider::new(&config.ethereum)?) as Arc<dyn ProviderTrait>;

        // 2. 链 ID：配置里有就预置，否则首次签名时查询
        let chain = Arc::new(match config.ethereum.chain_id {
            Some(id) => ChainIdentity::with_known(id),
            None => ChainIdentity::new(),
        });

        // 3. 签名账户
        let signer = build_signer(&config.wallet)?;
        log_info!("钱包地址: {:?}", signer.address());

        let tx_service = Arc::new(TxService::new(signer, provider.clone(), chain, config.tx));
        Ok(Self {
            kit: Kit::new(tx_service, provider),
        })
    }

    /// 打印网络状态和钱包余额后退出；Ctrl+C 可提前结束
    pub async fn run(self) -> anyhow::Result<()> {
        tokio::select! {
            res = self.report() => res?,
            _ = tokio::signal::ctrl_c() => {
                log_info!("⚠️  Received shutdown signal, exiting...");
            }
        }
        Ok(())
    }

    async fn report(&self) -> Result<()> {
        let status = self.kit.network_status().await?;
        log_info!("网络状态: {}", status);

        let address = self.kit.address();
        let balance = self.kit.formatted_balance(address).await?;
        log_info!("账户 {:?} 余额: {}", address, balance);
        Ok(())
    }
}

/// 私钥优先，其次助记词，都没有时生成临时随机账户
fn build_signer(wallet: &WalletConfig) -> Result<Arc<dyn TxSigner>> {
    let signer = match (&wallet.private_key, &wallet.mnemonic) {
        (Some(key), _) if !key.trim().is_empty() => LocalSigner::from_hex(key)?,
        (_, Some(phrase)) if !phrase.trim().is_empty() => {
            LocalSigner::from_mnemonic(phrase, wallet.account_index)?
        }
        _ => {
            log_warn!("未配置私钥或助记词，使用临时随机账户");
            LocalSigner::random()
        }
    };
    Ok(Arc::new(signer))
}
