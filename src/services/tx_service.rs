// services/tx_service.rs
use crate::config::TxConfig;
use crate::errors::error::Result;
use crate::infrastructure::codec::selector;
use crate::infrastructure::provider::{ChainIdentity, ProviderTrait};
use crate::log_info;
use crate::models::{Receipt, Transfer};
use crate::services::tx::broadcast::BroadcastService;
use crate::services::tx::builder::TxBuilder;
use crate::services::tx::confirm::ConfirmationPoller;
use crate::services::tx::gas::GasService;
use crate::services::tx::nonce::NonceService;
use crate::services::tx::signer::{SignService, TxSigner};
use crate::services::tx::types::{SignedTransaction, TxRequest, UnsignedTransaction};
use ethers_core::abi::{Token, encode};
use ethers_core::types::{Address, Bytes, H256, U256};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// 交易流水线：构建 → 签名 → 广播 → 等待回执。
///
/// 任一步失败立即返回，不重试；失败的构建不会进入签名，失败的签名不会广播。
pub struct TxService {
    builder: Arc<TxBuilder>,
    sign_svc: Arc<SignService>,
    broadcast_svc: Arc<BroadcastService>,
    provider: Arc<dyn ProviderTrait>,
    tx_config: TxConfig,
}

impl TxService {
    pub fn new(
        signer: Arc<dyn TxSigner>,
        provider: Arc<dyn ProviderTrait>,
        chain: Arc<ChainIdentity>,
        tx_config: TxConfig,
    ) -> Self {
        let nonce_svc = Arc::new(NonceService::new(provider.clone()));
        let gas_svc = Arc::new(GasService::new(provider.clone()));
        Self {
            builder: Arc::new(TxBuilder::new(nonce_svc, gas_svc)),
            sign_svc: Arc::new(SignService::new(provider.clone(), chain, signer)),
            broadcast_svc: Arc::new(BroadcastService::new(provider.clone())),
            provider,
            tx_config,
        }
    }

    pub fn address(&self) -> Address {
        self.sign_svc.address()
    }

    pub fn signer(&self) -> &Arc<dyn TxSigner> {
        self.sign_svc.signer()
    }

    pub fn tx_config(&self) -> &TxConfig {
        &self.tx_config
    }

    pub async fn chain_id(&self) -> Result<u64> {
        self.sign_svc.chain_id().await
    }

    pub async fn build(&self, req: &TxRequest) -> Result<UnsignedTransaction> {
        self.builder.build(self.address(), req).await
    }

    pub async fn sign(&self, tx: UnsignedTransaction) -> Result<SignedTransaction> {
        self.sign_svc.sign(tx).await
    }

    pub async fn broadcast(&self, signed: &SignedTransaction) -> Result<H256> {
        self.broadcast_svc.broadcast(signed).await
    }

    /// 构建 + 签名 + 广播，返回交易哈希
    pub async fn send(&self, req: TxRequest) -> Result<H256> {
        let unsigned = self.build(&req).await?;
        let signed = self.sign(unsigned).await?;
        self.broadcast(&signed).await
    }

    pub fn poller(&self, tx_hash: H256, interval: Duration, timeout: Duration) -> ConfirmationPoller {
        ConfirmationPoller::new(self.provider.clone(), tx_hash, interval, timeout)
    }

    pub async fn wait_for_receipt(
        &self,
        tx_hash: H256,
        interval: Duration,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Receipt> {
        let receipt = self.poller(tx_hash, interval, timeout).wait(cancel).await?;
        for t in Transfer::from_receipt(&receipt) {
            log_info!(
                "代币转账: 代币 {:?} 从 {:?} 到 {:?}, 金额: {}",
                t.token,
                t.from,
                t.to,
                t.amount
            );
        }
        Ok(receipt)
    }

    /// 发送并按配置的间隔/超时等待回执
    pub async fn send_and_wait(&self, req: TxRequest, cancel: &CancellationToken) -> Result<Receipt> {
        let tx_hash = self.send(req).await?;
        self.wait_for_receipt(
            tx_hash,
            self.tx_config.poll_interval(),
            self.tx_config.confirm_timeout(),
            cancel,
        )
        .await
    }

    /// 原生币转账，amount 为 wei
    pub async fn transfer_eth(&self, to: Address, amount: U256) -> Result<H256> {
        log_info!("发起 ETH 转账: 目标 {:?}, 金额 {} wei", to, amount);
        self.send(TxRequest::new(to).value(amount)).await
    }

    /// ERC20 transfer(address,uint256)，amount 为代币最小单位
    pub async fn erc20_transfer(&self, token: Address, to: Address, amount: U256) -> Result<H256> {
        log_info!("发起 ERC20 转账: 代币 {:?}, 目标 {:?}, 金额 {}", token, to, amount);
        self.send(TxRequest::new(token).data(erc20_transfer_data(to, amount))).await
    }
}

/// selector(0xa9059cbb) + address + uint256，共 68 字节
pub fn erc20_transfer_data(to: Address, amount: U256) -> Bytes {
    let mut data = Vec::with_capacity(68);
    data.extend_from_slice(&selector("transfer(address,uint256)"));
    data.extend_from_slice(&encode(&[Token::Address(to), Token::Uint(amount)]));
    data.into()
}
