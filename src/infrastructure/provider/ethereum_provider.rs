use crate::config::EthereumConfig;
use crate::errors::error::AppError;
use crate::log_info;
use async_trait::async_trait;
use ethers_core::types::transaction::eip2718::TypedTransaction;
use ethers_core::types::{
    Address, Block, BlockId, BlockNumber, Bytes, Filter, H256, Log, Transaction, TransactionReceipt, U64,
    U256,
};
use ethers_providers::{Http, Middleware, Provider, ProviderError, RpcError};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

/// 链上只读查询 + 原始广播。
///
/// 每个方法对应一次 RPC 往返，不做缓存也不做重试；回执未找到返回 `Ok(None)`。
#[async_trait]
pub trait ProviderTrait: Send + Sync {
    /// pending nonce（包含已广播未打包的交易）
    async fn get_transaction_count(&self, address: Address) -> Result<U256, AppError>;
    async fn get_gas_price(&self) -> Result<U256, AppError>;
    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256, AppError>;
    async fn get_chain_id(&self) -> Result<U256, AppError>;
    /// 节点接受即返回哈希；拒绝时返回 `BroadcastRejected` 并保留节点原因
    async fn send_raw_transaction(&self, rlp: Bytes) -> Result<H256, AppError>;
    async fn get_transaction_receipt(
        &self,
        tx_hash: H256,
    ) -> Result<Option<TransactionReceipt>, AppError>;

    async fn get_last_block_number(&self) -> Result<U64, AppError>;
    async fn get_block_with_txs(&self, number: u64)
    -> Result<Option<Block<Transaction>>, AppError>;
    async fn get_block_by_hash(&self, hash: H256)
    -> Result<Option<Block<Transaction>>, AppError>;
    async fn get_transaction(&self, tx_hash: H256) -> Result<Option<Transaction>, AppError>;
    async fn get_balance(&self, address: Address) -> Result<U256, AppError>;
    async fn get_code(&self, address: Address) -> Result<Bytes, AppError>;
    async fn get_network_id(&self) -> Result<String, AppError>;
    /// block 为 None 时在最新区块上执行
    async fn call(&self, tx: &TypedTransaction, block: Option<BlockId>) -> Result<Bytes, AppError>;
    async fn get_logs(&self, query: &LogQuery) -> Result<Vec<Log>, AppError>;
}

/// 事件日志查询条件：topics[0] 为事件签名，其后依次为 indexed 参数
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    pub address: Option<Address>,
    pub event_topic: H256,
    pub indexed_topics: Vec<H256>,
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
}

impl LogQuery {
    pub fn to_filter(&self) -> Filter {
        let mut filter = Filter::new().topic0(self.event_topic);
        if let Some(address) = self.address {
            filter = filter.address(address);
        }
        // ethers 的 Filter 只有 topic1..topic3
        for (i, topic) in self.indexed_topics.iter().take(3).enumerate() {
            filter = match i {
                0 => filter.topic1(*topic),
                1 => filter.topic2(*topic),
                _ => filter.topic3(*topic),
            };
        }
        if let Some(from) = self.from_block {
            filter = filter.from_block(from);
        }
        if let Some(to) = self.to_block {
            filter = filter.to_block(to);
        }
        filter
    }
}

pub struct EthereumProvider {
    providers: Vec<Arc<Provider<Http>>>,
    index: AtomicUsize,
    request_timeout: Duration,
}

impl EthereumProvider {
    pub fn new(config: &EthereumConfig) -> Result<Self, AppError> {
        let keys: Vec<&str> = config
            .api_keys
            .split(',')
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect();

        let urls = if keys.is_empty() {
            vec![Url::parse(&config.rpc_url).map_err(|e| AppError::InvalidUrl(e.to_string()))?]
        } else {
            keys.iter()
                .map(|key| Self::url_with_key(&config.rpc_url, key))
                .collect::<Result<Vec<_>, _>>()?
        };

        let providers = urls
            .iter()
            .map(|url| {
                Provider::<Http>::try_from(url.as_str())
                    .map(Arc::new)
                    .map_err(|e| AppError::InvalidUrl(format!("{}: {}", url, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        log_info!("成功初始化 {} 个RPC Provider", providers.len());

        Ok(Self {
            providers,
            index: AtomicUsize::new(0),
            request_timeout: Duration::from_secs(config.request_timeout_secs.max(1)),
        })
    }

    fn url_with_key(rpc_url: &str, key: &str) -> Result<Url, AppError> {
        let raw = if rpc_url.ends_with('/') {
            format!("{}{}", rpc_url, key)
        } else {
            format!("{}/{}", rpc_url, key)
        };
        Url::parse(&raw).map_err(|e| AppError::InvalidUrl(format!("{}: {}", raw, e)))
    }

    /// 轮询选择 provider
    pub fn get_provider(&self) -> Arc<Provider<Http>> {
        let i = self.index.fetch_add(1, Ordering::Relaxed);
        self.providers[i % self.providers.len()].clone()
    }

    async fn timed<T, F>(&self, op: &str, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, ProviderError>> + Send,
    {
        match timeout(self.request_timeout, fut).await {
            Ok(res) => res.map_err(AppError::from),
            Err(_) => Err(AppError::ProviderError(format!(
                "{} 请求超时（{:?}）",
                op, self.request_timeout
            ))),
        }
    }
}

/// 节点返回 JSON-RPC 错误时只取 message（如 "nonce too low"），否则整体转字符串
fn rejection_reason(err: &ProviderError) -> String {
    match err.as_error_response() {
        Some(resp) => resp.message.clone(),
        None => err.to_string(),
    }
}

#[async_trait]
impl ProviderTrait for EthereumProvider {
    async fn get_transaction_count(&self, address: Address) -> Result<U256, AppError> {
        let provider = self.get_provider();
        self.timed(
            "eth_getTransactionCount",
            provider.get_transaction_count(address, Some(BlockNumber::Pending.into())),
        )
        .await
    }

    async fn get_gas_price(&self) -> Result<U256, AppError> {
        let provider = self.get_provider();
        self.timed("eth_gasPrice", provider.get_gas_price()).await
    }

    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256, AppError> {
        let provider = self.get_provider();
        self.timed("eth_estimateGas", provider.estimate_gas(tx, None))
            .await
    }

    async fn get_chain_id(&self) -> Result<U256, AppError> {
        let provider = self.get_provider();
        self.timed("eth_chainId", provider.get_chainid()).await
    }

    async fn send_raw_transaction(&self, rlp: Bytes) -> Result<H256, AppError> {
        // 持有 Arc 直到 await 结束，保证 Http client 存活
        let provider = self.get_provider();
        match timeout(self.request_timeout, provider.send_raw_transaction(rlp)).await {
            Ok(Ok(pending)) => Ok(pending.tx_hash()),
            Ok(Err(e)) => Err(AppError::BroadcastRejected(rejection_reason(&e))),
            Err(_) => Err(AppError::ProviderError(format!(
                "eth_sendRawTransaction 请求超时（{:?}）",
                self.request_timeout
            ))),
        }
    }

    async fn get_transaction_receipt(
        &self,
        tx_hash: H256,
    ) -> Result<Option<TransactionReceipt>, AppError> {
        let provider = self.get_provider();
        self.timed(
            "eth_getTransactionReceipt",
            provider.get_transaction_receipt(tx_hash),
        )
        .await
    }

    async fn get_last_block_number(&self) -> Result<U64, AppError> {
        let provider = self.get_provider();
        self.timed("eth_blockNumber", provider.get_block_number()).await
    }

    async fn get_block_with_txs(
        &self,
        number: u64,
    ) -> Result<Option<Block<Transaction>>, AppError> {
        let provider = self.get_provider();
        self.timed("eth_getBlockByNumber", provider.get_block_with_txs(number))
            .await
    }

    async fn get_block_by_hash(
        &self,
        hash: H256,
    ) -> Result<Option<Block<Transaction>>, AppError> {
        let provider = self.get_provider();
        self.timed("eth_getBlockByHash", provider.get_block_with_txs(hash))
            .await
    }

    async fn get_transaction(&self, tx_hash: H256) -> Result<Option<Transaction>, AppError> {
        let provider = self.get_provider();
        self.timed("eth_getTransactionByHash", provider.get_transaction(tx_hash))
            .await
    }

    async fn get_balance(&self, address: Address) -> Result<U256, AppError> {
        let provider = self.get_provider();
        self.timed("eth_getBalance", provider.get_balance(address, None))
            .await
    }

    async fn get_code(&self, address: Address) -> Result<Bytes, AppError> {
        let provider = self.get_provider();
        self.timed("eth_getCode", provider.get_code(address, None)).await
    }

    async fn get_network_id(&self) -> Result<String, AppError> {
        let provider = self.get_provider();
        self.timed("net_version", provider.get_net_version()).await
    }

    async fn call(&self, tx: &TypedTransaction, block: Option<BlockId>) -> Result<Bytes, AppError> {
        let provider = self.get_provider();
        self.timed("eth_call", provider.call(tx, block)).await
    }

    async fn get_logs(&self, query: &LogQuery) -> Result<Vec<Log>, AppError> {
        let provider = self.get_provider();
        let filter = query.to_filter();
        self.timed("eth_getLogs", provider.get_logs(&filter)).await
    }
}
