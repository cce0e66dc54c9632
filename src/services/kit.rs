// services/kit.rs
use crate::errors::error::{AppError, Result};
use crate::infrastructure::codec::ContractCodec;
use crate::infrastructure::provider::{LogQuery, ProviderTrait};
use crate::models::{ChainInfo, LogEntry, NetworkStatus, Receipt};
use crate::services::tx::raw::{RawTransaction, decode_raw_tx_hex, recover_sender};
use crate::services::tx::signer::verify_message;
use crate::services::tx::types::{SignedTransaction, TxRequest, UnsignedTransaction};
use crate::services::tx_service::TxService;
use crate::utils::{ETHER_DECIMALS, GWEI_DECIMALS, decode_hex_payload, format_with_unit, to_base_units, to_decimal};
use bigdecimal::BigDecimal;
use ethers_core::abi::Token;
use ethers_core::types::transaction::eip2718::TypedTransaction;
use ethers_core::types::{Address, Block, BlockId, Bytes, H256, Transaction, TransactionRequest, U256};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// eth_call 的可选参数：不指定时使用最新区块、Kit 自身地址、零 value
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub block: Option<BlockId>,
    pub from: Option<Address>,
    pub value: Option<U256>,
}

/// 钱包 + 链查询的组合入口。
///
/// 所有方法显式转发：链上只读查询走 `provider`，需要私钥的操作走 `tx_service`。
#[derive(Clone)]
pub struct Kit {
    tx_service: Arc<TxService>,
    provider: Arc<dyn ProviderTrait>,
}

impl Kit {
    pub fn new(tx_service: Arc<TxService>, provider: Arc<dyn ProviderTrait>) -> Self {
        Self {
            tx_service,
            provider,
        }
    }

    pub fn address(&self) -> Address {
        self.tx_service.address()
    }

    pub fn tx_service(&self) -> &Arc<TxService> {
        &self.tx_service
    }

    // ==================== 链上查询 ====================

    pub async fn chain_id(&self) -> Result<u64> {
        self.tx_service.chain_id().await
    }

    pub async fn block_number(&self) -> Result<u64> {
        Ok(self.provider.get_last_block_number().await?.as_u64())
    }

    pub async fn block_by_number(&self, number: u64) -> Result<Option<Block<Transaction>>> {
        self.provider.get_block_with_txs(number).await
    }

    /// 先取最新区块号，再按号取完整区块
    pub async fn latest_block(&self) -> Result<Option<Block<Transaction>>> {
        let number = self.block_number().await?;
        self.block_by_number(number).await
    }

    pub async fn block_by_hash(&self, hash: H256) -> Result<Option<Block<Transaction>>> {
        self.provider.get_block_by_hash(hash).await
    }

    pub async fn transaction_by_hash(&self, tx_hash: H256) -> Result<Option<Transaction>> {
        self.provider.get_transaction(tx_hash).await
    }

    /// 未打包时返回 None
    pub async fn transaction_receipt(&self, tx_hash: H256) -> Result<Option<Receipt>> {
        self.provider
            .get_transaction_receipt(tx_hash)
            .await?
            .map(Receipt::try_from)
            .transpose()
    }

    pub async fn balance(&self, address: Address) -> Result<U256> {
        self.provider.get_balance(address).await
    }

    pub async fn nonce(&self, address: Address) -> Result<U256> {
        self.provider.get_transaction_count(address).await
    }

    pub async fn gas_price(&self) -> Result<U256> {
        self.provider.get_gas_price().await
    }

    pub async fn code(&self, address: Address) -> Result<Bytes> {
        self.provider.get_code(address).await
    }

    pub async fn is_contract(&self, address: Address) -> Result<bool> {
        Ok(!self.code(address).await?.is_empty())
    }

    pub async fn logs(&self, query: &LogQuery) -> Result<Vec<LogEntry>> {
        let logs = self.provider.get_logs(query).await?;
        Ok(logs.iter().map(LogEntry::from).collect())
    }

    pub async fn chain_info(&self) -> Result<ChainInfo> {
        Ok(ChainInfo {
            chain_id: self.chain_id().await?,
            network_id: self.provider.get_network_id().await?,
        })
    }

    pub async fn network_status(&self) -> Result<NetworkStatus> {
        Ok(NetworkStatus {
            chain_id: self.chain_id().await?,
            block_number: self.block_number().await?,
            gas_price: self.gas_price().await?,
        })
    }

    pub async fn balance_in_ether(&self, address: Address) -> Result<BigDecimal> {
        to_decimal(self.balance(address).await?, ETHER_DECIMALS)
    }

    pub async fn balance_in_gwei(&self, address: Address) -> Result<BigDecimal> {
        to_decimal(self.balance(address).await?, GWEI_DECIMALS)
    }

    pub async fn gas_price_in_gwei(&self) -> Result<BigDecimal> {
        to_decimal(self.gas_price().await?, GWEI_DECIMALS)
    }

    /// 例如 "1.25 ETH"
    pub async fn formatted_balance(&self, address: Address) -> Result<String> {
        format_with_unit(self.balance(address).await?, ETHER_DECIMALS, "ETH")
    }

    pub async fn estimate_gas_for_transfer(&self, to: Address, value: U256) -> Result<u64> {
        let req = TransactionRequest::new().from(self.address()).to(to).value(value);
        let gas = self.provider.estimate_gas(&TypedTransaction::Legacy(req)).await?;
        if gas > U256::from(u64::MAX) {
            return Err(AppError::Conversion(format!("gas 估算值超出 u64: {}", gas)));
        }
        Ok(gas.as_u64())
    }

    // ==================== 交易流水线 ====================

    pub async fn build_tx(&self, req: &TxRequest) -> Result<UnsignedTransaction> {
        self.tx_service.build(req).await
    }

    pub async fn sign_tx(&self, tx: UnsignedTransaction) -> Result<SignedTransaction> {
        self.tx_service.sign(tx).await
    }

    pub async fn broadcast_tx(&self, signed: &SignedTransaction) -> Result<H256> {
        self.tx_service.broadcast(signed).await
    }

    pub async fn send_tx(&self, req: TxRequest) -> Result<H256> {
        self.tx_service.send(req).await
    }

    /// data 以十六进制字符串给出（0x 可选）
    pub async fn send_tx_with_hex_input(&self, to: Address, value: U256, hex_input: &str) -> Result<H256> {
        let data = decode_hex_payload(hex_input)?;
        self.send_tx(TxRequest::new(to).value(value).data(data)).await
    }

    pub async fn send_tx_and_wait(&self, req: TxRequest) -> Result<Receipt> {
        self.tx_service.send_and_wait(req, &CancellationToken::new()).await
    }

    /// amount 单位为 ETH
    pub async fn transfer_ether(&self, to: Address, amount: &BigDecimal) -> Result<H256> {
        let wei = to_base_units(amount, ETHER_DECIMALS)?;
        self.tx_service.transfer_eth(to, wei).await
    }

    pub async fn transfer_ether_and_wait(&self, to: Address, amount: &BigDecimal) -> Result<Receipt> {
        let wei = to_base_units(amount, ETHER_DECIMALS)?;
        self.send_tx_and_wait(TxRequest::new(to).value(wei)).await
    }

    pub async fn erc20_transfer(&self, token: Address, to: Address, amount: U256) -> Result<H256> {
        self.tx_service.erc20_transfer(token, to, amount).await
    }

    /// eth_call 只读调用，按 ABI 解码返回值
    pub async fn static_call(
        &self,
        codec: &ContractCodec,
        contract: Address,
        method: &str,
        args: &[Token],
        opts: &CallOptions,
    ) -> Result<Vec<Token>> {
        let data = codec.encode_call(method, args)?;
        let mut req = TransactionRequest::new()
            .from(opts.from.unwrap_or_else(|| self.address()))
            .to(contract)
            .data(data);
        if let Some(value) = opts.value {
            req = req.value(value);
        }
        let output = self
            .provider
            .call(&TypedTransaction::Legacy(req), opts.block)
            .await?;
        codec.decode_call_result(method, &output)
    }

    /// 发送合约写交易，value 为随附的 wei
    pub async fn invoke_contract(
        &self,
        codec: &ContractCodec,
        contract: Address,
        method: &str,
        args: &[Token],
        value: Option<U256>,
    ) -> Result<H256> {
        let data = codec.encode_call(method, args)?;
        let mut req = TxRequest::new(contract).data(data);
        req.value = value;
        self.send_tx(req).await
    }

    // ==================== 消息签名 ====================

    pub async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>> {
        self.tx_service.signer().sign_message(message).await
    }

    pub fn verify_message(&self, message: &[u8], signature: &[u8], address: Address) -> Result<bool> {
        verify_message(message, signature, address)
    }

    // ==================== 原始交易 ====================

    pub fn decode_raw_tx(&self, raw: &str) -> Result<RawTransaction> {
        decode_raw_tx_hex(raw)
    }

    /// 由签名恢复交易发送方
    pub fn sender_of(&self, tx: &Transaction) -> Result<Address> {
        recover_sender(tx)
    }

    // ==================== 等待回执 ====================

    pub async fn wait_for_receipt(&self, tx_hash: H256) -> Result<Receipt> {
        let cfg = self.tx_service.tx_config();
        self.wait_for_receipt_with_interval(tx_hash, cfg.poll_interval(), cfg.confirm_timeout())
            .await
    }

    pub async fn wait_for_receipt_with_interval(
        &self,
        tx_hash: H256,
        interval: Duration,
        timeout: Duration,
    ) -> Result<Receipt> {
        self.wait_for_receipt_cancellable(tx_hash, interval, timeout, &CancellationToken::new())
            .await
    }

    pub async fn wait_for_receipt_cancellable(
        &self,
        tx_hash: H256,
        interval: Duration,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Receipt> {
        self.tx_service
            .wait_for_receipt(tx_hash, interval, timeout, cancel)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TxConfig;
    use crate::infrastructure::provider::ChainIdentity;
    use crate::infrastructure::provider::mock::StubProvider;
    use crate::services::tx::signer::LocalSigner;
    use std::str::FromStr;

    fn make_kit(stub: StubProvider) -> (Kit, Arc<StubProvider>) {
        let stub = Arc::new(stub);
        let provider: Arc<dyn ProviderTrait> = stub.clone();
        let tx_service = Arc::new(TxService::new(
            Arc::new(LocalSigner::random()),
            provider.clone(),
            Arc::new(ChainIdentity::new()),
            TxConfig::default(),
        ));
        (Kit::new(tx_service, provider), stub)
    }

    fn wei(s: &str) -> U256 {
        U256::from_dec_str(s).unwrap()
    }

    #[tokio::test]
    async fn balance_views() {
        let (kit, _) = make_kit(StubProvider::new().with_balance(wei("1250000000000000000")));
        let who = Address::repeat_byte(3);
        assert_eq!(kit.balance_in_ether(who).await.unwrap(), BigDecimal::from_str("1.25").unwrap());
        assert_eq!(kit.formatted_balance(who).await.unwrap(), "1.25 ETH");
    }

    #[tokio::test]
    async fn balance_in_gwei_keeps_fraction() {
        let (kit, _) = make_kit(StubProvider::new().with_balance(wei("1000000500")));
        let gwei = kit.balance_in_gwei(Address::repeat_byte(3)).await.unwrap();
        assert_eq!(gwei, BigDecimal::from_str("1.0000005").unwrap());
    }

    #[tokio::test]
    async fn latest_block_uses_head_number() {
        let (kit, _) = make_kit(StubProvider::new());
        let block = kit.latest_block().await.unwrap().unwrap();
        assert_eq!(block.number.map(|n| n.as_u64()), Some(100));
    }

    #[tokio::test]
    async fn network_views() {
        let (kit, _) = make_kit(StubProvider::new().with_chain_id(10).with_gas_price(1_500_000_000));
        assert_eq!(kit.gas_price_in_gwei().await.unwrap(), BigDecimal::from_str("1.5").unwrap());
        let info = kit.chain_info().await.unwrap();
        assert_eq!((info.chain_id, info.network_id.as_str()), (10, "10"));
        let status = kit.network_status().await.unwrap();
        assert_eq!(status.block_number, 100);
    }

    #[tokio::test]
    async fn contract_detection() {
        let (kit, _) = make_kit(StubProvider::new().with_code(&[0x60, 0x80]));
        assert!(kit.is_contract(Address::zero()).await.unwrap());
        let (kit, _) = make_kit(StubProvider::new());
        assert!(!kit.is_contract(Address::zero()).await.unwrap());
    }

    #[tokio::test]
    async fn transfer_ether_converts_decimal_amount() {
        let (kit, stub) = make_kit(StubProvider::new());
        kit.transfer_ether(Address::repeat_byte(4), &BigDecimal::from_str("0.5").unwrap())
            .await
            .unwrap();
        let estimate_tx = stub.last_estimate.lock().unwrap().clone().unwrap();
        assert_eq!(estimate_tx.value(), Some(&wei("500000000000000000")));
    }

    #[tokio::test]
    async fn hex_input_is_decoded() {
        let (kit, stub) = make_kit(StubProvider::new());
        kit.send_tx_with_hex_input(Address::repeat_byte(4), U256::zero(), "0xdeadbeef")
            .await
            .unwrap();
        let estimate_tx = stub.last_estimate.lock().unwrap().clone().unwrap();
        assert_eq!(estimate_tx.data().map(|d| d.to_vec()), Some(vec![0xde, 0xad, 0xbe, 0xef]));
        assert!(kit
            .send_tx_with_hex_input(Address::zero(), U256::zero(), "0xzz")
            .await
            .is_err());
    }

    const BALANCE_OF_ABI: &str = r#"[{"type":"function","name":"balanceOf","stateMutability":"view",
        "inputs":[{"name":"owner","type":"address"}],
        "outputs":[{"name":"","type":"uint256"}]}]"#;

    fn word(n: u8) -> Vec<u8> {
        let mut word = vec![0u8; 32];
        word[31] = n;
        word
    }

    #[tokio::test]
    async fn static_call_round_trip() {
        let codec = ContractCodec::from_json(BALANCE_OF_ABI).unwrap();
        let (kit, stub) = make_kit(StubProvider::new().with_call_result(word(99)));

        let out = kit
            .static_call(
                &codec,
                Address::repeat_byte(5),
                "balanceOf",
                &[Token::Address(Address::zero())],
                &CallOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(out, vec![Token::Uint(U256::from(99u64))]);
        let call = stub.last_call.lock().unwrap().clone().unwrap();
        assert_eq!(call.to_addr(), Some(&Address::repeat_byte(5)));
        assert_eq!(call.from(), Some(&kit.address()));
        assert_eq!(call.value(), None);
        assert_eq!(*stub.last_call_block.lock().unwrap(), None);
    }

    #[tokio::test]
    async fn static_call_at_historic_block() {
        let codec = ContractCodec::from_json(BALANCE_OF_ABI).unwrap();
        let (kit, stub) = make_kit(StubProvider::new().with_call_result(word(1)));
        let opts = CallOptions {
            block: Some(BlockId::from(1_234u64)),
            from: Some(Address::repeat_byte(8)),
            value: Some(U256::from(5u64)),
        };

        kit.static_call(&codec, Address::repeat_byte(5), "balanceOf", &[Token::Address(Address::zero())], &opts)
            .await
            .unwrap();

        let call = stub.last_call.lock().unwrap().clone().unwrap();
        assert_eq!(call.from(), Some(&Address::repeat_byte(8)));
        assert_eq!(call.value(), Some(&U256::from(5u64)));
        assert_eq!(*stub.last_call_block.lock().unwrap(), Some(BlockId::from(1_234u64)));
    }

    #[tokio::test]
    async fn signed_raw_decodes_back_to_sender() {
        let (kit, _) = make_kit(StubProvider::new());
        let unsigned = kit
            .build_tx(&TxRequest::new(Address::repeat_byte(4)).value(U256::one()))
            .await
            .unwrap();
        let signed = kit.sign_tx(unsigned).await.unwrap();

        let decoded = kit.decode_raw_tx(&hex::encode(signed.raw())).unwrap();

        assert_eq!(decoded.from, kit.address());
        assert_eq!(decoded.hash, signed.hash());
        assert_eq!(decoded.chain_id(), Some(1));
    }

    #[tokio::test]
    async fn message_signing_through_kit() {
        let (kit, _) = make_kit(StubProvider::new());
        let sig = kit.sign_message(b"gm").await.unwrap();
        assert!(kit.verify_message(b"gm", &sig, kit.address()).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_with_short_timeout() {
        let (kit, _) = make_kit(StubProvider::new());
        let err = kit
            .wait_for_receipt_with_interval(H256::zero(), Duration::from_secs(1), Duration::from_secs(3))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ConfirmationTimeout { .. }));
    }

    #[tokio::test]
    async fn pending_receipt_is_none() {
        let (kit, _) = make_kit(StubProvider::new());
        assert_eq!(kit.transaction_receipt(H256::zero()).await.unwrap(), None);
    }
}
