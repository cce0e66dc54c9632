// 测试用的脚本化 Provider：固定返回值 + 调用计数，不访问网络
use crate::errors::error::AppError;
use crate::infrastructure::provider::{LogQuery, ProviderTrait};
use async_trait::async_trait;
use ethers_core::types::transaction::eip2718::TypedTransaction;
use ethers_core::types::{
    Address, Block, BlockId, Bytes, H256, Log, Transaction, TransactionReceipt, U64, U256,
};
use ethers_core::utils::keccak256;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

pub struct StubProvider {
    nonce: AtomicU64,
    incrementing_nonce: bool,
    pub gas_price: U256,
    pub gas_estimate: U256,
    pub chain_id: u64,
    pub balance: U256,
    pub code: Bytes,
    pub call_result: Bytes,
    /// 第 N 次查询回执时才返回（None 表示永远找不到）
    receipt_after: Option<usize>,
    broadcast_error: Option<String>,
    failing: Vec<&'static str>,

    pub nonce_calls: AtomicUsize,
    pub price_calls: AtomicUsize,
    pub estimate_calls: AtomicUsize,
    pub chain_id_calls: AtomicUsize,
    pub receipt_calls: AtomicUsize,
    pub broadcast_calls: AtomicUsize,
    pub last_estimate: Mutex<Option<TypedTransaction>>,
    pub last_call: Mutex<Option<TypedTransaction>>,
    pub last_call_block: Mutex<Option<BlockId>>,
    pub sent: Mutex<Vec<Bytes>>,
}

impl Default for StubProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl StubProvider {
    pub fn new() -> Self {
        Self {
            nonce: AtomicU64::new(0),
            incrementing_nonce: false,
            gas_price: U256::from(1_000_000_000u64),
            gas_estimate: U256::from(21_000u64),
            chain_id: 1,
            balance: U256::zero(),
            code: Bytes::default(),
            call_result: Bytes::default(),
            receipt_after: None,
            broadcast_error: None,
            failing: Vec::new(),
            nonce_calls: AtomicUsize::new(0),
            price_calls: AtomicUsize::new(0),
            estimate_calls: AtomicUsize::new(0),
            chain_id_calls: AtomicUsize::new(0),
            receipt_calls: AtomicUsize::new(0),
            broadcast_calls: AtomicUsize::new(0),
            last_estimate: Mutex::new(None),
            last_call: Mutex::new(None),
            last_call_block: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn with_nonce(self, nonce: u64) -> Self {
        self.nonce.store(nonce, Ordering::SeqCst);
        self
    }

    /// 每次查询 nonce 后自增，模拟账户持续发交易
    pub fn incrementing_nonce(mut self) -> Self {
        self.incrementing_nonce = true;
        self
    }

    pub fn with_gas_price(mut self, price: u64) -> Self {
        self.gas_price = U256::from(price);
        self
    }

    pub fn with_gas_estimate(mut self, gas: u64) -> Self {
        self.gas_estimate = U256::from(gas);
        self
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub fn with_balance(mut self, balance: U256) -> Self {
        self.balance = balance;
        self
    }

    pub fn with_code(mut self, code: &[u8]) -> Self {
        self.code = Bytes::from(code.to_vec());
        self
    }

    pub fn with_call_result(mut self, result: Vec<u8>) -> Self {
        self.call_result = Bytes::from(result);
        self
    }

    pub fn with_receipt_after(mut self, nth_call: usize) -> Self {
        self.receipt_after = Some(nth_call);
        self
    }

    pub fn rejecting(mut self, reason: &str) -> Self {
        self.broadcast_error = Some(reason.to_string());
        self
    }

    /// op: "nonce" | "gas_price" | "estimate" | "chain_id" | "receipt"
    pub fn failing(mut self, op: &'static str) -> Self {
        self.failing.push(op);
        self
    }

    fn check(&self, op: &'static str) -> Result<(), AppError> {
        if self.failing.contains(&op) {
            Err(AppError::ProviderError(format!("stub {} unavailable", op)))
        } else {
            Ok(())
        }
    }

    pub fn receipt_for(tx_hash: H256) -> TransactionReceipt {
        TransactionReceipt {
            transaction_hash: tx_hash,
            block_number: Some(U64::from(100)),
            gas_used: Some(U256::from(21_000u64)),
            status: Some(U64::from(1)),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ProviderTrait for StubProvider {
    async fn get_transaction_count(&self, _address: Address) -> Result<U256, AppError> {
        self.nonce_calls.fetch_add(1, Ordering::SeqCst);
        self.check("nonce")?;
        let n = if self.incrementing_nonce {
            self.nonce.fetch_add(1, Ordering::SeqCst)
        } else {
            self.nonce.load(Ordering::SeqCst)
        };
        Ok(U256::from(n))
    }

    async fn get_gas_price(&self) -> Result<U256, AppError> {
        self.price_calls.fetch_add(1, Ordering::SeqCst);
        self.check("gas_price")?;
        Ok(self.gas_price)
    }

    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256, AppError> {
        self.estimate_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_estimate.lock() {
            *last = Some(tx.clone());
        }
        self.check("estimate")?;
        Ok(self.gas_estimate)
    }

    async fn get_chain_id(&self) -> Result<U256, AppError> {
        self.chain_id_calls.fetch_add(1, Ordering::SeqCst);
        self.check("chain_id")?;
        Ok(U256::from(self.chain_id))
    }

    async fn send_raw_transaction(&self, rlp: Bytes) -> Result<H256, AppError> {
        self.broadcast_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.broadcast_error {
            return Err(AppError::BroadcastRejected(reason.clone()));
        }
        let hash = H256::from(keccak256(&rlp));
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(rlp);
        }
        Ok(hash)
    }

    async fn get_transaction_receipt(
        &self,
        tx_hash: H256,
    ) -> Result<Option<TransactionReceipt>, AppError> {
        let n = self.receipt_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.check("receipt")?;
        match self.receipt_after {
            Some(nth) if n >= nth => Ok(Some(Self::receipt_for(tx_hash))),
            _ => Ok(None),
        }
    }

    async fn get_last_block_number(&self) -> Result<U64, AppError> {
        Ok(U64::from(100))
    }

    async fn get_block_with_txs(
        &self,
        number: u64,
    ) -> Result<Option<Block<Transaction>>, AppError> {
        Ok(Some(Block {
            number: Some(U64::from(number)),
            ..Default::default()
        }))
    }

    async fn get_block_by_hash(
        &self,
        _hash: H256,
    ) -> Result<Option<Block<Transaction>>, AppError> {
        Ok(None)
    }

    async fn get_transaction(&self, _tx_hash: H256) -> Result<Option<Transaction>, AppError> {
        Ok(None)
    }

    async fn get_balance(&self, _address: Address) -> Result<U256, AppError> {
        Ok(self.balance)
    }

    async fn get_code(&self, _address: Address) -> Result<Bytes, AppError> {
        Ok(self.code.clone())
    }

    async fn get_network_id(&self) -> Result<String, AppError> {
        Ok(self.chain_id.to_string())
    }

    async fn call(&self, tx: &TypedTransaction, block: Option<BlockId>) -> Result<Bytes, AppError> {
        if let Ok(mut last) = self.last_call.lock() {
            *last = Some(tx.clone());
        }
        if let Ok(mut last) = self.last_call_block.lock() {
            *last = block;
        }
        Ok(self.call_result.clone())
    }

    async fn get_logs(&self, _query: &LogQuery) -> Result<Vec<Log>, AppError> {
        Ok(Vec::new())
    }
}
