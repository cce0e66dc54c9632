// services/tx/types.rs

use crate::errors::error::{AppError, Result};
use ethers_core::types::transaction::eip2718::TypedTransaction;
use ethers_core::types::{Address, Bytes, H256, Signature, TransactionRequest, U256};

/// 调用方提交的交易意图。nonce / gas_limit 为 0、gas_price 为 None 或 0 表示“未指定”，
/// 由 TxBuilder 向链上查询补全。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxRequest {
    pub to: Option<Address>,
    pub nonce: u64,
    pub gas_limit: u64,
    pub gas_price: Option<U256>,
    pub value: Option<U256>,
    pub data: Bytes,
}

impl TxRequest {
    pub fn new(to: Address) -> Self {
        Self {
            to: Some(to),
            ..Default::default()
        }
    }

    /// 合约部署：无接收方
    pub fn deploy(bytecode: Bytes) -> Self {
        Self {
            data: bytecode,
            ..Default::default()
        }
    }

    pub fn value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    pub fn data(mut self, data: Bytes) -> Self {
        self.data = data;
        self
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn gas_price(mut self, gas_price: U256) -> Self {
        self.gas_price = Some(gas_price);
        self
    }
}

/// 全部字段已确定的未签名交易（legacy 格式）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub nonce: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub gas_limit: u64,
    pub gas_price: U256,
    pub data: Bytes,
}

impl UnsignedTransaction {
    /// 绑定链 ID 的 legacy 交易（EIP-155 签名原像）
    pub fn to_typed(&self, from: Address, chain_id: u64) -> TypedTransaction {
        let mut req = TransactionRequest::new()
            .from(from)
            .nonce(self.nonce)
            .gas(self.gas_limit)
            .gas_price(self.gas_price)
            .value(self.value)
            .data(self.data.clone())
            .chain_id(chain_id);
        if let Some(to) = self.to {
            req = req.to(to);
        }
        TypedTransaction::Legacy(req)
    }
}

/// 已签名交易，构造后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    tx: UnsignedTransaction,
    from: Address,
    chain_id: u64,
    signature: Signature,
    hash: H256,
    raw: Bytes,
}

impl SignedTransaction {
    pub fn new(tx: UnsignedTransaction, from: Address, chain_id: u64, signature: Signature) -> Self {
        let typed = tx.to_typed(from, chain_id);
        let raw = typed.rlp_signed(&signature);
        let hash = typed.hash(&signature);
        Self {
            tx,
            from,
            chain_id,
            signature,
            hash,
            raw,
        }
    }

    pub fn tx(&self) -> &UnsignedTransaction {
        &self.tx
    }

    pub fn from(&self) -> Address {
        self.from
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// 交易哈希 = keccak256(签名后的 RLP)
    pub fn hash(&self) -> H256 {
        self.hash
    }

    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// 由签名字段重新计算哈希，与 [`Self::hash`] 恒等
    pub fn compute_hash(&self) -> H256 {
        self.tx
            .to_typed(self.from, self.chain_id)
            .hash(&self.signature)
    }

    /// 按给定链 ID 重建签名原像并恢复签名者
    pub fn recover(&self, chain_id: u64) -> Result<Address> {
        let sighash = self.tx.to_typed(self.from, chain_id).sighash();
        self.signature
            .recover(sighash)
            .map_err(|e| AppError::Signing(format!("签名恢复失败: {}", e)))
    }

    /// 只有签名时使用的链 ID 才能验证通过：v 必须编码该链 ID，且恢复出的地址一致
    pub fn verify(&self, chain_id: u64, address: Address) -> bool {
        // EIP-155: v = chain_id * 2 + 35 + {0,1}
        if self.signature.v.checked_sub(35).map(|v| v / 2) != Some(chain_id) {
            return false;
        }
        matches!(self.recover(chain_id), Ok(recovered) if recovered == address)
    }
}
