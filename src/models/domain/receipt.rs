use crate::errors::error::AppError;
use ethers_core::types::{Address, Bytes, H256, Log, TransactionReceipt, U256};

/// 交易执行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Success,
    Failure,
    /// 拜占庭分叉前的回执没有 status 字段
    Unknown,
}

/// 日志条目：发出地址 + topics + 原始 data，只读不产生
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<H256>,
    pub data: Bytes,
}

impl From<&Log> for LogEntry {
    fn from(log: &Log) -> Self {
        Self {
            address: log.address,
            topics: log.topics.clone(),
            data: log.data.clone(),
        }
    }
}

/// 已打包交易的回执。只有交易进入区块后才存在，本地从不构造“pending 回执”
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: H256,
    pub status: TxStatus,
    pub gas_used: u64,
    pub block_number: u64,
    pub logs: Vec<LogEntry>,
}

impl Receipt {
    pub fn is_success(&self) -> bool {
        self.status == TxStatus::Success
    }
}

impl TryFrom<TransactionReceipt> for Receipt {
    type Error = AppError;

    fn try_from(r: TransactionReceipt) -> Result<Self, Self::Error> {
        let block_number = r
            .block_number
            .ok_or_else(|| {
                AppError::Conversion(format!("回执 {:#x} 缺少区块号", r.transaction_hash))
            })?
            .as_u64();

        let gas_used = r.gas_used.unwrap_or_default();
        if gas_used > U256::from(u64::MAX) {
            return Err(AppError::Conversion(format!("gas_used({}) 超出 u64 范围", gas_used)));
        }

        let status = match r.status.map(|s| s.as_u64()) {
            Some(1) => TxStatus::Success,
            Some(_) => TxStatus::Failure,
            None => TxStatus::Unknown,
        };

        Ok(Self {
            tx_hash: r.transaction_hash,
            status,
            gas_used: gas_used.as_u64(),
            block_number,
            logs: r.logs.iter().map(LogEntry::from).collect(),
        })
    }
}
