use crate::models::domain::receipt::{LogEntry, Receipt};
use ethers_contract::EthEvent;
use ethers_core::abi::RawLog;
use ethers_core::types::{Address, U256};

#[derive(EthEvent, Debug, Clone)]
#[ethevent(name = "Transfer", abi = "Transfer(address,address,uint256)")]
pub struct TransferEvent {
    #[ethevent(indexed)]
    pub from: Address,
    #[ethevent(indexed)]
    pub to: Address,
    pub value: U256,
}

/// 从回执日志中识别出的 ERC-20 转账
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub token: Address,
    pub from: Address,
    pub to: Address,
    pub amount: U256,
}

impl Transfer {
    /// 非 Transfer 事件（或 ERC-721 的 4 topic 形式）返回 None
    pub fn from_log(log: &LogEntry) -> Option<Self> {
        let raw = RawLog {
            topics: log.topics.clone(),
            data: log.data.to_vec(),
        };
        let event = <TransferEvent as EthEvent>::decode_log(&raw).ok()?;
        Some(Self {
            token: log.address,
            from: event.from,
            to: event.to,
            amount: event.value,
        })
    }

    pub fn from_receipt(receipt: &Receipt) -> Vec<Self> {
        receipt.logs.iter().filter_map(Self::from_log).collect()
    }
}
