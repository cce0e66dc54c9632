use crate::errors::error::{AppError, Result};
use crate::infrastructure::codec::ContractCodec;
use crate::log_debug;
use crate::models::{LogEntry, Receipt};
use ethers_core::abi::{Event, RawLog, Token};
use ethers_core::types::{Address, H256};
use std::collections::HashMap;

/// 按 ABI 解码后的事件
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
    pub name: String,
    pub address: Address,
    pub params: Vec<(String, Token)>,
}

impl DecodedEvent {
    pub fn param(&self, name: &str) -> Option<&Token> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// 事件日志解析器：topics[0] → ABI Event
pub struct EventParser {
    events: HashMap<H256, Event>,
}

impl EventParser {
    /// 匿名事件没有 topics[0]，无法按签名匹配，直接忽略
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        let events = events
            .into_iter()
            .filter(|e| !e.anonymous)
            .map(|e| (e.signature(), e))
            .collect();
        Self { events }
    }

    pub fn from_codec(codec: &ContractCodec) -> Self {
        Self::new(codec.abi().events().cloned())
    }

    pub fn knows(&self, topic: &H256) -> bool {
        self.events.contains_key(topic)
    }

    /// 解析单条日志；签名未知时返回 `Ok(None)`，签名匹配但数据不符返回 Decode 错误
    pub fn parse_log(&self, log: &LogEntry) -> Result<Option<DecodedEvent>> {
        let Some(topic0) = log.topics.first() else {
            return Ok(None);
        };
        let Some(event) = self.events.get(topic0) else {
            return Ok(None);
        };

        let raw = RawLog {
            topics: log.topics.clone(),
            data: log.data.to_vec(),
        };
        let parsed = event
            .parse_log(raw)
            .map_err(|e| AppError::Decode(format!("事件 {} 解码失败: {}", event.name, e)))?;

        Ok(Some(DecodedEvent {
            name: event.name.clone(),
            address: log.address,
            params: parsed.params.into_iter().map(|p| (p.name, p.value)).collect(),
        }))
    }

    /// 回执中所有可识别的事件，解码失败的日志跳过
    pub fn parse_receipt(&self, receipt: &Receipt) -> Vec<DecodedEvent> {
        receipt
            .logs
            .iter()
            .filter_map(|log| match self.parse_log(log) {
                Ok(decoded) => decoded,
                Err(e) => {
                    log_debug!("交易 {:#x} 日志跳过: {}", receipt.tx_hash, e);
                    None
                }
            })
            .collect()
    }
}
