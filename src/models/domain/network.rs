use crate::utils::{GWEI_DECIMALS, format_with_unit};
use ethers_core::types::U256;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainInfo {
    pub chain_id: u64,
    /// net_version，多数网络与 chain_id 相同
    pub network_id: String,
}

/// 节点当前状态快照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkStatus {
    pub chain_id: u64,
    pub block_number: u64,
    pub gas_price: U256,
}

impl fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let gas_price = format_with_unit(self.gas_price, GWEI_DECIMALS, "Gwei").map_err(|_| fmt::Error)?;
        write!(
            f,
            "chain_id={} block={} gas_price={}",
            self.chain_id, self.block_number, gas_price
        )
    }
}
