// services/tx/gas/gas_service.rs

use crate::errors::error::{AppError, Result};
use crate::infrastructure::provider::ProviderTrait;
use ethers_core::types::U256;
use ethers_core::types::transaction::eip2718::TypedTransaction;
use std::sync::Arc;

/// Gas 价格与用量：只用节点建议价，不做费率市场策略
pub struct GasService {
    provider: Arc<dyn ProviderTrait>,
}

impl GasService {
    pub fn new(provider: Arc<dyn ProviderTrait>) -> Self {
        Self { provider }
    }

    /// eth_gasPrice
    pub async fn suggested_price(&self) -> Result<U256> {
        self.provider.get_gas_price().await
    }

    /// eth_estimateGas，结果必须能放进 u64
    pub async fn estimate_limit(&self, tx: &TypedTransaction) -> Result<u64> {
        let gas = self.provider.estimate_gas(tx).await?;
        if gas > U256::from(u64::MAX) {
            return Err(AppError::Conversion(format!("gas 估算值超出 u64: {}", gas)));
        }
        Ok(gas.as_u64())
    }
}
