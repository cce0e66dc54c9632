// services/tx/builder/tx_builder.rs

use crate::errors::error::Result;
use crate::log_debug;
use crate::services::tx::gas::GasService;
use crate::services::tx::nonce::NonceService;
use crate::services::tx::types::{TxRequest, UnsignedTransaction};
use ethers_core::types::transaction::eip2718::TypedTransaction;
use ethers_core::types::{Address, TransactionRequest, U256};
use std::sync::Arc;

/// 把 TxRequest 补全为 UnsignedTransaction。
///
/// 补全顺序固定为 nonce → gas price → gas limit：估算 gas 时会带上已确定的
/// nonce 和 gas price。任一查询失败立即返回，不重试，也不返回半成品。
pub struct TxBuilder {
    nonce_svc: Arc<NonceService>,
    gas_svc: Arc<GasService>,
}

impl TxBuilder {
    pub fn new(nonce_svc: Arc<NonceService>, gas_svc: Arc<GasService>) -> Self {
        Self { nonce_svc, gas_svc }
    }

    pub async fn build(&self, from: Address, req: &TxRequest) -> Result<UnsignedTransaction> {
        // 1. nonce
        let nonce = if req.nonce == 0 {
            self.nonce_svc.pending_nonce(from).await?
        } else {
            req.nonce
        };

        // 2. gas price
        let gas_price = match req.gas_price {
            Some(price) if !price.is_zero() => price,
            _ => self.gas_svc.suggested_price().await?,
        };

        let value = req.value.unwrap_or_default();

        // 3. gas limit
        let gas_limit = if req.gas_limit == 0 {
            let estimate_tx = estimate_request(from, req, nonce, gas_price, value);
            self.gas_svc.estimate_limit(&estimate_tx).await?
        } else {
            req.gas_limit
        };

        log_debug!(
            "交易参数已确定: from={:?} nonce={} gas_price={} gas_limit={}",
            from,
            nonce,
            gas_price,
            gas_limit
        );

        Ok(UnsignedTransaction {
            nonce,
            to: req.to,
            value,
            gas_limit,
            gas_price,
            data: req.data.clone(),
        })
    }
}

/// eth_estimateGas 的模拟调用：from/to/nonce/gasPrice/value/data，不带 gas
fn estimate_request(
    from: Address,
    req: &TxRequest,
    nonce: u64,
    gas_price: U256,
    value: U256,
) -> TypedTransaction {
    let mut estimate_tx = TransactionRequest::new()
        .from(from)
        .nonce(nonce)
        .gas_price(gas_price)
        .value(value)
        .data(req.data.clone());
    if let Some(to) = req.to {
        estimate_tx = estimate_tx.to(to);
    }
    TypedTransaction::Legacy(estimate_tx)
}
