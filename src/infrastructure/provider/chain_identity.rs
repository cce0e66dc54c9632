use crate::errors::error::{AppError, Result};
use crate::infrastructure::provider::ProviderTrait;
use crate::log_debug;
use ethers_core::types::U256;
use tokio::sync::OnceCell;

/// 链 ID：每个连接只查询一次，之后不可变。
///
/// 首次访问由 `OnceCell` 串行化，并发的首批调用者共享同一次 eth_chainId 查询；
/// 查询失败不会写入缓存，下次调用重新查询。
#[derive(Debug, Default)]
pub struct ChainIdentity {
    cell: OnceCell<u64>,
}

impl ChainIdentity {
    pub fn new() -> Self {
        Self { cell: OnceCell::new() }
    }

    /// 配置里已知链 ID 时直接预置，永远不会发起查询
    pub fn with_known(chain_id: u64) -> Self {
        Self {
            cell: OnceCell::new_with(Some(chain_id)),
        }
    }

    pub fn get(&self) -> Option<u64> {
        self.cell.get().copied()
    }

    pub async fn resolve(&self, provider: &dyn ProviderTrait) -> Result<u64> {
        self.cell
            .get_or_try_init(|| async {
                let raw = provider.get_chain_id().await?;
                if raw > U256::from(u64::MAX) {
                    return Err(AppError::Conversion(format!("chain id 超出 u64: {}", raw)));
                }
                log_debug!("chain id 已解析: {}", raw);
                Ok(raw.as_u64())
            })
            .await
            .copied()
    }
}
