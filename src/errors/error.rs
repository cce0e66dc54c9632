use ethers_core::abi::Error as AbiError;
use ethers_core::types::H256;
use ethers_providers::ProviderError;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    /// 链上查询失败（RPC 原样透传，不重试）
    #[error("区块链RPC错误: {0}")]
    ProviderError(String),

    /// chain id 无法解析或私钥无效
    #[error("签名失败: {0}")]
    Signing(String),

    /// 节点拒绝交易，保留节点原始原因（nonce too low / insufficient funds / underpriced）
    #[error("交易广播被拒绝: {0}")]
    BroadcastRejected(String),

    /// 超时只代表“仍未打包”，不代表交易失败
    #[error("等待交易 {tx_hash:#x} 确认超时（{timeout:?}），交易可能仍在 pending")]
    ConfirmationTimeout { tx_hash: H256, timeout: Duration },

    #[error("等待交易 {tx_hash:#x} 确认已被调用方取消")]
    ConfirmationCancelled { tx_hash: H256 },

    #[error("轮询器已处于终止状态: {0}")]
    PollerFinished(String),

    #[error("合约调用编码错误: {0}")]
    Encode(String),

    #[error("合约返回值解码错误: {0}")]
    Decode(String),

    #[error("类型转换错误: {0}")]
    Conversion(String),

    #[error("无效的数字: {0}")]
    InvalidNumber(String),

    #[error("无效的地址: {0}")]
    InvalidAddress(String),

    #[error("无效的十六进制数据: {0}")]
    InvalidHex(String),

    #[error("无效的私钥/助记词: {0}")]
    InvalidKey(String),

    #[error("无效的URL: {0}")]
    InvalidUrl(String),

    #[error("配置错误: {0}")]
    Config(String),

    /// 内部不可预期错误（兜底）
    #[error("内部错误: {0}")]
    Internal(String),
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::ProviderError(err.to_string())
    }
}

impl From<AbiError> for AppError {
    fn from(err: AbiError) -> Self {
        AppError::Decode(err.to_string())
    }
}

impl From<hex::FromHexError> for AppError {
    fn from(err: hex::FromHexError) -> Self {
        AppError::InvalidHex(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(err: std::num::ParseIntError) -> Self {
        AppError::InvalidNumber(err.to_string())
    }
}
