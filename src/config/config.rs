use config;
use config::{ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub ethereum: EthereumConfig,
    #[serde(default)]
    pub tx: TxConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EthereumConfig {
    pub rpc_url: String,
    /// 逗号分隔，为空时直接使用 rpc_url
    #[serde(default)]
    pub api_keys: String,
    /// 已知链 ID 时可预置，省去首次 eth_chainId 查询
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// 交易确认轮询参数
#[derive(Debug, Deserialize, Clone)]
pub struct TxConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,
}

impl Default for TxConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            confirm_timeout_secs: default_confirm_timeout_secs(),
        }
    }
}

impl TxConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_secs)
    }
}

/// 私钥优先于助记词；两者都为空时生成随机私钥
#[derive(Deserialize, Clone, Default)]
pub struct WalletConfig {
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub mnemonic: Option<String>,
    #[serde(default)]
    pub account_index: u32,
}

// 避免私钥出现在日志里
impl std::fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletConfig")
            .field("private_key", &self.private_key.as_ref().map(|_| "***"))
            .field("mnemonic", &self.mnemonic.as_ref().map(|_| "***"))
            .field("account_index", &self.account_index)
            .finish()
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_confirm_timeout_secs() -> u64 {
    120
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        // .env 不存在时忽略
        let _ = dotenvy::dotenv();
        let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        config::Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(raw: &str) -> Config {
        config::Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize())
            .unwrap()
    }

    #[test]
    fn tx_section_falls_back_to_defaults() {
        let cfg = from_toml(
            r#"
            [ethereum]
            rpc_url = "http://localhost:8545"
            "#,
        );
        assert_eq!(cfg.tx.poll_interval(), Duration::from_secs(1));
        assert_eq!(cfg.tx.confirm_timeout(), Duration::from_secs(120));
        assert!(cfg.ethereum.chain_id.is_none());
        assert!(cfg.wallet.private_key.is_none());
    }

    #[test]
    fn debug_hides_key_material() {
        let wallet = WalletConfig {
            private_key: Some("0xdeadbeef".to_string()),
            mnemonic: None,
            account_index: 2,
        };
        let printed = format!("{:?}", wallet);
        assert!(!printed.contains("deadbeef"));
        assert!(printed.contains("account_index: 2"));
    }
}
