use std::collections::HashMap;
use std::{fs, path::Path};

use anyhow::Context;
use dotenv::dotenv;
use envsubst::substitute;
use serde::Deserialize;

use crate::repository::IndexWidth;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub rpc: RpcConfig,
    pub wallet: WalletConfig,
    #[serde(default)]
    pub swapper: SwapperConfig,
}

impl Config {
    pub async fn from_yaml(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        dotenv().ok();

        let path = path.as_ref();
        let file_content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file from path: {}", path.display()))?;

        let env_vars: HashMap<String, String> = std::env::vars()
            .filter(|(key, _)| {
                key.starts_with("SERVER_") || key.starts_with("WALLET_") || key.starts_with("RPC_")
            })
            .collect();

        let interpolated = substitute(&file_content, &env_vars)
            .context("Failed to substitute environment variables in YAML")?;

        let config: Config =
            serde_yaml::from_str(&interpolated).context("Failed to parse YAML configuration")?;

        Ok(config)
    }

    pub fn server_uri(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// Empty means read-only: quotes work, swaps are refused.
    #[serde(default)]
    pub private_key: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SwapperConfig {
    /// Index width for pools without an explicit entry.
    #[serde(default)]
    pub default_index_width: IndexWidth,
    #[serde(default)]
    pub pools: Vec<PoolConfig>,
    /// Symbol to token address aliases.
    #[serde(default)]
    pub tokens: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    pub name: String,
    /// LP token or pool address; for LP tokens the width also applies to the minter.
    pub address: String,
    #[serde(default)]
    pub index_width: Option<IndexWidth>,
}
