use std::collections::HashMap;
use std::str::FromStr;

use alloy::primitives::Address;

use crate::config::SwapperConfig;
use crate::service::swapper::IndexWidthPolicy;
use crate::service::{ServiceError, ServiceResult};

/// Configured aliases for pools and tokens, plus the per-pool index widths
#[derive(Debug, Clone, Default)]
pub struct PoolRegistry {
    pools: HashMap<String, Address>,
    tokens: HashMap<String, Address>,
    widths: IndexWidthPolicy,
}

impl PoolRegistry {
    /// Build the registry from the `swapper` config section
    ///
    /// Names and symbols are stored upper-cased so lookups are case-insensitive.
    pub fn from_config(config: &SwapperConfig) -> ServiceResult<Self> {
        let mut pools = HashMap::new();
        let mut widths = IndexWidthPolicy::new(config.default_index_width);

        for pool in &config.pools {
            let address = parse_address(&pool.address)?;
            pools.insert(pool.name.to_uppercase(), address);
            if let Some(width) = pool.index_width {
                widths = widths.with_pool(address, width);
            }
        }

        let mut tokens = HashMap::new();
        for (symbol, address) in &config.tokens {
            tokens.insert(symbol.to_uppercase(), parse_address(address)?);
        }

        tracing::debug!(
            "Loaded {} pools and {} token aliases",
            pools.len(),
            tokens.len()
        );

        Ok(Self {
            pools,
            tokens,
            widths,
        })
    }

    /// Lookup token address by symbol (case-insensitive)
    pub fn lookup_token(&self, symbol: &str) -> Option<Address> {
        self.tokens.get(&symbol.to_uppercase()).copied()
    }

    /// Lookup pool address by configured name (case-insensitive)
    pub fn lookup_pool(&self, name: &str) -> Option<Address> {
        self.pools.get(&name.to_uppercase()).copied()
    }

    /// Get list of all supported token symbols (sorted alphabetically)
    pub fn supported_tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self.tokens.keys().cloned().collect();
        tokens.sort();
        tokens
    }

    /// Get list of all configured pool names (sorted alphabetically)
    pub fn supported_pools(&self) -> Vec<String> {
        let mut pools: Vec<String> = self.pools.keys().cloned().collect();
        pools.sort();
        pools
    }

    /// Accepts a hex address or a registered token symbol
    pub fn resolve_token(&self, token: &str) -> ServiceResult<Address> {
        if let Ok(address) = Address::from_str(token) {
            return Ok(address);
        }

        self.lookup_token(token).ok_or_else(|| {
            tracing::warn!("Token symbol not found in registry: {token}");
            ServiceError::InvalidAddress(format!(
                "{token} (Supported tokens: {})",
                self.supported_tokens().join(", ")
            ))
        })
    }

    /// Accepts a hex address or a configured pool name
    pub fn resolve_pool(&self, pool: &str) -> ServiceResult<Address> {
        if let Ok(address) = Address::from_str(pool) {
            return Ok(address);
        }

        self.lookup_pool(pool).ok_or_else(|| {
            tracing::warn!("Pool name not found in registry: {pool}");
            ServiceError::InvalidAddress(format!(
                "{pool} (Supported pools: {})",
                self.supported_pools().join(", ")
            ))
        })
    }

    pub fn index_widths(&self) -> IndexWidthPolicy {
        self.widths.clone()
    }
}

fn parse_address(address: &str) -> ServiceResult<Address> {
    Address::from_str(address)
        .map_err(|e| ServiceError::InvalidAddress(format!("{address}: {e}")))
}
