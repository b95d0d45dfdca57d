use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Contract call error: {0}")]
    ContractError(String),

    /// The contract executed and reverted, or returned nothing decodable.
    #[error("Execution reverted: {0}")]
    Reverted(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("{0}")]
    Other(String),
}

impl RepositoryError {
    /// Revert reason Curve pools emit when `exchange` misses its `min_dy` bound.
    pub const CURVE_SLIPPAGE_REASON: &'static str =
        "Exchange resulted in fewer coins than expected";

    pub fn is_revert(&self) -> bool {
        matches!(self, RepositoryError::Reverted(_))
    }

    /// True when the pool rejected an exchange because of its minimum-output bound.
    pub fn is_slippage_revert(&self) -> bool {
        match self {
            RepositoryError::Reverted(msg) => msg.contains(Self::CURVE_SLIPPAGE_REASON),
            _ => false,
        }
    }
}
