use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repository::RepositoryError;

#[derive(Debug, Clone, Error, JsonSchema, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ServiceError {
    // Index resolution errors
    /// The input token is not a member of the pool's index authority.
    #[error("Wrong tokenIn: {0}")]
    UnknownTokenIn(String),

    /// The output token is not a member of the pool's index authority.
    #[error("Wrong tokenOut: {0}")]
    UnknownTokenOut(String),

    /// Input and output token are the same address.
    #[error("tokenIn and tokenOut are identical: {0}")]
    IdenticalTokens(String),

    // Swap execution errors
    /// The swap would deliver less than the caller's minimum-acceptable output.
    #[error("Slippage tolerance exceeded: minimum {minimum}, achievable {actual}")]
    SlippageExceeded { minimum: String, actual: String },

    /// The slippage tolerance is outside 0..=10000 basis points.
    #[error("Invalid slippage tolerance: {0} bps (must be between 0 and 10000)")]
    InvalidSlippage(u32),

    /// The adapter holds none of the input token.
    #[error("Nothing to swap: adapter holds no {0}")]
    NothingToSwap(String),

    /// The exchange committed but its output could not be forwarded to the recipient.
    ///
    /// `amount` is empty when the adapter balance could not be read.
    #[error(
        "Exchange {exchange_tx} committed but forwarding {amount} of {token} failed: {reason}"
    )]
    ForwardFailed {
        exchange_tx: String,
        token: String,
        amount: String,
        reason: String,
    },

    /// State-changing calls need a signing wallet.
    #[error("No wallet configured; swaps are unavailable in read-only mode")]
    WalletNotConfigured,

    // Request validation errors
    /// The provided address is invalid or malformed.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// The requested amount is invalid (e.g., negative, zero, or malformed).
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    // Infrastructure errors (abstracted from repository layer)
    /// An error occurred while communicating with the blockchain.
    #[error("Blockchain connection error: {0}")]
    BlockchainError(String),

    /// An unexpected internal error occurred.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::RpcError(msg)
            | RepositoryError::NetworkError(msg)
            | RepositoryError::ContractError(msg)
            | RepositoryError::Reverted(msg) => {
                ServiceError::BlockchainError(format!("Failed to interact with blockchain: {msg}"))
            }
            RepositoryError::ParseError(msg) => ServiceError::InvalidAddress(msg),
            RepositoryError::Other(msg) => ServiceError::InternalError(msg),
        }
    }
}
