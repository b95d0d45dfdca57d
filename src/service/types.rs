use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

use crate::service::ServiceError;

// Response types that include error handling
#[derive(Debug, JsonSchema, Serialize)]
#[serde(untagged)]
pub enum GetBalanceResult {
    Success(GetBalanceResponse),
    Error { error: ServiceError },
}

#[derive(Debug, JsonSchema, Serialize)]
#[serde(untagged)]
pub enum GetPriceResult {
    Success(GetPriceResponse),
    Error { error: ServiceError },
}

#[derive(Debug, JsonSchema, Serialize)]
#[serde(untagged)]
pub enum GetTokensIndexResult {
    Success(GetTokensIndexResponse),
    Error { error: ServiceError },
}

#[derive(Debug, JsonSchema, Serialize)]
#[serde(untagged)]
pub enum SwapResult {
    Success(SwapResponse),
    Error { error: ServiceError },
}

#[derive(Debug, JsonSchema, Serialize, Deserialize)]
pub struct GetBalanceRequest {
    /// Account to query, as an address
    pub owner: String,
    /// Token symbol registered in config (e.g., "amUSDC") or contract address
    pub token: String,
}

#[derive(Debug, JsonSchema, Serialize)]
pub struct GetBalanceResponse {
    /// Raw balance value
    pub balance: String,
    /// Balance formatted with proper decimals
    pub formatted_balance: String,
    /// Token decimals
    pub decimals: u8,
    /// Token symbol
    pub symbol: String,
}

#[derive(Debug, JsonSchema, Serialize, Deserialize)]
pub struct GetPriceRequest {
    /// Pool name from config (e.g., "am3CRV") or pool/LP token address
    pub pool: String,
    /// Input token symbol or address
    pub token_in: String,
    /// Output token symbol or address
    pub token_out: String,
    /// Amount of token_in in human-readable format (e.g., "1" or "100.5")
    pub amount: String,
}

#[derive(Debug, JsonSchema, Serialize)]
pub struct GetPriceResponse {
    /// Pool the quote was taken from
    pub pool: String,
    /// Contract that resolved coin indices and produced the quote
    pub index_authority: String,
    /// Amount of token_in in its smallest unit
    pub amount_in_raw: String,
    /// Quoted output in token_out's smallest unit
    pub amount_out_raw: String,
    /// Quoted output formatted with token_out's decimals
    pub amount_out: String,
    /// token_out decimals
    pub decimals_out: u8,
    /// token_out symbol
    pub symbol_out: String,
    /// Units of token_out per unit of token_in
    pub exchange_rate: String,
    /// Timestamp of the quote
    pub timestamp: i64,
}

#[derive(Debug, JsonSchema, Serialize, Deserialize)]
pub struct GetTokensIndexRequest {
    /// Index authority: a pool, or the minter behind an LP token
    pub authority: String,
    /// Input token symbol or address
    pub token_in: String,
    /// Output token symbol or address
    pub token_out: String,
}

#[derive(Debug, JsonSchema, Serialize)]
pub struct GetTokensIndexResponse {
    pub token_in_index: String,
    pub token_out_index: String,
}

#[derive(Debug, JsonSchema, Serialize, Deserialize)]
pub struct SwapRequest {
    /// Pool name from config (e.g., "am3CRV") or pool/LP token address
    pub pool: String,
    /// Token held by the adapter; its whole balance is swapped
    pub token_in: String,
    /// Token delivered to the recipient
    pub token_out: String,
    /// Address receiving the output tokens
    pub recipient: String,
    /// Slippage tolerance in basis points (e.g., 10 for 0.1%, max 10000)
    pub slippage_tolerance_bps: u32,
}

#[derive(Debug, JsonSchema, Serialize)]
pub struct SwapResponse {
    /// Amount of token_in swapped (formatted, raw if the token has no metadata)
    pub amount_in: String,
    /// Quoted output before execution (formatted, raw if the token has no metadata)
    pub expected_output: String,
    /// Minimum accepted output after slippage (formatted, raw if the token has no metadata)
    pub minimum_output: String,
    /// Output delivered to the recipient (formatted, raw if the token has no metadata)
    pub amount_out: String,
    /// Output delivered to the recipient (raw)
    pub amount_out_raw: String,
    /// Recipient address
    pub recipient: String,
    /// Hash of the exchange transaction
    pub exchange_tx: String,
    /// Hash of the transfer to the recipient, absent when nothing was delivered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_tx: Option<String>,
}
