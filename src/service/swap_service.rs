use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use alloy::providers::ProviderBuilder;
use alloy::transports::http::reqwest::Url;
use anyhow::Context;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{Json, ServerHandler, tool, tool_handler, tool_router};
use tracing::instrument;

use crate::config::Config;
use crate::repository::{AlloyCurveRepository, CurveRepository, wallet_from_private_key};
use crate::service::pool_registry::PoolRegistry;
use crate::service::swapper::CurveSwapper;
use crate::service::types::{
    GetBalanceRequest, GetBalanceResponse, GetBalanceResult, GetPriceRequest, GetPriceResponse,
    GetPriceResult, GetTokensIndexRequest, GetTokensIndexResponse, GetTokensIndexResult,
    SwapRequest, SwapResponse, SwapResult,
};
use crate::service::utils::{calculate_exchange_rate, format_balance, parse_amount};
use crate::service::{ServiceError, ServiceResult};

#[derive(Clone)]
pub struct CurveSwapService {
    tool_router: ToolRouter<Self>,
    repository: Arc<dyn CurveRepository>,
    swapper: Arc<CurveSwapper>,
    registry: PoolRegistry,
}

// MCP Tool Layer
#[tool_router]
impl CurveSwapService {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let rpc_url: Url = config
            .rpc
            .url
            .parse()
            .with_context(|| format!("Invalid RPC URL: {}", config.rpc.url))?;

        // Create repository with wallet if private key is provided
        let repository: Arc<dyn CurveRepository> = if !config.wallet.private_key.is_empty() {
            match wallet_from_private_key(&config.wallet.private_key) {
                Ok(wallet) => {
                    let provider = ProviderBuilder::new()
                        .wallet(wallet.clone())
                        .connect_http(rpc_url);
                    let repo = AlloyCurveRepository::new_with_wallet(Arc::new(provider), &wallet);
                    if let Some(address) = repo.account() {
                        tracing::info!("Initialized with adapter account: {address}");
                    }
                    Arc::new(repo)
                }
                Err(e) => {
                    tracing::warn!("Failed to initialize wallet: {e}. Using read-only mode.");
                    Arc::new(AlloyCurveRepository::new(Arc::new(
                        ProviderBuilder::new().connect_http(rpc_url),
                    )))
                }
            }
        } else {
            tracing::info!("No private key provided. Running in read-only mode.");
            Arc::new(AlloyCurveRepository::new(Arc::new(
                ProviderBuilder::new().connect_http(rpc_url),
            )))
        };

        let registry = PoolRegistry::from_config(&config.swapper)?;

        Ok(Self::with_repository(repository, registry))
    }

    pub fn with_repository(repository: Arc<dyn CurveRepository>, registry: PoolRegistry) -> Self {
        let swapper = CurveSwapper::new(repository.clone(), registry.index_widths());

        Self {
            tool_router: Self::tool_router(),
            repository,
            swapper: Arc::new(swapper),
            registry,
        }
    }

    #[instrument(skip(self))]
    #[tool(description = "Query an ERC20 token balance of an account")]
    pub async fn get_balance(
        &self,
        Parameters(req): Parameters<GetBalanceRequest>,
    ) -> Json<GetBalanceResult> {
        match self.get_balance_impl(req).await {
            Ok(response) => Json(GetBalanceResult::Success(response)),
            Err(e) => {
                tracing::error!("Failed to get balance: {e}");
                Json(GetBalanceResult::Error { error: e })
            }
        }
    }

    #[instrument(skip(self))]
    #[tool(
        description = "Quote a Curve pool exchange. The amount is in token_in units; the result is in token_out units."
    )]
    pub async fn get_price(
        &self,
        Parameters(req): Parameters<GetPriceRequest>,
    ) -> Json<GetPriceResult> {
        match self.get_price_impl(req).await {
            Ok(response) => Json(GetPriceResult::Success(response)),
            Err(e) => {
                tracing::error!("Failed to get price: {e}");
                Json(GetPriceResult::Error { error: e })
            }
        }
    }

    #[instrument(skip(self))]
    #[tool(description = "Look up the raw coin indices of two tokens in a Curve pool or minter")]
    pub async fn get_tokens_index(
        &self,
        Parameters(req): Parameters<GetTokensIndexRequest>,
    ) -> Json<GetTokensIndexResult> {
        match self.get_tokens_index_impl(req).await {
            Ok(response) => Json(GetTokensIndexResult::Success(response)),
            Err(e) => {
                tracing::error!("Failed to get token indices: {e}");
                Json(GetTokensIndexResult::Error { error: e })
            }
        }
    }

    #[instrument(skip(self))]
    #[tool(
        description = "Swap the adapter's whole token_in balance for token_out in a Curve pool and send the output to the recipient. Fails without moving funds if the output would fall below the slippage bound."
    )]
    pub async fn swap(&self, Parameters(req): Parameters<SwapRequest>) -> Json<SwapResult> {
        match self.swap_impl(req).await {
            Ok(response) => Json(SwapResult::Success(response)),
            Err(e) => {
                tracing::error!("Failed to swap: {e}");
                Json(SwapResult::Error { error: e })
            }
        }
    }
}

// Business Logic - Core implementation
impl CurveSwapService {
    #[instrument(skip(self), err)]
    async fn get_balance_impl(&self, req: GetBalanceRequest) -> ServiceResult<GetBalanceResponse> {
        let owner = Address::from_str(&req.owner)
            .map_err(|e| ServiceError::InvalidAddress(format!("{}: {e}", req.owner)))?;
        let token = self.registry.resolve_token(&req.token)?;

        tracing::info!("Querying {token} balance for address: {owner}");

        let token_balance = self.repository.get_erc20_balance(token, owner).await?;

        Ok(GetBalanceResponse {
            balance: token_balance.balance.to_string(),
            formatted_balance: format_balance(token_balance.balance, token_balance.decimals),
            decimals: token_balance.decimals,
            symbol: token_balance.symbol,
        })
    }

    #[instrument(skip(self), err)]
    async fn get_price_impl(&self, req: GetPriceRequest) -> ServiceResult<GetPriceResponse> {
        let pool = self.registry.resolve_pool(&req.pool)?;
        let token_in = self.registry.resolve_token(&req.token_in)?;
        let token_out = self.registry.resolve_token(&req.token_out)?;

        // Resolve membership before any token metadata reads
        let route = self.swapper.route(pool, token_in, token_out).await?;

        let in_metadata = self.repository.get_token_metadata(token_in).await?;
        let out_metadata = self.repository.get_token_metadata(token_out).await?;

        // Parse amount with proper decimals (converts human-readable amount to smallest unit)
        let amount_in =
            parse_amount(&req.amount, in_metadata.decimals).map_err(ServiceError::InvalidAmount)?;

        let amount_out = self.swapper.quote(&route, amount_in).await?;

        let exchange_rate = calculate_exchange_rate(
            amount_in,
            amount_out,
            in_metadata.decimals,
            out_metadata.decimals,
        );

        tracing::info!(
            "Quoted {} {} -> {} {} (rate {exchange_rate})",
            format_balance(amount_in, in_metadata.decimals),
            in_metadata.symbol,
            format_balance(amount_out, out_metadata.decimals),
            out_metadata.symbol
        );

        Ok(GetPriceResponse {
            pool: pool.to_string(),
            index_authority: route.authority.address().to_string(),
            amount_in_raw: amount_in.to_string(),
            amount_out_raw: amount_out.to_string(),
            amount_out: format_balance(amount_out, out_metadata.decimals),
            decimals_out: out_metadata.decimals,
            symbol_out: out_metadata.symbol,
            exchange_rate,
            timestamp: chrono::Utc::now().timestamp(),
        })
    }

    #[instrument(skip(self), err)]
    async fn get_tokens_index_impl(
        &self,
        req: GetTokensIndexRequest,
    ) -> ServiceResult<GetTokensIndexResponse> {
        let authority = self.registry.resolve_pool(&req.authority)?;
        let token_in = self.registry.resolve_token(&req.token_in)?;
        let token_out = self.registry.resolve_token(&req.token_out)?;

        let pair = self
            .swapper
            .get_tokens_index(authority, token_in, token_out)
            .await?;

        Ok(GetTokensIndexResponse {
            token_in_index: pair.token_in_index.to_string(),
            token_out_index: pair.token_out_index.to_string(),
        })
    }

    #[instrument(skip(self), err)]
    async fn swap_impl(&self, req: SwapRequest) -> ServiceResult<SwapResponse> {
        let pool = self.registry.resolve_pool(&req.pool)?;
        let token_in = self.registry.resolve_token(&req.token_in)?;
        let token_out = self.registry.resolve_token(&req.token_out)?;
        let recipient = Address::from_str(&req.recipient)
            .map_err(|e| ServiceError::InvalidAddress(format!("{}: {e}", req.recipient)))?;

        let outcome = self
            .swapper
            .swap(pool, token_in, token_out, recipient, req.slippage_tolerance_bps)
            .await?;

        // The swap is committed; missing metadata only degrades formatting
        let in_decimals = self.token_decimals(token_in).await;
        let out_decimals = self.token_decimals(token_out).await;

        Ok(SwapResponse {
            amount_in: format_or_raw(outcome.amount_in, in_decimals),
            expected_output: format_or_raw(outcome.expected_output, out_decimals),
            minimum_output: format_or_raw(outcome.minimum_output, out_decimals),
            amount_out: format_or_raw(outcome.amount_out, out_decimals),
            amount_out_raw: outcome.amount_out.to_string(),
            recipient: recipient.to_string(),
            exchange_tx: outcome.exchange_tx.to_string(),
            transfer_tx: outcome.transfer_tx.map(|tx| tx.to_string()),
        })
    }

    async fn token_decimals(&self, token: Address) -> Option<u8> {
        match self.repository.get_token_metadata(token).await {
            Ok(metadata) => Some(metadata.decimals),
            Err(e) => {
                tracing::warn!("No metadata for {token}, reporting raw amounts: {e}");
                None
            }
        }
    }
}

fn format_or_raw(amount: U256, decimals: Option<u8>) -> String {
    match decimals {
        Some(decimals) => format_balance(amount, decimals),
        None => amount.to_string(),
    }
}

#[tool_handler]
impl ServerHandler for CurveSwapService {}
