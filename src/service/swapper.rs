//! Curve swapper core: quoting and slippage-bounded execution.

use std::collections::HashMap;
use std::sync::Arc;

use alloy::primitives::{Address, TxHash, U256};
use tracing::instrument;

use crate::repository::{CurveRepository, IndexWidth, RepositoryError};
use crate::service::resolver::{
    AuthoritySource, TokenIndexPair, resolve_authority, resolve_indices,
};
use crate::service::utils::{calculate_minimum_output, validate_slippage};
use crate::service::{ServiceError, ServiceResult};

/// Chooses the native index width for a pool.
///
/// A pool can be listed by LP token or by its minter; the minter entry wins.
#[derive(Debug, Clone, Default)]
pub struct IndexWidthPolicy {
    default: IndexWidth,
    overrides: HashMap<Address, IndexWidth>,
}

impl IndexWidthPolicy {
    pub fn new(default: IndexWidth) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    pub fn with_pool(mut self, pool: Address, width: IndexWidth) -> Self {
        self.overrides.insert(pool, width);
        self
    }

    pub fn width_for(&self, pool: Address, authority: &AuthoritySource) -> IndexWidth {
        self.overrides
            .get(&authority.address())
            .or_else(|| self.overrides.get(&pool))
            .copied()
            .unwrap_or(self.default)
    }
}

/// Everything needed to talk to a pool's native primitives for one token pair.
#[derive(Debug, Clone, Copy)]
pub struct Route {
    pub authority: AuthoritySource,
    pub indices: TokenIndexPair,
    pub width: IndexWidth,
}

/// Result of a committed swap.
#[derive(Debug, Clone)]
pub struct SwapOutcome {
    pub amount_in: U256,
    pub expected_output: U256,
    pub minimum_output: U256,
    pub amount_out: U256,
    pub exchange_tx: TxHash,
    pub transfer_tx: Option<TxHash>,
}

pub struct CurveSwapper {
    repository: Arc<dyn CurveRepository>,
    widths: IndexWidthPolicy,
}

impl CurveSwapper {
    pub fn new(repository: Arc<dyn CurveRepository>, widths: IndexWidthPolicy) -> Self {
        Self {
            repository,
            widths,
        }
    }

    /// Raw coin indices of a token pair in an index authority.
    #[instrument(skip(self), err)]
    pub async fn get_tokens_index(
        &self,
        authority: Address,
        token_in: Address,
        token_out: Address,
    ) -> ServiceResult<TokenIndexPair> {
        resolve_indices(self.repository.as_ref(), authority, token_in, token_out).await
    }

    /// Quotes `amount_in` of `token_in` for `token_out` in `pool`.
    ///
    /// The pool's `get_dy` already answers in `token_out` precision, so the
    /// result is returned as-is. Nothing is written.
    #[instrument(skip(self), err)]
    pub async fn get_price(
        &self,
        pool: Address,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> ServiceResult<U256> {
        let route = self.route(pool, token_in, token_out).await?;
        self.quote(&route, amount_in).await
    }

    /// Swaps the adapter's whole `token_in` balance for `token_out` and sends the
    /// proceeds to `recipient`.
    ///
    /// The minimum accepted output is the current quote less `slippage_bps`.
    /// When the pool cannot meet it the call fails with `SlippageExceeded`
    /// before any balance moves.
    #[instrument(skip(self), err)]
    pub async fn swap(
        &self,
        pool: Address,
        token_in: Address,
        token_out: Address,
        recipient: Address,
        slippage_bps: u32,
    ) -> ServiceResult<SwapOutcome> {
        validate_slippage(slippage_bps)?;

        let account = self
            .repository
            .account()
            .ok_or(ServiceError::WalletNotConfigured)?;

        let route = self.route(pool, token_in, token_out).await?;

        let amount_in = self.repository.balance_of(token_in, account).await?;
        if amount_in.is_zero() {
            return Err(ServiceError::NothingToSwap(token_in.to_string()));
        }

        let expected_output = self.quote(&route, amount_in).await?;
        let minimum_output = calculate_minimum_output(expected_output, slippage_bps)?;
        tracing::info!(
            "Swapping {amount_in} of {token_in} via {:?}: expected {expected_output}, minimum {minimum_output}",
            route.authority
        );

        let spender = route.authority.address();
        self.repository
            .approve(token_in, spender, amount_in)
            .await?;

        if let Err(e) = self
            .preflight(account, &route, amount_in, minimum_output)
            .await
        {
            self.revoke(token_in, spender).await;
            return Err(e);
        }

        let exchange_tx = match self
            .repository
            .exchange(
                spender,
                route.width,
                route.indices.token_in_index,
                route.indices.token_out_index,
                amount_in,
                minimum_output,
            )
            .await
        {
            Ok(tx) => tx,
            Err(e) => {
                self.revoke(token_in, spender).await;
                return Err(Self::exchange_error(e, minimum_output));
            }
        };

        // From here on the exchange is committed; failures must carry its hash
        let amount_out = self
            .repository
            .balance_of(token_out, account)
            .await
            .map_err(|e| Self::forward_failed(exchange_tx, token_out, None, e))?;
        let transfer_tx = if amount_out.is_zero() {
            tracing::warn!("Exchange {exchange_tx} left no {token_out} to forward");
            None
        } else {
            Some(
                self.repository
                    .transfer(token_out, recipient, amount_out)
                    .await
                    .map_err(|e| {
                        Self::forward_failed(exchange_tx, token_out, Some(amount_out), e)
                    })?,
            )
        };

        tracing::info!("Delivered {amount_out} of {token_out} to {recipient}");

        Ok(SwapOutcome {
            amount_in,
            expected_output,
            minimum_output,
            amount_out,
            exchange_tx,
            transfer_tx,
        })
    }

    /// Resolves the index authority, coin indices and index width for a pair.
    pub async fn route(
        &self,
        pool: Address,
        token_in: Address,
        token_out: Address,
    ) -> ServiceResult<Route> {
        if token_in == token_out {
            return Err(ServiceError::IdenticalTokens(token_in.to_string()));
        }

        let authority = resolve_authority(self.repository.as_ref(), pool).await?;
        let indices = resolve_indices(
            self.repository.as_ref(),
            authority.address(),
            token_in,
            token_out,
        )
        .await?;
        let width = self.widths.width_for(pool, &authority);

        Ok(Route {
            authority,
            indices,
            width,
        })
    }

    /// `get_dy` on an already resolved route.
    pub async fn quote(&self, route: &Route, amount_in: U256) -> ServiceResult<U256> {
        let amount_out = self
            .repository
            .get_dy(
                route.authority.address(),
                route.width,
                route.indices.token_in_index,
                route.indices.token_out_index,
                amount_in,
            )
            .await?;

        Ok(amount_out)
    }

    /// Dry-runs the exchange with the real bound from the custody account.
    async fn preflight(
        &self,
        account: Address,
        route: &Route,
        amount_in: U256,
        minimum_output: U256,
    ) -> ServiceResult<()> {
        let simulated = self
            .repository
            .simulate_exchange(
                account,
                route.authority.address(),
                route.width,
                route.indices.token_in_index,
                route.indices.token_out_index,
                amount_in,
                minimum_output,
            )
            .await
            .map_err(|e| Self::exchange_error(e, minimum_output))?;

        match simulated {
            Some(actual) if actual < minimum_output => {
                tracing::warn!("Swap rejected: dry run yields {actual}, minimum {minimum_output}");
                Err(ServiceError::SlippageExceeded {
                    minimum: minimum_output.to_string(),
                    actual: actual.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    fn exchange_error(err: RepositoryError, minimum: U256) -> ServiceError {
        if err.is_slippage_revert() {
            tracing::warn!("Swap rejected: output below minimum {minimum}");
            ServiceError::SlippageExceeded {
                minimum: minimum.to_string(),
                actual: "below minimum".to_string(),
            }
        } else {
            err.into()
        }
    }

    fn forward_failed(
        exchange_tx: TxHash,
        token: Address,
        amount: Option<U256>,
        err: RepositoryError,
    ) -> ServiceError {
        tracing::error!("Exchange {exchange_tx} committed but {token} was not forwarded: {err}");
        ServiceError::ForwardFailed {
            exchange_tx: exchange_tx.to_string(),
            token: token.to_string(),
            amount: amount.map(|a| a.to_string()).unwrap_or_default(),
            reason: err.to_string(),
        }
    }

    /// Drops a pending approval after a rejected swap; failures are only logged.
    async fn revoke(&self, token: Address, spender: Address) {
        if let Err(e) = self.repository.approve(token, spender, U256::ZERO).await {
            tracing::warn!("Failed to revoke {token} approval for {spender}: {e}");
        }
    }
}
