use std::str::FromStr;
use std::sync::Arc;

use alloy::contract::Error as ContractCallError;
use alloy::network::{Ethereum, EthereumWallet, ReceiptResponse};
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{PendingTransactionBuilder, Provider};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::decode_revert_reason;
use async_trait::async_trait;
use tracing::instrument;

use super::error::RepositoryError;
use crate::repository::contract::{
    ICurveCoins, ICurveLpToken, ICurvePool128, ICurvePool256, IERC20,
};
use crate::repository::{CurveRepository, IndexWidth, RepoResult};

#[derive(Debug, Clone)]
pub struct TokenBalance {
    pub balance: U256,
    pub decimals: u8,
    pub symbol: String,
}

#[derive(Debug, Clone)]
pub struct TokenMetadata {
    pub decimals: u8,
    pub symbol: String,
}

/// Builds a signing wallet from a hex private key.
pub fn wallet_from_private_key(private_key: &str) -> RepoResult<EthereumWallet> {
    let signer = PrivateKeySigner::from_str(private_key)
        .map_err(|e| RepositoryError::ParseError(format!("Invalid private key: {e}")))?;

    Ok(EthereumWallet::from(signer))
}

/// Sorts an `alloy` contract error into the repository taxonomy.
///
/// Empty or undecodable return data and node-reported reverts become
/// [`RepositoryError::Reverted`]; everything else stays a transport failure.
fn map_call_error(err: ContractCallError) -> RepositoryError {
    let msg = err.to_string();
    match err {
        ContractCallError::ZeroData(..) | ContractCallError::AbiError(_) => {
            RepositoryError::Reverted(msg)
        }
        ContractCallError::TransportError(ref e) => match e.as_error_resp() {
            Some(payload) => {
                let reason = payload
                    .as_revert_data()
                    .and_then(|data| decode_revert_reason(&data));
                if msg.to_lowercase().contains("revert") || reason.is_some() {
                    match reason {
                        Some(reason) => RepositoryError::Reverted(format!("{msg} ({reason})")),
                        None => RepositoryError::Reverted(msg),
                    }
                } else {
                    if msg.contains("429") {
                        tracing::warn!("Rate limited by RPC provider: {msg}");
                    }
                    RepositoryError::RpcError(msg)
                }
            }
            None => RepositoryError::NetworkError(msg),
        },
        _ => RepositoryError::ContractError(msg),
    }
}

pub struct AlloyCurveRepository<P> {
    provider: Arc<P>,
    account: Option<Address>,
}

impl<P: Provider + Clone + 'static> AlloyCurveRepository<P> {
    /// Read-only repository: quotes and index lookups work, transactions do not.
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            account: None,
        }
    }

    /// Repository whose provider signs with `wallet`; the wallet's default signer
    /// becomes the custody account.
    pub fn new_with_wallet(provider: Arc<P>, wallet: &EthereumWallet) -> Self {
        Self {
            provider,
            account: Some(wallet.default_signer().address()),
        }
    }

    fn require_account(&self) -> RepoResult<Address> {
        self.account.ok_or_else(|| {
            RepositoryError::Other("No wallet configured for transaction signing".to_string())
        })
    }

    /// Waits for a submitted transaction and fails if it reverted.
    async fn confirm(
        &self,
        action: &str,
        pending: Result<PendingTransactionBuilder<Ethereum>, ContractCallError>,
    ) -> RepoResult<TxHash> {
        let pending = pending.map_err(map_call_error)?;

        let receipt = pending.get_receipt().await.map_err(|e| {
            RepositoryError::RpcError(format!("Failed to get {action} receipt: {e}"))
        })?;

        let tx_hash = ReceiptResponse::transaction_hash(&receipt);
        if !ReceiptResponse::status(&receipt) {
            tracing::error!("{action} transaction {tx_hash} reverted");
            return Err(RepositoryError::Reverted(format!(
                "{action} transaction {tx_hash} reverted"
            )));
        }

        tracing::debug!("{action} transaction {tx_hash} confirmed");
        Ok(tx_hash)
    }
}

#[async_trait]
impl<P: Provider + Clone + Send + Sync + 'static> CurveRepository for AlloyCurveRepository<P> {
    fn account(&self) -> Option<Address> {
        self.account
    }

    #[instrument(skip(self), err)]
    async fn minter(&self, pool: Address) -> RepoResult<Option<Address>> {
        let lp_token = ICurveLpToken::new(pool, self.provider.clone());

        match lp_token.minter().call().await.map_err(map_call_error) {
            Ok(minter) if minter == Address::ZERO => Ok(None),
            Ok(minter) => Ok(Some(minter)),
            Err(e) if e.is_revert() => {
                tracing::debug!("Pool {pool} exposes no minter: {e}");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self), err)]
    async fn coins(&self, pool: Address, index: U256) -> RepoResult<Option<Address>> {
        let contract = ICurveCoins::new(pool, self.provider.clone());

        match contract.coins(index).call().await.map_err(map_call_error) {
            Ok(coin) => Ok(Some(coin)),
            Err(e) if e.is_revert() => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self), err)]
    async fn get_dy(
        &self,
        pool: Address,
        width: IndexWidth,
        i: U256,
        j: U256,
        dx: U256,
    ) -> RepoResult<U256> {
        let amount_out = match width {
            IndexWidth::Narrow => {
                let contract = ICurvePool128::new(pool, self.provider.clone());
                contract
                    .get_dy(IndexWidth::narrow_index(i)?, IndexWidth::narrow_index(j)?, dx)
                    .call()
                    .await
            }
            IndexWidth::Wide => {
                let contract = ICurvePool256::new(pool, self.provider.clone());
                contract.get_dy(i, j, dx).call().await
            }
        }
        .map_err(|e| {
            tracing::error!("Failed to get_dy on {pool} ({i} -> {j}, dx {dx}): {e}");
            map_call_error(e)
        })?;

        tracing::debug!("get_dy result: {amount_out}");
        Ok(amount_out)
    }

    #[instrument(skip(self), err)]
    async fn simulate_exchange(
        &self,
        from: Address,
        pool: Address,
        width: IndexWidth,
        i: U256,
        j: U256,
        dx: U256,
        min_dy: U256,
    ) -> RepoResult<Option<U256>> {
        // eth_call executes the exchange locally without broadcasting it
        let result = match width {
            IndexWidth::Narrow => {
                let contract = ICurvePool128::new(pool, self.provider.clone());
                contract
                    .exchange(
                        IndexWidth::narrow_index(i)?,
                        IndexWidth::narrow_index(j)?,
                        dx,
                        min_dy,
                    )
                    .from(from)
                    .call()
                    .await
            }
            IndexWidth::Wide => {
                let contract = ICurvePool256::new(pool, self.provider.clone());
                contract
                    .exchange(i, j, dx, min_dy)
                    .from(from)
                    .call()
                    .await
            }
        };

        match result {
            Ok(amount_out) => Ok(Some(amount_out)),
            // Legacy pools return nothing from exchange; the call itself succeeded
            Err(ContractCallError::ZeroData(..)) => Ok(None),
            Err(e) => {
                tracing::debug!("Exchange simulation failed: {e}");
                Err(map_call_error(e))
            }
        }
    }

    #[instrument(skip(self), err)]
    async fn exchange(
        &self,
        pool: Address,
        width: IndexWidth,
        i: U256,
        j: U256,
        dx: U256,
        min_dy: U256,
    ) -> RepoResult<TxHash> {
        let from = self.require_account()?;

        let pending = match width {
            IndexWidth::Narrow => {
                let contract = ICurvePool128::new(pool, self.provider.clone());
                contract
                    .exchange(
                        IndexWidth::narrow_index(i)?,
                        IndexWidth::narrow_index(j)?,
                        dx,
                        min_dy,
                    )
                    .from(from)
                    .send()
                    .await
            }
            IndexWidth::Wide => {
                let contract = ICurvePool256::new(pool, self.provider.clone());
                contract
                    .exchange(i, j, dx, min_dy)
                    .from(from)
                    .send()
                    .await
            }
        };

        self.confirm("exchange", pending).await
    }

    #[instrument(skip(self), err)]
    async fn balance_of(&self, token: Address, owner: Address) -> RepoResult<U256> {
        let contract = IERC20::new(token, self.provider.clone());

        contract
            .balanceOf(owner)
            .call()
            .await
            .map_err(map_call_error)
    }

    #[instrument(skip(self), err)]
    async fn get_erc20_balance(&self, token: Address, owner: Address) -> RepoResult<TokenBalance> {
        let balance = self.balance_of(token, owner).await?;
        let TokenMetadata { decimals, symbol } = self.get_token_metadata(token).await?;

        Ok(TokenBalance {
            balance,
            decimals,
            symbol,
        })
    }

    #[instrument(skip(self), err)]
    async fn get_token_metadata(&self, token: Address) -> RepoResult<TokenMetadata> {
        let contract = IERC20::new(token, self.provider.clone());

        let decimals = contract
            .decimals()
            .call()
            .await
            .map_err(map_call_error)?;

        let symbol = contract
            .symbol()
            .call()
            .await
            .map_err(map_call_error)?;

        Ok(TokenMetadata { decimals, symbol })
    }

    #[instrument(skip(self), err)]
    async fn approve(&self, token: Address, spender: Address, amount: U256) -> RepoResult<TxHash> {
        let from = self.require_account()?;
        let contract = IERC20::new(token, self.provider.clone());

        let pending = contract.approve(spender, amount).from(from).send().await;
        self.confirm("approve", pending).await
    }

    #[instrument(skip(self), err)]
    async fn transfer(&self, token: Address, to: Address, amount: U256) -> RepoResult<TxHash> {
        let from = self.require_account()?;
        let contract = IERC20::new(token, self.provider.clone());

        let pending = contract.transfer(to, amount).from(from).send().await;
        self.confirm("transfer", pending).await
    }
}
