pub mod alloy;
pub mod contract;
pub mod error;

#[cfg(test)]
pub(crate) mod mock;

use ::alloy::primitives::{Address, TxHash, U256};
pub use alloy::{AlloyCurveRepository, TokenBalance, TokenMetadata, wallet_from_private_key};
use async_trait::async_trait;
pub use error::RepositoryError;
use serde::Deserialize;

pub(crate) type RepoResult<T> = std::result::Result<T, RepositoryError>;

/// Native integer type a Curve pool uses for coin indices in `get_dy`/`exchange`.
///
/// Classic StableSwap templates take `int128`, factory and crypto templates take
/// `uint256`. Callers above the repository always carry indices as `U256`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexWidth {
    /// `int128` indices.
    #[default]
    #[serde(alias = "int128")]
    Narrow,
    /// `uint256` indices.
    #[serde(alias = "uint256")]
    Wide,
}

impl IndexWidth {
    /// Narrows a widened index to the `int128` form.
    pub fn narrow_index(index: U256) -> RepoResult<i128> {
        if index > U256::from(i128::MAX as u128) {
            return Err(RepositoryError::ParseError(format!(
                "Coin index {index} does not fit in int128"
            )));
        }
        Ok(index.to::<u128>() as i128)
    }
}

/// Trait over the Curve pool protocol and the ERC20 calls the swapper consumes.
///
/// Implementations own every protocol detail: ABI encoding, the `int128` versus
/// `uint256` index split, revert classification and transaction submission.
/// The swapper core only sees addresses, widened indices and raw amounts.
#[async_trait]
pub trait CurveRepository: Send + Sync {
    /// Returns the custody account the swapper spends from, if a signer is configured.
    fn account(&self) -> Option<Address>;

    /// Reads `minter()` on an LP token.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(minter))` - The LP token delegates index authority to `minter`
    /// * `Ok(None)` - The call reverted, returned nothing, or returned the zero address
    /// * `Err(RepositoryError)` - Transport failure; never interpreted as "no minter"
    async fn minter(&self, pool: Address) -> RepoResult<Option<Address>>;

    /// Reads `coins(index)` on a pool.
    ///
    /// Returns `Ok(None)` when the pool reverts, which Curve pools do past the last coin.
    async fn coins(&self, pool: Address, index: U256) -> RepoResult<Option<Address>>;

    /// Quotes `dx` of coin `i` for coin `j` with the pool's `get_dy`.
    ///
    /// The result is expressed in coin `j`'s native precision.
    async fn get_dy(
        &self,
        pool: Address,
        width: IndexWidth,
        i: U256,
        j: U256,
        dx: U256,
    ) -> RepoResult<U256>;

    /// Dry-runs `exchange` from `from` with `eth_call`.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(dy))` - The exchange would succeed and deliver `dy`
    /// * `Ok(None)` - The exchange would succeed but the pool returns no amount
    /// * `Err(RepositoryError::Reverted)` - The pool would revert, e.g. on `min_dy`
    #[allow(clippy::too_many_arguments)]
    async fn simulate_exchange(
        &self,
        from: Address,
        pool: Address,
        width: IndexWidth,
        i: U256,
        j: U256,
        dx: U256,
        min_dy: U256,
    ) -> RepoResult<Option<U256>>;

    /// Submits `exchange` from the custody account and waits for the receipt.
    async fn exchange(
        &self,
        pool: Address,
        width: IndexWidth,
        i: U256,
        j: U256,
        dx: U256,
        min_dy: U256,
    ) -> RepoResult<TxHash>;

    /// Retrieves the raw ERC20 balance of `owner`.
    async fn balance_of(&self, token: Address, owner: Address) -> RepoResult<U256>;

    /// Retrieves the ERC20 token balance together with decimals and symbol.
    async fn get_erc20_balance(&self, token: Address, owner: Address) -> RepoResult<TokenBalance>;

    /// Retrieves decimals and symbol for an ERC20 token.
    async fn get_token_metadata(&self, token: Address) -> RepoResult<TokenMetadata>;

    /// Approves `spender` for `amount` of `token` from the custody account.
    async fn approve(&self, token: Address, spender: Address, amount: U256) -> RepoResult<TxHash>;

    /// Transfers `amount` of `token` from the custody account to `to`.
    async fn transfer(&self, token: Address, to: Address, amount: U256) -> RepoResult<TxHash>;
}
