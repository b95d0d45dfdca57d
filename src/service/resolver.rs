//! Pool descriptor and token index resolution.
//!
//! Curve LP tokens either are the pool that knows coin indices or point at a
//! separate minter that does. Both lookups are re-run on every request: pool
//! composition is owned by the pool, not by this adapter.

use alloy::primitives::{Address, U256};
use tracing::instrument;

use crate::repository::CurveRepository;
use crate::service::{ServiceError, ServiceResult};

/// Upper bound on coins in a Curve pool; enumeration never reads past it.
pub const MAX_COINS: u64 = 8;

/// Contract that answers `coins`, `get_dy` and `exchange` for a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthoritySource {
    /// The pool reference is itself index-bearing.
    SelfPool(Address),
    /// The pool reference is an LP token whose indices live in this minter.
    DelegatedMinter(Address),
}

impl AuthoritySource {
    pub fn address(&self) -> Address {
        match self {
            AuthoritySource::SelfPool(pool) => *pool,
            AuthoritySource::DelegatedMinter(minter) => *minter,
        }
    }

    pub fn is_delegated(&self) -> bool {
        matches!(self, AuthoritySource::DelegatedMinter(_))
    }
}

/// Coin indices of a token pair inside one pool, always in widened form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenIndexPair {
    pub token_in_index: U256,
    pub token_out_index: U256,
}

/// Finds the authoritative index source of `pool` by calling its `minter()`.
///
/// Pools without a minter are their own authority. Transport failures are
/// returned as errors rather than being read as "no minter".
#[instrument(skip(repository), err)]
pub async fn resolve_authority(
    repository: &dyn CurveRepository,
    pool: Address,
) -> ServiceResult<AuthoritySource> {
    let authority = match repository.minter(pool).await? {
        Some(minter) => AuthoritySource::DelegatedMinter(minter),
        None => AuthoritySource::SelfPool(pool),
    };

    tracing::debug!("Pool {pool} index authority: {authority:?}");
    Ok(authority)
}

/// Maps `token_in` and `token_out` to their coin indices in `authority`.
///
/// Coins are enumerated in native order until the pool reverts, and the first
/// position of each token wins when a pool lists an address twice.
#[instrument(skip(repository), err)]
pub async fn resolve_indices(
    repository: &dyn CurveRepository,
    authority: Address,
    token_in: Address,
    token_out: Address,
) -> ServiceResult<TokenIndexPair> {
    let mut token_in_index = None;
    let mut token_out_index = None;

    for i in 0..MAX_COINS {
        let index = U256::from(i);
        let Some(coin) = repository.coins(authority, index).await? else {
            break;
        };

        if coin == token_in && token_in_index.is_none() {
            token_in_index = Some(index);
        }
        if coin == token_out && token_out_index.is_none() {
            token_out_index = Some(index);
        }
        if token_in_index.is_some() && token_out_index.is_some() {
            break;
        }
    }

    let token_in_index =
        token_in_index.ok_or_else(|| ServiceError::UnknownTokenIn(token_in.to_string()))?;
    let token_out_index =
        token_out_index.ok_or_else(|| ServiceError::UnknownTokenOut(token_out.to_string()))?;

    Ok(TokenIndexPair {
        token_in_index,
        token_out_index,
    })
}
