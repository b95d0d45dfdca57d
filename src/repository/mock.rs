//! In-memory Curve pool host used by the swapper tests.
//!
//! Pools price every coin against a common peg with a fixed rate and fee, which
//! is enough to reproduce the quoting, custody and revert behaviour the
//! swapper relies on without a chain.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;

use super::{
    CurveRepository, IndexWidth, RepoResult, RepositoryError, TokenBalance, TokenMetadata,
};

const BPS: u64 = 10_000;
const NORMALIZED_DECIMALS: u8 = 18;

// Polygon addresses reused so fixtures read like the live tests
pub(crate) const AM3CRV: &str = "0xE7a24EF0C5e95Ffb0f6684b813A78F2a3AD7D171";
pub(crate) const AAVE_POOL: &str = "0x445FE580eF8d70FF569aB36e80c647af338db351";
pub(crate) const AM_DAI: &str = "0x27F8D03b3a2196956ED754baDc28D73be8830A6e";
pub(crate) const AM_USDC: &str = "0x1a13F4Ca1d028320A707D99520AbFefca3998b7F";
pub(crate) const AM_USDT: &str = "0x60D55F02A771d515e077c9C2403a1ef324885CeC";
pub(crate) const EURT_AM3CRV: &str = "0x600743B1d8A96438bD46836fD34977a00293f6Aa";
pub(crate) const EURT_POOL: &str = "0x225FB4176f0E20CDb66b4a3DF70CA3063281E855";
pub(crate) const EURT: &str = "0x7BDF330f423Ea880FF95fC41A280fD5eCFD3D09f";
pub(crate) const USDR_AM3CRV: &str = "0xa138341185a9D0429B0021A11FB717B225e13e1F";
pub(crate) const USDR: &str = "0xb5DFABd7fF7F83BAB83995E72A52B97ABb7bcf63";
pub(crate) const WRONG_TOKEN: &str = "0x00000000000000000000000000000000000000aa";
pub(crate) const ADAPTER: &str = "0x00000000000000000000000000000000000000ad";
pub(crate) const RECIPIENT: &str = "0x00000000000000000000000000000000000000bb";

pub(crate) fn addr(s: &str) -> Address {
    Address::from_str(s).expect("fixture address")
}

/// `amount` whole units of a token with `decimals` places.
pub(crate) fn units(amount: u64, decimals: u8) -> U256 {
    U256::from(amount) * U256::from(10u64).pow(U256::from(decimals))
}

#[derive(Debug, Clone)]
pub(crate) struct MockPool {
    pub coins: Vec<Address>,
    pub width: IndexWidth,
    /// Peg value of one whole unit of each coin, in basis points of 1.0.
    pub rates_bps: Vec<u64>,
    pub fee_bps: u64,
    /// Shortfall applied to executed exchanges relative to `get_dy`.
    pub execution_drift_bps: u64,
    /// Extra shortfall applied only to committed exchanges, as if the price
    /// moved between the dry run and the transaction.
    pub settlement_drift_bps: u64,
    pub paused: bool,
}

#[derive(Debug, Default)]
struct MockState {
    balances: HashMap<(Address, Address), U256>,
    allowances: HashMap<(Address, Address, Address), U256>,
    pools: HashMap<Address, MockPool>,
    transactions: u64,
    transfers_failing: bool,
}

pub(crate) struct MockCurveRepository {
    account: Option<Address>,
    tokens: HashMap<Address, TokenMetadata>,
    minters: HashMap<Address, Address>,
    rpc_down: bool,
    state: Mutex<MockState>,
}

impl MockCurveRepository {
    pub fn new(account: Option<Address>) -> Self {
        Self {
            account,
            tokens: HashMap::new(),
            minters: HashMap::new(),
            rpc_down: false,
            state: Mutex::new(MockState::default()),
        }
    }

    /// Aave 3pool behind the am3CRV LP token, the EURT wide-index meta pool behind
    /// its LP token, and the self-authoritative USDR factory pool.
    pub fn polygon_fixture() -> Self {
        let mut repo = Self::new(Some(addr(ADAPTER)));

        for (token, decimals, symbol) in [
            (AM_DAI, 18, "amDAI"),
            (AM_USDC, 6, "amUSDC"),
            (AM_USDT, 6, "amUSDT"),
            (AM3CRV, 18, "am3CRV"),
            (EURT, 6, "EURT"),
            (USDR, 9, "USDR"),
            (WRONG_TOKEN, 18, "WTOKEN"),
        ] {
            repo.add_token(addr(token), decimals, symbol);
        }

        repo.add_pool(
            addr(AAVE_POOL),
            MockPool::new(
                vec![addr(AM_DAI), addr(AM_USDC), addr(AM_USDT)],
                IndexWidth::Narrow,
                vec![10_000, 10_000, 10_000],
            ),
        );
        repo.set_minter(addr(AM3CRV), addr(AAVE_POOL));

        repo.add_pool(
            addr(EURT_POOL),
            MockPool::new(
                vec![addr(EURT), addr(AM3CRV)],
                IndexWidth::Wide,
                vec![10_800, 10_200],
            ),
        );
        repo.set_minter(addr(EURT_AM3CRV), addr(EURT_POOL));

        repo.add_pool(
            addr(USDR_AM3CRV),
            MockPool::new(
                vec![addr(USDR), addr(AM3CRV)],
                IndexWidth::Narrow,
                vec![10_000, 10_200],
            ),
        );

        repo
    }

    pub fn add_token(&mut self, token: Address, decimals: u8, symbol: &str) {
        self.tokens.insert(
            token,
            TokenMetadata {
                decimals,
                symbol: symbol.to_string(),
            },
        );
    }

    pub fn set_minter(&mut self, lp_token: Address, minter: Address) {
        self.minters.insert(lp_token, minter);
    }

    pub fn set_rpc_down(&mut self, down: bool) {
        self.rpc_down = down;
    }

    /// Registers a pool and seeds it with one million whole units of each coin.
    pub fn add_pool(&mut self, pool: Address, model: MockPool) {
        let state = self.state.get_mut().expect("mock state");
        for coin in &model.coins {
            let decimals = self.tokens.get(coin).map(|m| m.decimals).unwrap_or(18);
            state
                .balances
                .insert((*coin, pool), units(1_000_000, decimals));
        }
        state.pools.insert(pool, model);
    }

    pub fn update_pool(&self, pool: Address, update: impl FnOnce(&mut MockPool)) {
        let mut state = self.state.lock().expect("mock state");
        if let Some(model) = state.pools.get_mut(&pool) {
            update(model);
        }
    }

    /// Makes every ERC20 `transfer` revert.
    pub fn set_transfers_failing(&self, failing: bool) {
        self.state.lock().expect("mock state").transfers_failing = failing;
    }

    pub fn mint(&self, token: Address, owner: Address, amount: U256) {
        let mut state = self.state.lock().expect("mock state");
        *state.balances.entry((token, owner)).or_default() += amount;
    }

    pub fn balance(&self, token: Address, owner: Address) -> U256 {
        let state = self.state.lock().expect("mock state");
        state
            .balances
            .get(&(token, owner))
            .copied()
            .unwrap_or_default()
    }

    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        let state = self.state.lock().expect("mock state");
        state
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default()
    }

    fn decimals(&self, token: &Address) -> u8 {
        self.tokens.get(token).map(|m| m.decimals).unwrap_or(18)
    }

    fn check_rpc(&self) -> RepoResult<()> {
        if self.rpc_down {
            return Err(RepositoryError::RpcError("connection refused".to_string()));
        }
        Ok(())
    }

    fn require_account(&self) -> RepoResult<Address> {
        self.account.ok_or_else(|| {
            RepositoryError::Other("No wallet configured for transaction signing".to_string())
        })
    }

    fn next_tx(state: &mut MockState) -> TxHash {
        state.transactions += 1;
        TxHash::from(U256::from(state.transactions).to_be_bytes::<32>())
    }

    fn coin_position(model: &MockPool, index: U256) -> RepoResult<usize> {
        if index >= U256::from(model.coins.len()) {
            return Err(RepositoryError::Reverted("coin index out of range".to_string()));
        }
        Ok(index.to::<u64>() as usize)
    }

    /// Pool-side quote: normalizes `dx` to 18 decimals, converts through the peg
    /// rates, scales back to coin `j` precision and charges the fee.
    fn quote(&self, model: &MockPool, width: IndexWidth, i: U256, j: U256, dx: U256) -> RepoResult<U256> {
        if width != model.width {
            return Err(RepositoryError::Reverted(
                "function selector was not recognized".to_string(),
            ));
        }
        let (i, j) = (Self::coin_position(model, i)?, Self::coin_position(model, j)?);
        if i == j {
            return Err(RepositoryError::Reverted("same coin".to_string()));
        }

        let ten = U256::from(10u64);
        let up = ten.pow(U256::from(NORMALIZED_DECIMALS - self.decimals(&model.coins[i])));
        let down = ten.pow(U256::from(NORMALIZED_DECIMALS - self.decimals(&model.coins[j])));

        let normalized = dx * up * U256::from(model.rates_bps[i]) / U256::from(model.rates_bps[j]);
        let gross = normalized / down;
        Ok(gross * U256::from(BPS - model.fee_bps) / U256::from(BPS))
    }

    /// Runs an exchange against `state`, mutating it only when `commit` is set.
    #[allow(clippy::too_many_arguments)]
    fn execute(
        &self,
        state: &mut MockState,
        from: Address,
        pool: Address,
        width: IndexWidth,
        i: U256,
        j: U256,
        dx: U256,
        min_dy: U256,
        commit: bool,
    ) -> RepoResult<U256> {
        let model = state
            .pools
            .get(&pool)
            .cloned()
            .ok_or_else(|| RepositoryError::Reverted(format!("{pool} is not a pool")))?;
        if model.paused {
            return Err(RepositoryError::Reverted("pool is killed".to_string()));
        }

        let quoted = self.quote(&model, width, i, j, dx)?;
        let mut drift = model.execution_drift_bps;
        if commit {
            drift += model.settlement_drift_bps;
        }
        let dy = quoted * U256::from(BPS - drift) / U256::from(BPS);
        if dy < min_dy {
            return Err(RepositoryError::Reverted(
                RepositoryError::CURVE_SLIPPAGE_REASON.to_string(),
            ));
        }

        let coin_in = model.coins[Self::coin_position(&model, i)?];
        let coin_out = model.coins[Self::coin_position(&model, j)?];

        let allowance = state
            .allowances
            .get(&(coin_in, from, pool))
            .copied()
            .unwrap_or_default();
        let held = state
            .balances
            .get(&(coin_in, from))
            .copied()
            .unwrap_or_default();
        let reserve_out = state
            .balances
            .get(&(coin_out, pool))
            .copied()
            .unwrap_or_default();
        if allowance < dx || held < dx || reserve_out < dy {
            return Err(RepositoryError::Reverted("transferFrom failed".to_string()));
        }

        if commit {
            state.allowances.insert((coin_in, from, pool), allowance - dx);
            state.balances.insert((coin_in, from), held - dx);
            *state.balances.entry((coin_in, pool)).or_default() += dx;
            state.balances.insert((coin_out, pool), reserve_out - dy);
            *state.balances.entry((coin_out, from)).or_default() += dy;
        }

        Ok(dy)
    }
}

impl MockPool {
    pub fn new(coins: Vec<Address>, width: IndexWidth, rates_bps: Vec<u64>) -> Self {
        Self {
            coins,
            width,
            rates_bps,
            fee_bps: 4,
            execution_drift_bps: 0,
            settlement_drift_bps: 0,
            paused: false,
        }
    }
}

#[async_trait]
impl CurveRepository for MockCurveRepository {
    fn account(&self) -> Option<Address> {
        self.account
    }

    async fn minter(&self, pool: Address) -> RepoResult<Option<Address>> {
        self.check_rpc()?;
        Ok(self.minters.get(&pool).copied())
    }

    async fn coins(&self, pool: Address, index: U256) -> RepoResult<Option<Address>> {
        self.check_rpc()?;
        let state = self.state.lock().expect("mock state");
        let coin = state.pools.get(&pool).and_then(|model| {
            Self::coin_position(model, index)
                .ok()
                .map(|position| model.coins[position])
        });
        Ok(coin)
    }

    async fn get_dy(
        &self,
        pool: Address,
        width: IndexWidth,
        i: U256,
        j: U256,
        dx: U256,
    ) -> RepoResult<U256> {
        self.check_rpc()?;
        let model = {
            let state = self.state.lock().expect("mock state");
            state.pools.get(&pool).cloned()
        }
        .ok_or_else(|| RepositoryError::Reverted(format!("{pool} is not a pool")))?;

        self.quote(&model, width, i, j, dx)
    }

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
        self.check_rpc()?;
        let mut state = self.state.lock().expect("mock state");
        self.execute(&mut state, from, pool, width, i, j, dx, min_dy, false)
            .map(Some)
    }

    async fn exchange(
        &self,
        pool: Address,
        width: IndexWidth,
        i: U256,
        j: U256,
        dx: U256,
        min_dy: U256,
    ) -> RepoResult<TxHash> {
        self.check_rpc()?;
        let from = self.require_account()?;
        let mut state = self.state.lock().expect("mock state");
        self.execute(&mut state, from, pool, width, i, j, dx, min_dy, true)?;
        Ok(Self::next_tx(&mut state))
    }

    async fn balance_of(&self, token: Address, owner: Address) -> RepoResult<U256> {
        self.check_rpc()?;
        Ok(self.balance(token, owner))
    }

    async fn get_erc20_balance(&self, token: Address, owner: Address) -> RepoResult<TokenBalance> {
        let balance = self.balance_of(token, owner).await?;
        let TokenMetadata { decimals, symbol } = self.get_token_metadata(token).await?;
        Ok(TokenBalance {
            balance,
            decimals,
            symbol,
        })
    }

    async fn get_token_metadata(&self, token: Address) -> RepoResult<TokenMetadata> {
        self.check_rpc()?;
        self.tokens
            .get(&token)
            .cloned()
            .ok_or_else(|| RepositoryError::ContractError(format!("{token} is not an ERC20")))
    }

    async fn approve(&self, token: Address, spender: Address, amount: U256) -> RepoResult<TxHash> {
        self.check_rpc()?;
        let from = self.require_account()?;
        let mut state = self.state.lock().expect("mock state");
        state.allowances.insert((token, from, spender), amount);
        Ok(Self::next_tx(&mut state))
    }

    async fn transfer(&self, token: Address, to: Address, amount: U256) -> RepoResult<TxHash> {
        self.check_rpc()?;
        let from = self.require_account()?;
        let mut state = self.state.lock().expect("mock state");
        if state.transfers_failing {
            return Err(RepositoryError::Reverted("transfer paused".to_string()));
        }
        let held = state
            .balances
            .get(&(token, from))
            .copied()
            .unwrap_or_default();
        if held < amount {
            return Err(RepositoryError::Reverted(
                "transfer amount exceeds balance".to_string(),
            ));
        }
        state.balances.insert((token, from), held - amount);
        *state.balances.entry((token, to)).or_default() += amount;
        Ok(Self::next_tx(&mut state))
    }
}
