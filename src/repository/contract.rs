use alloy::sol;

// Contract ABI definitions for the Curve pool family and its ERC20 coins
sol! {
    /// ERC20 token standard interface.
    ///
    /// Balance and metadata views plus the two state-changing calls the swapper
    /// needs to hand custody to a pool and forward proceeds.
    #[sol(rpc)]
    interface IERC20 {
        /// Returns the token balance of the specified account.
        ///
        /// # Arguments
        /// * `account` - The address to query the balance of
        ///
        /// # Returns
        /// The balance in the token's smallest unit (considering decimals)
        function balanceOf(address account) external view returns (uint256);

        /// Returns the number of decimals used by the token.
        ///
        /// # Returns
        /// The number of decimals (e.g., 18 for amDAI, 6 for amUSDC/amUSDT)
        function decimals() external view returns (uint8);

        /// Returns the token symbol.
        function symbol() external view returns (string memory);

        /// Grants `spender` the right to pull up to `amount` tokens from the caller.
        function approve(address spender, uint256 amount) external returns (bool);

        /// Moves `amount` tokens from the caller to `to`.
        function transfer(address to, uint256 amount) external returns (bool);
    }

    /// Curve LP token interface.
    ///
    /// Older Curve deployments split the LP token from the pool contract; the
    /// LP token then points at the pool through `minter()`. Newer pools are
    /// their own LP token and do not expose this function.
    #[sol(rpc)]
    interface ICurveLpToken {
        /// Returns the pool contract allowed to mint this LP token.
        function minter() external view returns (address);
    }

    /// Coin enumeration shared by every Curve pool variant.
    #[sol(rpc)]
    interface ICurveCoins {
        /// Returns the coin at position `i`, reverting past the last coin.
        function coins(uint256 i) external view returns (address);
    }

    /// Curve pools indexed with `int128` (the classic StableSwap templates).
    #[sol(rpc)]
    interface ICurvePool128 {
        /// Quotes `dx` of coin `i` for coin `j`, result in coin `j` precision.
        function get_dy(int128 i, int128 j, uint256 dx) external view returns (uint256);

        /// Swaps `dx` of coin `i` for at least `min_dy` of coin `j`.
        ///
        /// Reverts with "Exchange resulted in fewer coins than expected" when the
        /// bound is not met.
        function exchange(int128 i, int128 j, uint256 dx, uint256 min_dy) external returns (uint256);
    }

    /// Curve pools indexed with `uint256` (factory and crypto pool templates).
    #[sol(rpc)]
    interface ICurvePool256 {
        /// Quotes `dx` of coin `i` for coin `j`, result in coin `j` precision.
        function get_dy(uint256 i, uint256 j, uint256 dx) external view returns (uint256);

        /// Swaps `dx` of coin `i` for at least `min_dy` of coin `j`.
        function exchange(uint256 i, uint256 j, uint256 dx, uint256 min_dy) external returns (uint256);
    }
}
