//! Underlying asset (USDC on Base).

use alloy_sol_types::sol;

sol! {
    /// The subset of ERC-20 the vault flows touch
    #[sol(rpc)]
    interface IERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);

        /// Fired by `approve`; the watcher reads `allowance` instead of
        /// subscribing to it
        event Approval(address indexed owner, address indexed spender, uint256 value);

        function balanceOf(address holder) external view returns (uint256);

        /// Amount `spender` may still pull from `owner`
        function allowance(address owner, address spender) external view returns (uint256);

        /// Sets the allowance to exactly `value`, replacing any previous one
        function approve(address spender, uint256 value) external returns (bool);

        /// 6 for USDC
        function decimals() external view returns (uint8);
    }
}
