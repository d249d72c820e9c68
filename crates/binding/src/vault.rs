//! Vault contract bindings.
//!
//! The vault takes the underlying asset in and mints shares to the receiver.
//! Share balances use the same 6 decimals as the underlying asset.

use alloy_sol_types::sol;

sol! {
    /// Custodial vault (deposit-bearing, share-issuing)
    #[sol(rpc)]
    interface IVault {
        /// Deposit `assets` of the underlying token, minting shares to `receiver`
        function deposit(uint256 _assets, address _receiver) external returns (uint256);

        /// Withdraw `assets` to `receiver`, burning at most `maxShares` from `owner`
        function withdraw(
            uint256 _assets,
            address _receiver,
            address _owner,
            uint256 _maxShares
        ) external returns (uint256);

        /// Share balance of an account
        function balanceOf(address account) external view returns (uint256);

        /// Shares that would be burned to withdraw `assets` right now
        function previewWithdraw(uint256 _assets) external view returns (uint256);

        /// Aggregate amount deposited into the vault
        function totalDebt() external view returns (uint256);

        /// Underlying asset address
        function asset() external view returns (address);
    }
}
