use crate::{ChainQuery, ChainReader};
use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use binding::{token::IERC20, vault::IVault};
use eyre::Result;
use tracing::debug;

/// [`ChainReader`] backed by an alloy provider.
#[derive(Debug, Clone)]
pub struct ContractReader<P> {
    provider: P,
    token: Address,
    vault: Address,
}

impl<P> ContractReader<P>
where
    P: Provider + Clone,
{
    pub const fn new(provider: P, token: Address, vault: Address) -> Self {
        Self {
            provider,
            token,
            vault,
        }
    }

    pub const fn token(&self) -> Address {
        self.token
    }

    pub const fn vault(&self) -> Address {
        self.vault
    }

    async fn query_token_balance(&self, owner: Address) -> Result<U256> {
        debug!(token = %self.token, owner = %owner, "Querying underlying balance");

        let contract = IERC20::new(self.token, &self.provider);
        Ok(contract.balanceOf(owner).call().await?)
    }

    async fn query_vault_balance(&self, owner: Address) -> Result<U256> {
        debug!(vault = %self.vault, owner = %owner, "Querying vault balance");

        let contract = IVault::new(self.vault, &self.provider);
        Ok(contract.balanceOf(owner).call().await?)
    }

    async fn query_allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        debug!(token = %self.token, owner = %owner, spender = %spender, "Querying allowance");

        let contract = IERC20::new(self.token, &self.provider);
        Ok(contract.allowance(owner, spender).call().await?)
    }

    async fn query_native(&self, owner: Address) -> Result<U256> {
        debug!(owner = %owner, "Querying native balance");

        Ok(self.provider.get_balance(owner).await?)
    }

    async fn query_preview_withdraw(&self, assets: U256) -> Result<U256> {
        debug!(vault = %self.vault, assets = %assets, "Querying previewWithdraw");

        let contract = IVault::new(self.vault, &self.provider);
        Ok(contract.previewWithdraw(assets).call().await?)
    }

    async fn query_total_debt(&self) -> Result<U256> {
        debug!(vault = %self.vault, "Querying totalDebt");

        let contract = IVault::new(self.vault, &self.provider);
        Ok(contract.totalDebt().call().await?)
    }
}

impl<P> ChainReader for ContractReader<P>
where
    P: Provider + Clone,
{
    async fn query(&self, query: ChainQuery) -> Result<U256> {
        match query {
            ChainQuery::UnderlyingBalance { owner } => self.query_token_balance(owner).await,
            ChainQuery::VaultBalance { owner } => self.query_vault_balance(owner).await,
            ChainQuery::Allowance { owner, spender } => self.query_allowance(owner, spender).await,
            ChainQuery::NativeBalance { owner } => self.query_native(owner).await,
            ChainQuery::PreviewWithdraw { assets } => self.query_preview_withdraw(assets).await,
            ChainQuery::TotalDebt => self.query_total_debt().await,
        }
    }
}
