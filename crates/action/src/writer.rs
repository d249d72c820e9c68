use crate::{CallError, ChainWriter, ReceiptSummary, VaultCall};
use alloy_primitives::TxHash;
use alloy_provider::{PendingTransactionBuilder, Provider};
use binding::{token::IERC20, vault::IVault};
use tracing::{debug, info};

/// Sends vault calls through a wallet-backed provider.
#[derive(Debug, Clone)]
pub struct ContractWriter<P> {
    provider: P,
}

impl<P: Provider + Clone> ContractWriter<P> {
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P> ChainWriter for ContractWriter<P>
where
    P: Provider + Clone,
{
    async fn send(&self, call: &VaultCall) -> Result<TxHash, CallError> {
        debug!(kind = %call.kind(), ?call, "Sending transaction");

        let pending = match *call {
            VaultCall::Approve {
                token,
                spender,
                amount,
            } => {
                IERC20::new(token, &self.provider)
                    .approve(spender, amount)
                    .send()
                    .await?
            }
            VaultCall::Deposit {
                vault,
                assets,
                receiver,
            } => {
                IVault::new(vault, &self.provider)
                    .deposit(assets, receiver)
                    .send()
                    .await?
            }
            VaultCall::Withdraw {
                vault,
                assets,
                receiver,
                owner,
                max_shares,
            } => {
                IVault::new(vault, &self.provider)
                    .withdraw(assets, receiver, owner, max_shares)
                    .send()
                    .await?
            }
        };

        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<ReceiptSummary, CallError> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx_hash)
            .get_receipt()
            .await?;

        info!(
            tx_hash = %receipt.transaction_hash,
            block_number = receipt.block_number,
            gas_used = receipt.gas_used,
            status = receipt.status(),
            "Receipt received."
        );

        if !receipt.status() {
            return Err(CallError::Reverted { reason: None });
        }

        Ok(ReceiptSummary {
            tx_hash: Some(receipt.transaction_hash),
            block_number: receipt.block_number,
            gas_used: Some(receipt.gas_used),
        })
    }
}
