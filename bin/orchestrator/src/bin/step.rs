//! CLI tool to run individual orchestrator actions.
//!
//! - `deposit <amount>`: approve if needed, then deposit into the vault
//! - `withdraw <amount>`: withdraw from the vault
//! - `balances`: print the owner's balances
//! - `total-debt`: print the vault's aggregate deposits

use action::{ActionKind, ContractWriter, ProgressState};
use balance::{AmountCodec, ContractReader, TotalDebtCache};
use clap::{Parser, Subcommand};
use orchestrator::{
    check_balances, check_total_debt, config::Config, init_tracing, ActionOrchestrator,
    ActionReport,
};
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "step")]
#[command(about = "Run individual orchestrator actions")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Deposit USDC into the vault, approving it first if needed
    Deposit {
        /// Amount in USDC, e.g. 1.5
        amount: Decimal,

        /// Private key for signing transactions (hex string, with or without 0x prefix)
        #[arg(short = 'k', long, env = "PRIVATE_KEY", hide_env_values = true)]
        private_key: String,
    },

    /// Withdraw USDC from the vault
    Withdraw {
        /// Amount in USDC, e.g. 1.5
        amount: Decimal,

        /// Private key for signing transactions (hex string, with or without 0x prefix)
        #[arg(short = 'k', long, env = "PRIVATE_KEY", hide_env_values = true)]
        private_key: String,
    },

    /// Print the owner's balances
    Balances,

    /// Print the vault's aggregate deposits
    TotalDebt,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = Config::from_file(&cli.config)?;
    let network = config.network_config();

    info!("Loaded config:");
    info!("  Chain ID: {}", network.chain_id);
    info!("  USDC: {}", network.usdc);
    info!("  Vault: {}", network.vault);
    info!("  Owner: {}", config.owner_address);

    let codec = AmountCodec::new(network.decimals);

    match cli.command {
        Command::Deposit {
            amount,
            private_key,
        } => {
            info!("Running: deposit {amount}");
            run_action(&config, &private_key, ActionKind::Deposit, amount).await?;
        }
        Command::Withdraw {
            amount,
            private_key,
        } => {
            info!("Running: withdraw {amount}");
            run_action(&config, &private_key, ActionKind::Withdraw, amount).await?;
        }
        Command::Balances => {
            let provider = client::create_provider(&config.rpc_url).await?;
            client::ensure_chain_id(&provider, network.chain_id).await?;
            let reader = ContractReader::new(provider, network.usdc, network.vault);

            let balances = check_balances(&reader, config.owner_address, &codec).await?;
            info!("✓ Balances of {}:", balances.owner);
            info!("  USDC: {}", balances.underlying);
            info!("  Vault: {}", balances.vault);
            info!("  Native: {} wei", balances.native_wei);
        }
        Command::TotalDebt => {
            let provider = client::create_provider(&config.rpc_url).await?;
            client::ensure_chain_id(&provider, network.chain_id).await?;
            let reader = ContractReader::new(provider, network.usdc, network.vault);
            let cache = TotalDebtCache::new(reader, config.timing.total_debt_ttl());

            let total_debt = check_total_debt(&cache, &codec).await?;
            info!("✓ Vault total debt: {} USDC", total_debt);
        }
    }

    Ok(())
}

async fn run_action(
    config: &Config,
    private_key: &str,
    kind: ActionKind,
    amount: Decimal,
) -> eyre::Result<()> {
    let network = config.network_config();
    let owner = client::signer_address(private_key)?;
    if owner != config.owner_address {
        warn!(
            signer = %owner,
            configured = %config.owner_address,
            "Signer differs from the configured owner; acting as the signer"
        );
    }

    let provider = client::create_wallet_provider(&config.rpc_url, private_key)?;
    client::ensure_chain_id(&provider, network.chain_id).await?;

    let reader = ContractReader::new(provider.clone(), network.usdc, network.vault);
    let writer = ContractWriter::new(provider);
    let orchestrator = ActionOrchestrator::new(writer, reader, owner, network, &config.timing);

    let logger = tokio::spawn(log_progress(orchestrator.progress(kind)));
    let report = run(&orchestrator, kind, amount).await;
    logger.abort();

    match report {
        ActionReport::Success(published) => {
            let codec = orchestrator.codec();
            info!("✓ {kind} completed");
            info!("  USDC: {}", codec.decode(published.snapshot.underlying_balance)?);
            info!("  Vault: {}", codec.decode(published.snapshot.vault_balance)?);
            Ok(())
        }
        ActionReport::Failed(failure) => {
            eyre::bail!("{kind} failed ({}): {}", failure.category, failure.message)
        }
        ActionReport::Busy => eyre::bail!("{kind} already in progress"),
    }
}

async fn run<W, R>(
    orchestrator: &ActionOrchestrator<W, R>,
    kind: ActionKind,
    amount: Decimal,
) -> ActionReport
where
    W: action::ChainWriter,
    R: balance::ChainReader + Clone,
{
    match kind {
        ActionKind::Withdraw => orchestrator.withdraw(amount).await,
        ActionKind::Approve | ActionKind::Deposit => orchestrator.deposit(amount).await,
    }
}

async fn log_progress(mut progress: watch::Receiver<ProgressState>) {
    while progress.changed().await.is_ok() {
        let state = progress.borrow_and_update().clone();
        if state.countdown_seconds > 0 {
            debug!(phase = state.phase.as_str(), countdown = state.countdown_seconds, "{}", state.message);
        } else {
            info!(phase = state.phase.as_str(), "{}", state.message);
        }
    }
}
