use balance::{AmountCodec, ContractReader, TotalDebtCache};
use clap::Parser;
use orchestrator::{
    check_balances, check_total_debt,
    config::Config,
    init_tracing,
    metrics::{install_prometheus_exporter, Metrics},
};
use rust_decimal::prelude::ToPrimitive;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "orchestrator")]
#[command(about = "Monitor vault balances and export them as Prometheus metrics")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    info!("Starting Orchestrator");

    let config = Config::from_file(&cli.config)?;
    let network = config.network_config();

    info!("Loaded config:");
    info!("  RPC URL: {}", config.rpc_url);
    info!("  USDC: {}", network.usdc);
    info!("  Vault: {}", network.vault);
    info!("  Owner: {}", config.owner_address);

    install_prometheus_exporter(config.metrics_port)?;
    info!(port = config.metrics_port, "Prometheus exporter listening");
    let metrics = Metrics::new();

    let provider = client::create_provider(&config.rpc_url).await?;
    client::ensure_chain_id(&provider, network.chain_id).await?;

    let reader = ContractReader::new(provider, network.usdc, network.vault);
    let codec = AmountCodec::new(network.decimals);
    let total_debt = TotalDebtCache::new(reader.clone(), config.timing.total_debt_ttl());

    info!("Starting monitoring loop...");
    let mut interval = time::interval(Duration::from_secs(config.monitor_interval_secs));

    loop {
        interval.tick().await;
        let started = Instant::now();

        let balances = match check_balances(&reader, config.owner_address, &codec).await {
            Ok(balances) => {
                info!(
                    underlying = %balances.underlying,
                    vault = %balances.vault,
                    native_wei = %balances.native_wei,
                    "Owner balances"
                );
                metrics.set_balances(
                    balances.underlying.to_f64().unwrap_or_default(),
                    balances.vault.to_f64().unwrap_or_default(),
                );
                metrics.set_native_balance(
                    u128::try_from(balances.native_wei).unwrap_or(u128::MAX) as f64,
                );
                true
            }
            Err(e) => {
                error!("Failed to query owner balances: {}", e);
                false
            }
        };

        let debt = match check_total_debt(&total_debt, &codec).await {
            Ok(value) => {
                info!(total_debt = %value, "Vault total debt");
                metrics.set_total_debt(value.to_f64().unwrap_or_default());
                true
            }
            Err(e) => {
                error!("Failed to query vault total debt: {}", e);
                false
            }
        };

        metrics.record_cycle(balances && debt, started.elapsed());
    }
}
