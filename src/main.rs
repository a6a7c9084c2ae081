//! Liquidity Scout - price impact estimator for concentrated-liquidity pools
//!
//! Run with: cargo run -- --steps
//!
//! Walks a pool's ticks upward from the current price, spending a target
//! amount of the quote token, and reports how far the price moves.

use clap::Parser;
use color_eyre::eyre::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use liquidity_scout::cartographer::{PoolSnapshot, RpcPoolStateProvider};
use liquidity_scout::config::Config;
use liquidity_scout::report;
use liquidity_scout::simulator::TickWalker;

#[derive(Parser, Debug)]
#[command(version, about = "Estimate the price impact of a buy on a concentrated-liquidity pool")]
struct Args {
    /// Load settings from a TOML file instead of the environment
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the settings in effect to a TOML file
    #[arg(long)]
    save_config: Option<PathBuf>,

    #[arg(long)]
    rpc_url: Option<String>,

    #[arg(long)]
    pool: Option<String>,

    /// Quote-token amount to spend
    #[arg(long)]
    amount: Option<f64>,

    /// Fractional slippage bound (0.002 = 0.2%)
    #[arg(long)]
    max_slippage: Option<f64>,

    #[arg(long)]
    max_ticks: Option<usize>,

    /// Upcoming ticks to read concurrently
    #[arg(long)]
    prefetch: Option<usize>,

    /// Print every tick range walked
    #[arg(long)]
    steps: bool,

    /// Write the full analysis as JSON to this file ("-" for stdout only)
    #[arg(long)]
    json: Option<PathBuf>,
}

impl Args {
    /// JSON goes to stdout, so the console report must stay off it
    fn json_to_stdout(&self) -> bool {
        self.json.as_deref().is_some_and(|path| path.as_os_str() == "-")
    }

    fn apply(&self, config: &mut Config) {
        if let Some(rpc_url) = &self.rpc_url {
            config.rpc_url = rpc_url.clone();
        }
        if let Some(pool) = &self.pool {
            config.pool_address = pool.clone();
        }
        if let Some(amount) = self.amount {
            config.trade_amount = amount;
        }
        if let Some(max_slippage) = self.max_slippage {
            config.max_slippage = max_slippage;
        }
        if let Some(max_ticks) = self.max_ticks {
            config.max_ticks = max_ticks;
        }
        if let Some(prefetch) = self.prefetch {
            config.tick_prefetch = prefetch;
        }
    }
}

fn walk_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]") {
        spinner.set_style(template);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("liquidity_scout=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let console_report = !args.json_to_stdout();

    if console_report {
        report::print_banner();
    }

    // Load configuration
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    args.apply(&mut config);

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        error!("Please check your .env file or command-line flags");
        return Err(e);
    }

    if console_report {
        config.print_summary();
        println!();
    }

    if let Some(path) = &args.save_config {
        config.save_to_file(path)?;
        info!("Configuration written to {}", path.display());
    }

    // =============================================
    // POOL SNAPSHOT
    // =============================================
    let pool = config.pool()?;
    let provider = RpcPoolStateProvider::new(config.rpc_url.clone(), pool);

    let start = Instant::now();
    let snapshot = PoolSnapshot::capture(&provider, provider.pool(), &config.fallbacks()).await?;
    info!("Pool snapshot captured in {:?}", start.elapsed());

    let gas_price = match provider.gas_price().await {
        Ok(wei) => Some(wei),
        Err(e) => {
            warn!("Could not read gas price: {}", e);
            None
        }
    };
    let block_number = match provider.block_number().await {
        Ok(block) => Some(block),
        Err(e) => {
            warn!("Could not read block number: {}", e);
            None
        }
    };

    if console_report {
        report::print_pool_state(&snapshot, gas_price, block_number, &config.native_symbol);
    }

    // =============================================
    // TICK WALK
    // =============================================
    let spinner = walk_spinner();
    spinner.set_message(format!(
        "Walking ticks to fill {:.2} {}...",
        config.trade_amount, snapshot.symbol1
    ));

    let start = Instant::now();
    let result = TickWalker::new(&provider, &snapshot, config.trade_target())
        .with_prefetch(config.tick_prefetch)
        .run()
        .await;
    spinner.finish_and_clear();
    let analysis = result?;

    if console_report {
        println!(
            "{} Walked {} ticks in {:?}",
            style("✓").green(),
            analysis.ticks_crossed(),
            start.elapsed()
        );
        println!();

        if args.steps {
            report::print_steps(&analysis, &snapshot);
        }
        report::print_results(&analysis, &snapshot);
    } else {
        info!("Walked {} ticks in {:?}", analysis.ticks_crossed(), start.elapsed());
    }

    if let Some(path) = &args.json {
        let json = serde_json::to_string_pretty(&analysis)?;
        if args.json_to_stdout() {
            println!("{}", json);
        } else {
            std::fs::write(path, json)?;
            info!("Analysis written to {}", path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let args = Args::parse_from([
            "liquidity-scout",
            "--amount",
            "2500",
            "--max-slippage",
            "0.01",
            "--prefetch",
            "4",
            "--steps",
        ]);
        let mut config = Config::default();
        args.apply(&mut config);

        assert!(args.steps);
        assert_eq!(config.trade_amount, 2500.0);
        assert_eq!(config.max_slippage, 0.01);
        assert_eq!(config.tick_prefetch, 4);
        assert_eq!(config.max_ticks, Config::default().max_ticks);
    }

    #[test]
    fn test_json_to_stdout_only_for_dash() {
        assert!(Args::parse_from(["liquidity-scout", "--json", "-"]).json_to_stdout());
        assert!(!Args::parse_from(["liquidity-scout", "--json", "out.json"]).json_to_stdout());
        assert!(!Args::parse_from(["liquidity-scout"]).json_to_stdout());
    }

    #[test]
    fn test_cli_defaults_leave_config_untouched() {
        let args = Args::parse_from(["liquidity-scout"]);
        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config, Config::default());
    }
}
