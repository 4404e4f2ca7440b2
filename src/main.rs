//! Triangular arbitrage coordinator entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use triarb::api::{create_router, AppState};
use triarb::arbitrage::{RouteDispatcher, ScanCoordinator, StatsAggregator};
use triarb::config::Config;
use triarb::exchange::{AdapterHandle, ExchangeRegistry, SimulatedExchange};
use triarb::metrics;
use triarb::trading::{CurrencyInput, PositionSizer, SizingResult};
use triarb::utils::shutdown_signal;

/// Multi-exchange triangular arbitrage coordinator.
#[derive(Parser, Debug)]
#[command(name = "triarb")]
#[command(about = "Scan exchanges for triangular arbitrage and size the resulting trades")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the scan loop against simulated exchanges (default).
    Simulate {
        /// HTTP server port for health/metrics.
        #[arg(short, long)]
        port: Option<u16>,

        /// Run a single scan round and exit.
        #[arg(long)]
        once: bool,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Size a trade for a balance.
    Size {
        /// Available balance in the base currency.
        balance: Decimal,

        /// Trading pair ("BTCZAR") or comma-separated path ("USDT,BTC,ETH,USDT").
        target: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("triarb=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(),
        Some(Command::Size { balance, target }) => cmd_size(balance, &target),
        Some(Command::Simulate { port, once }) => cmd_simulate(port, once).await,
        None => cmd_simulate(None, false).await,
    }
}

/// Load and validate configuration.
fn load_config() -> anyhow::Result<Config> {
    Config::load_validated().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e.into()
    })
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("TRIARB - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Scan Timeout: {}ms", config.scan_timeout_ms);
    println!("  Scan Interval: {}ms", config.scan_interval_ms);
    println!("  Profit Threshold: {}%", config.profit_threshold);
    println!("  Portfolio Percent: {}%", config.portfolio_percent);
    println!("  Max Trade Amount: {}", config.max_trade_amount);
    if config.disabled_exchanges.is_empty() {
        println!("  Disabled Exchanges: none");
    } else {
        println!("  Disabled Exchanges: {}", config.disabled_exchanges.join(", "));
    }
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Size a single trade and print the decision.
fn cmd_size(balance: Decimal, target: &str) -> anyhow::Result<()> {
    let config = load_config()?;
    let sizer = PositionSizer::from_config(&config);

    let path: Vec<String> = target
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    let input = if path.len() > 1 {
        CurrencyInput::Path(&path)
    } else {
        CurrencyInput::Symbol(target)
    };

    let result = sizer.size_for(balance, input);
    print_sizing(&result);
    Ok(())
}

fn print_sizing(result: &SizingResult) {
    let b = &result.breakdown;
    println!("======================================================================");
    println!("TRIARB - POSITION SIZE");
    println!("======================================================================");
    println!("  Currency: {}", b.currency);
    println!("  Balance: {}", b.balance);
    println!("  Portfolio: {}% = {}", b.portfolio_percent, b.portfolio_amount.round_dp(2));
    println!("  Max Trade: {}", b.max_trade_amount);
    println!("  Applied Cap: {}", b.applied_cap);
    println!("----------------------------------------------------------------------");
    println!("  Amount: {}", result.amount.round_dp(2));
    println!("  Can Trade: {}", result.can_trade);
    if let Some(warning) = &result.warning {
        println!("  Warning: {}", warning);
    }
    if let Some(reason) = &result.reason {
        println!("  Reason: {}", reason);
    }
    println!("======================================================================");
}

/// Wire simulated exchanges into the registry.
fn simulated_registry(config: &Config) -> ExchangeRegistry {
    let threshold = config.profit_threshold;
    let registry = ExchangeRegistry::new();

    registry.register(
        "binance",
        Some(AdapterHandle::with_stats(
            SimulatedExchange::builder("binance")
                .latency_ms(40)
                .profit_threshold(threshold)
                .cycle(&["USDT", "BTC", "ETH"], dec!(0.82))
                .cycle(&["USDT", "ETH", "BNB"], dec!(0.12))
                .cycle(&["USDT", "BNB", "BTC"], dec!(-0.31))
                .build(),
        )),
    );
    registry.register(
        "valr",
        Some(AdapterHandle::with_stats(
            SimulatedExchange::builder("valr")
                .latency_ms(60)
                .profit_threshold(threshold)
                .cycle(&["ZAR", "BTC", "USDT"], dec!(1.05))
                .cycle(&["ZAR", "ETH", "BTC"], dec!(0.44))
                .build(),
        )),
    );
    registry.register(
        "luno",
        Some(AdapterHandle::basic(
            SimulatedExchange::builder("luno")
                .latency_ms(25)
                .failing_scan()
                .build(),
        )),
    );
    registry.register("kraken", None);

    registry
}

/// Run the scan loop against simulated exchanges.
async fn cmd_simulate(port_override: Option<u16>, once: bool) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let config = load_config()?;
    let port = port_override.unwrap_or(config.port);

    info!("Configuration loaded successfully");
    info!("Scan timeout: {}ms", config.scan_timeout_ms);
    info!("Portfolio percent: {}%", config.portfolio_percent);
    info!("Max trade amount: {}", config.max_trade_amount);

    // Initialize metrics
    let prometheus = match metrics::install_prometheus() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Prometheus recorder unavailable: {}", e);
            None
        }
    };

    // Build the registry once every adapter exists, then initialize it
    let registry = Arc::new(simulated_registry(&config));
    registry.initialize(&config.disabled_exchanges);

    let coordinator = ScanCoordinator::new(registry.clone(), config.scan_timeout());
    let dispatcher = RouteDispatcher::new(registry.clone());
    let sizer = PositionSizer::from_config(&config);

    // Create app state
    let app_state = AppState::new(StatsAggregator::new(registry.clone()), prometheus.clone());

    // Start HTTP server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    let router = create_router(app_state.clone());
    let _server_handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    });

    info!("========================================");
    info!("TRIANGULAR ARBITRAGE SCANNER STARTED");
    info!("========================================");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut round = 0u64;

    loop {
        round += 1;
        let report = coordinator.scan_all(config.show_activity).await;

        info!(
            "[Round #{}] {} opportunities ({} profitable, {} exchanges failed) in {}ms",
            round,
            report.opportunities.len(),
            report.profitable_count,
            report.failed_adapters(),
            report.elapsed_ms
        );

        if let Some(best) = report.best_profitable() {
            let result = sizer.size_for(config.sim_balance, best.path.currencies());
            info!(
                exchange = %best.exchange,
                path = %best.path,
                net_profit_percent = %best.net_profit_percent,
                amount = %result.amount,
                can_trade = result.can_trade,
                "Best opportunity sized"
            );
            if let Some(warning) = &result.warning {
                warn!("{}", warning);
            }

            if result.can_trade {
                match dispatcher
                    .route_calculate_profit(best.exchange.as_str(), &best.path, result.amount)
                    .await
                {
                    Ok(quote) => info!(
                        start = %quote.start_amount,
                        end = %quote.end_amount,
                        profit = %quote.net_profit(),
                        "Quoted best opportunity"
                    ),
                    Err(e) => warn!("Quote failed: {}", e),
                }
            }
        }

        app_state.publish_scan(report).await;
        if let Some(handle) = &prometheus {
            handle.run_upkeep();
        }

        if once {
            break;
        }

        tokio::select! {
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(config.scan_interval()) => {}
        }
    }

    info!("Scanner stopped after {} rounds", round);
    Ok(())
}
