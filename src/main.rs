use clap::Parser;
use event_backtest::cli::{Cli, Commands};
use event_backtest::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
            eprintln!("Using default configuration");
            toml::from_str(include_str!("../config.toml.example"))?
        }
    };

    // Initialize telemetry
    let _telemetry = event_backtest::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Backtest(args) => {
            tracing::info!("Starting backtest");
            args.execute(&config).await?;
        }
        Commands::Replay(args) => {
            tracing::info!(heartbeat_ms = args.heartbeat_ms, "Starting paced replay");
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Instruments: {}", config.backtest.instruments.join(", "));
            println!(
                "  Capital: {} (periods/year {}, snapshot {:?})",
                config.backtest.initial_capital,
                config.backtest.periods_per_year,
                config.backtest.snapshot
            );
            println!("  Data: {:?} {:?}", config.data.format, config.data.path);
            println!(
                "  Strategy: {:?} strength={}",
                config.strategy.kind, config.strategy.strength
            );
            println!(
                "  Execution: venue={} commission=max({}, qty x {})",
                config.execution.venue,
                config.execution.commission_minimum,
                config.execution.commission_rate
            );
            println!(
                "  Telemetry: level={} format={:?} metrics_port={:?}",
                config.telemetry.log_level,
                config.telemetry.log_format,
                config.telemetry.metrics_port
            );
        }
    }

    Ok(())
}
