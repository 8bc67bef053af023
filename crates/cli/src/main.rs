use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gatebridge_api::AppConfig;
use gatebridge_core::*;
use gatebridge_exchange_gate::GateExchange;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "gatebridge")]
#[command(about = "REST facade over the Gate.io spot and wallet API")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// TOML config file with [server], [gate] and [rate_limit] sections
    #[arg(short, long, env = "GATEBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Server {
        /// Bind address (overrides the config file)
        #[arg(short, long, env = "BIND_ADDR")]
        bind: Option<String>,

        /// Exchange base URL including /api/v4
        #[arg(long, env = "GATE_HOST")]
        gate_host: Option<String>,

        /// Fallback API key for requests without credentials
        #[arg(long, env = "GATE_KEY", hide_env_values = true)]
        gate_key: Option<String>,

        /// Fallback API secret for requests without credentials
        #[arg(long, env = "GATE_SECRET", hide_env_values = true)]
        gate_secret: Option<String>,

        /// Fallback proxy URL for exchange requests
        #[arg(long, env = "PROXY_URL")]
        proxy: Option<String>,

        /// Candlestick requests allowed per second
        #[arg(long)]
        candlesticks_per_second: Option<u32>,
    },

    /// Normalize a saved exchange payload and print it as JSON
    Parse {
        /// Shape of the payload
        #[arg(value_enum)]
        kind: PayloadKind,

        /// JSON file holding the raw payload
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PayloadKind {
    Tickers,
    OrderBook,
    Candlesticks,
    TotalBalance,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Server {
            bind,
            gate_host,
            gate_key,
            gate_secret,
            proxy,
            candlesticks_per_second,
        } => {
            let mut config = match &cli.config {
                Some(path) => AppConfig::load(path)
                    .with_context(|| format!("Loading {}", path.display()))?,
                None => AppConfig::default(),
            };
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(host) = gate_host {
                config.gate.host = host;
            }
            if gate_key.is_some() {
                config.gate.key = gate_key;
            }
            if gate_secret.is_some() {
                config.gate.secret = gate_secret;
            }
            if proxy.is_some() {
                config.gate.proxy = proxy;
            }
            if let Some(n) = candlesticks_per_second {
                config.rate_limit.candlesticks_per_second = n;
            }

            tracing::info!(
                bind = %config.server.bind,
                host = %config.gate.host,
                fallback_credentials = config.gate.credentials().is_some(),
                candlesticks_per_second = config.rate_limit.candlesticks_per_second,
                "Starting gatebridge"
            );

            let exchange = GateExchange::new(config.gate.clone())?;
            gatebridge_api::start_server(config, Arc::new(exchange)).await?;
        }
        Commands::Parse { kind, file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Reading {}", file.display()))?;
            let payload: serde_json::Value =
                serde_json::from_str(&raw).context("Payload is not valid JSON")?;
            println!("{}", normalize(kind, payload)?);
        }
    }

    Ok(())
}

fn normalize(kind: PayloadKind, payload: serde_json::Value) -> Result<String> {
    let rendered = match kind {
        PayloadKind::Tickers => {
            serde_json::to_string_pretty(&ParseTickers::new(payload).parse()?)?
        }
        PayloadKind::OrderBook => {
            serde_json::to_string_pretty(&ParseOrderBook::new(payload).parse()?)?
        }
        PayloadKind::Candlesticks => {
            serde_json::to_string_pretty(&ParseCandlesticks::new(payload).parse()?)?
        }
        PayloadKind::TotalBalance => {
            serde_json::to_string_pretty(&ParseTotalBalance::new(payload).parse()?)?
        }
    };
    Ok(rendered)
}
