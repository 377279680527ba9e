/*
[INPUT]:  CLI arguments, optional YAML configuration, .env, OS shutdown signals
[OUTPUT]: Logged market data streams or account listings
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, subcommands, or shutdown handling
*/

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tradestation_adapter::stream::market_data::DEFAULT_MAX_DEPTH_LEVELS;
use tradestation_adapter::{
    BarStreamParams, BarUnit, Environment, MarketDataStream, SessionTemplate, TradestationClient,
};
use tradestation_stream_cli::{CliConfig, CredentialOverrides};

#[derive(Parser, Debug)]
#[command(name = "tradestation-stream", version, about = "TradeStation market data streaming client")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    /// Use the simulator environment
    #[arg(long = "sim")]
    sim: bool,
    #[arg(long = "client-id", env = "TS_CLIENT_ID", hide_env_values = true)]
    client_id: Option<String>,
    #[arg(long = "client-secret", env = "TS_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,
    #[arg(long = "refresh-token", env = "TS_REFRESH_TOKEN", hide_env_values = true)]
    refresh_token: Option<String>,
    #[arg(long = "access-token", env = "TS_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream quotes for up to 100 symbols
    Quotes {
        #[arg(required = true, num_args = 1..)]
        symbols: Vec<String>,
    },
    /// Stream bars for one symbol
    Bars {
        symbol: String,
        #[arg(long, default_value_t = 1)]
        interval: u32,
        #[arg(long, default_value = "Daily", value_parser = parse_bar_unit)]
        unit: BarUnit,
        #[arg(long)]
        barsback: Option<u32>,
        #[arg(long = "session-template", value_parser = parse_session_template)]
        session_template: Option<SessionTemplate>,
    },
    /// Stream Level II market depth for one symbol
    Depth {
        symbol: String,
        #[arg(long = "max-levels", default_value_t = DEFAULT_MAX_DEPTH_LEVELS)]
        max_levels: u32,
    },
    /// List brokerage accounts
    Accounts,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env must be loaded before clap reads env-backed flags
    let dotenv_path = dotenvy::dotenv().ok();
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    if let Some(path) = dotenv_path {
        info!(path = %path.display(), "loaded .env");
    }

    let config = load_config(&args)?;
    info!(environment = ?config.environment, "configuration loaded");

    let tokens = config.token_provider()?;
    let client = TradestationClient::new(config.client_config(), tokens)
        .context("create tradestation client")?
        .with_stream_config(config.stream_config());

    match args.command {
        Command::Accounts => print_accounts(&client).await,
        command => run_stream(&client, command).await,
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn load_config(args: &Cli) -> Result<CliConfig> {
    let mut config = match &args.config_path {
        Some(path) => {
            let path_str = path
                .to_str()
                .context("config path must be valid utf-8")?;
            CliConfig::from_file(path_str).context("load config")?
        }
        None => CliConfig::default(),
    };

    if args.sim {
        config.environment = Environment::Sim;
    }
    config.apply_overrides(CredentialOverrides {
        client_id: args.client_id.clone(),
        client_secret: args.client_secret.clone(),
        refresh_token: args.refresh_token.clone(),
        access_token: args.access_token.clone(),
    });
    Ok(config)
}

async fn print_accounts(client: &TradestationClient) -> Result<()> {
    let accounts = client
        .brokerage()
        .get_accounts()
        .await
        .context("fetch accounts")?;
    info!(count = accounts.len(), "accounts fetched");

    println!("{}", serde_json::to_string_pretty(&accounts)?);
    Ok(())
}

async fn run_stream(client: &TradestationClient, command: Command) -> Result<()> {
    let stream = client.market_data_stream();
    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());
    bridge_shutdown(shutdown, &stream);

    match command {
        Command::Quotes { symbols } => stream
            .stream_quotes(&symbols, None)
            .await
            .context("quote stream")?,
        Command::Bars {
            symbol,
            interval,
            unit,
            barsback,
            session_template,
        } => {
            let mut params = BarStreamParams::new(symbol)
                .with_interval(interval)
                .with_unit(unit);
            params.barsback = barsback;
            params.session_template = session_template;
            stream.stream_bars(&params, None).await.context("bar stream")?
        }
        Command::Depth { symbol, max_levels } => stream
            .stream_market_depth_quotes(&symbol, Some(max_levels), None)
            .await
            .context("market depth stream")?,
        Command::Accounts => return Err(anyhow!("accounts is not a stream command")),
    }

    info!("stream finished");
    Ok(())
}

/// Forward the process shutdown signal to the stream's stop handle
fn bridge_shutdown(shutdown: CancellationToken, stream: &MarketDataStream) {
    let stop = stream.stop_handle();
    tokio::spawn(async move {
        shutdown.cancelled().await;
        info!("stopping stream");
        stop.stop();
    });
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}

fn parse_bar_unit(value: &str) -> Result<BarUnit, String> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| format!("unknown bar unit '{value}' (Minute, Daily, Weekly, Monthly)"))
}

fn parse_session_template(value: &str) -> Result<SessionTemplate, String> {
    serde_json::from_value(serde_json::Value::String(value.to_string())).map_err(|_| {
        format!("unknown session template '{value}' (USEQPre, USEQPost, USEQPreAndPost, USEQ24Hour, Default)")
    })
}
