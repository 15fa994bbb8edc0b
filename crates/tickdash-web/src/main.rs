mod error;
mod handlers;
mod server;

use std::net::{IpAddr, SocketAddr};
use std::process::ExitCode;

use clap::Parser;
use tickdash_core::DashboardConfig;
use tracing::error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::handlers::AppState;

/// Browser dashboard for tickdash.
#[derive(Debug, Parser)]
#[command(name = "tickdash-web", version, about = "Serve the tickdash dashboard over HTTP")]
struct Args {
    /// Address to bind.
    #[arg(long, env = "TICKDASH_HOST", default_value = "127.0.0.1")]
    host: IpAddr,

    /// Port to bind.
    #[arg(long, env = "TICKDASH_PORT", default_value_t = 8050)]
    port: u16,

    /// Serve deterministic synthetic data instead of calling Yahoo Finance.
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Fetch timeout in milliseconds (overrides TICKDASH_TIMEOUT_MS).
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    let mut config = match DashboardConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "invalid configuration");
            return ExitCode::from(2);
        }
    };
    if args.offline {
        config = config.with_offline(true);
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config = config.with_timeout_ms(timeout_ms);
    }

    let addr = SocketAddr::new(args.host, args.port);
    match server::serve(addr, AppState::from_config(config)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%addr, %err, "server failed");
            ExitCode::from(10)
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tickdash_web=info,tickdash_core=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
