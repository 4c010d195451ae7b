//! stocksim-launch - start the simulator and open the dashboard
//!
//! Equivalent of double-clicking a "start" script: banner, short pause,
//! browser pointed at http://127.0.0.1:8000/, server in the foreground.

use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use stocksim_server::launcher::{self, LaunchOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for stocksim-launch
#[derive(Parser, Debug)]
#[command(name = "stocksim-launch")]
#[command(about = "Start the stock simulator and open it in the browser")]
#[command(version)]
struct Args {
    /// Address the server binds and the browser opens
    #[arg(long, default_value = stocksim_common::config::DEFAULT_HOST)]
    host: String,

    /// Port the server binds and the browser opens
    #[arg(short, long, default_value_t = stocksim_common::config::DEFAULT_PORT)]
    port: u16,

    /// Seconds to wait before opening the browser
    #[arg(long, default_value_t = 2)]
    delay_secs: u64,

    /// Do not open a browser
    #[arg(long)]
    no_browser: bool,

    /// Server command to run instead of the bundled stocksim-server
    #[arg(last = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stocksim_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let status = launcher::run(LaunchOptions {
        host: args.host,
        port: args.port,
        delay: Duration::from_secs(args.delay_secs),
        open_browser: !args.no_browser,
        command: args.command,
    })
    .await?;

    std::process::exit(status.code().unwrap_or(1));
}
