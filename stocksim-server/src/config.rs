//! stocksim-server runtime configuration
//!
//! Command-line flags (and their environment variables) override values
//! from `config.toml`, which override compiled defaults.

use crate::market::{FixedPriceSource, PriceSource, Watchlist, YahooFinanceClient, YahooSettings};
use crate::monitor::MonitorSettings;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use stocksim_common::config::{MarketSection, MarketSourceKind, TomlConfig};
use stocksim_common::{Error, Result};

/// Command-line arguments for stocksim-server
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "stocksim-server")]
#[command(about = "Stock tracking simulator: live quotes, simulated buys and movement alerts")]
#[command(version)]
pub struct Args {
    /// Address to bind
    #[arg(long, env = "STOCKSIM_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "STOCKSIM_PORT")]
    pub port: Option<u16>,

    /// Config file (overrides STOCKSIM_CONFIG and the platform default)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, env = "STOCKSIM_DATABASE")]
    pub database: Option<PathBuf>,

    /// Keep all state in memory; nothing survives a restart
    #[arg(long)]
    pub ephemeral: bool,

    /// Price source: yahoo or fixed
    #[arg(long, env = "STOCKSIM_SOURCE")]
    pub source: Option<MarketSourceKind>,

    /// Seconds between monitor scans
    #[arg(long)]
    pub interval_secs: Option<u64>,
}

/// Where positions are journaled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    File(PathBuf),
    Memory,
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub storage: Storage,
    pub market: MarketSection,
    pub monitor: MonitorSettings,
}

impl Config {
    /// Merge CLI overrides onto a loaded config file
    pub fn resolve(file: TomlConfig, args: &Args) -> Result<Self> {
        let mut market = file.market;
        if let Some(source) = args.source {
            market.source = source;
        }

        let interval_seconds = args.interval_secs.unwrap_or(file.monitor.interval_seconds);
        if interval_seconds == 0 {
            return Err(Error::Config("--interval-secs must be at least 1".to_string()));
        }

        let storage = if args.ephemeral {
            Storage::Memory
        } else {
            Storage::File(
                args.database
                    .clone()
                    .unwrap_or_else(|| file.storage.database_path()),
            )
        };

        Ok(Self {
            host: args.host.clone().unwrap_or(file.server.host),
            port: args.port.unwrap_or(file.server.port),
            storage,
            market,
            monitor: MonitorSettings {
                interval: Duration::from_secs(interval_seconds),
                threshold_percent: file.monitor.threshold_percent,
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn watchlist(&self) -> Watchlist {
        Watchlist::new(&self.market.watchlist)
    }

    /// Build the configured price source
    pub fn price_source(&self) -> Result<Arc<dyn PriceSource>> {
        match self.market.source {
            MarketSourceKind::Yahoo => {
                let client = YahooFinanceClient::new(YahooSettings {
                    base_url: self.market.base_url.clone(),
                    timeout: Duration::from_secs(self.market.request_timeout_secs),
                    min_request_interval: Duration::from_millis(self.market.min_request_interval_ms),
                })
                .map_err(|e| Error::Config(format!("Cannot build HTTP client: {}", e)))?;
                Ok(Arc::new(client))
            }
            MarketSourceKind::Fixed => Ok(Arc::new(FixedPriceSource::from_prices(
                self.market
                    .fixed_prices
                    .iter()
                    .map(|(symbol, price)| (symbol.as_str(), *price)),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_launcher_contract() {
        let config = Config::resolve(TomlConfig::default(), &Args::default()).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:8000");
        assert_eq!(config.monitor.interval, Duration::from_secs(5));
        assert_eq!(config.monitor.threshold_percent, 5.0);
        assert!(matches!(config.storage, Storage::File(_)));
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = TomlConfig::parse("[server]\nport = 9000\nhost = \"0.0.0.0\"\n").unwrap();
        let args = Args {
            port: Some(8123),
            ephemeral: true,
            source: Some(MarketSourceKind::Fixed),
            interval_secs: Some(2),
            ..Args::default()
        };
        let config = Config::resolve(file, &args).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:8123");
        assert_eq!(config.storage, Storage::Memory);
        assert_eq!(config.market.source, MarketSourceKind::Fixed);
        assert_eq!(config.monitor.interval, Duration::from_secs(2));
    }

    #[test]
    fn test_zero_interval_override_rejected() {
        let args = Args {
            interval_secs: Some(0),
            ..Args::default()
        };
        assert!(Config::resolve(TomlConfig::default(), &args).is_err());
    }

    #[test]
    fn test_database_flag_wins() {
        let args = Args {
            database: Some(PathBuf::from("/tmp/other.db")),
            ..Args::default()
        };
        let config = Config::resolve(TomlConfig::default(), &args).unwrap();
        assert_eq!(config.storage, Storage::File(PathBuf::from("/tmp/other.db")));
    }

    #[tokio::test]
    async fn test_fixed_source_uses_configured_prices() {
        let file = TomlConfig::parse(
            "[market]\nsource = \"fixed\"\n[market.fixed_prices]\n\"TCS.NS\" = 3400.0\n",
        )
        .unwrap();
        let config = Config::resolve(file, &Args::default()).unwrap();
        let source = config.price_source().unwrap();
        assert_eq!(source.name(), "fixed");
        assert_eq!(source.latest_price("tcs.ns").await.unwrap(), 3400.0);
    }
}
