//! Command-line configuration of a node.

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use crate::storage::types::BILLION;

#[derive(Parser, Debug, Clone)]
#[command(name = "bitmap-node")]
#[command(about = "Bit-packed rolling presence caches with peer anti-entropy")]
#[command(long_about = None)]
pub struct NodeConfig {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:12321")]
    pub bind: SocketAddr,

    /// Address peers should connect back to (defaults to the bind address)
    #[arg(long, value_name = "ADDR")]
    pub advertise: Option<String>,

    /// Peer to pull state from at startup (repeatable)
    #[arg(long = "peer", value_name = "ADDR")]
    pub peers: Vec<String>,

    /// Cache capacity in units of 2^30 ids
    #[arg(long, default_value_t = 5)]
    pub billions: u64,

    /// Seconds to wait after startup before pulling from peers
    #[arg(long, default_value_t = 3)]
    pub sync_delay_secs: u64,

    /// Seconds between cache stats reports, 0 disables them
    #[arg(long, default_value_t = 60)]
    pub stats_interval_secs: u64,

    /// Log level, overridden by RUST_LOG
    #[arg(short = 'v', long, default_value = "info")]
    pub log_level: String,
}

impl NodeConfig {
    /// Number of ids every cache holds.
    pub fn capacity(&self) -> u64 {
        self.billions.saturating_mul(BILLION)
    }

    pub fn advertise_address(&self) -> String {
        self.advertise
            .clone()
            .unwrap_or_else(|| self.bind.to_string())
    }

    pub fn sync_delay(&self) -> Duration {
        Duration::from_secs(self.sync_delay_secs)
    }

    pub fn stats_interval(&self) -> Option<Duration> {
        (self.stats_interval_secs > 0).then(|| Duration::from_secs(self.stats_interval_secs))
    }
}
