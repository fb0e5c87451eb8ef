pub mod toml_config;

pub use toml_config::SyncConfig;

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "shipment-sync")]
#[command(about = "Reconcile carrier shipment notifications against store orders")]
pub struct CliConfig {
    /// Shipment attachment file (mail parser JSON or CSV)
    #[arg(short, long)]
    pub input: String,

    /// Path to TOML configuration file
    #[arg(short, long, default_value = "sync-config.toml")]
    pub config: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    /// Decode and resolve every shipment without calling the store APIs
    #[arg(long)]
    pub dry_run: bool,
}
