use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "device-state-gateway", version, about)]
pub struct Cli {
    /// Path to the YAML config file.
    #[arg(short, long, env = "CONFIG_PATH", default_value = "config.yaml")]
    pub config: PathBuf,

    /// Initialise the configured devices and exit.
    #[arg(long)]
    pub init_only: bool,
}
