use std::path::PathBuf;

use clap::Parser;

/// Forwarding HTTP proxy.
#[derive(Debug, Parser)]
#[command(name = "courier", version)]
pub struct Cli {
    /// Port to listen on (1-65535)
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,

    /// YAML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}
