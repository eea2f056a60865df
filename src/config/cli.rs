use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "isdv4-pad")]
#[command(about = "Bring up an ISDV4 serial tablet and print its pen and touch events")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Serial device the tablet is attached to
    #[arg(long, env = "ISDV4_DEVICE")]
    pub device: Option<PathBuf>,

    /// Line speed (19200 or 38400)
    #[arg(long)]
    pub baud_rate: Option<u32>,

    /// Device name, used to recognise WACf ids before querying
    #[arg(long)]
    pub name: Option<String>,

    /// Drop touch packets
    #[arg(long)]
    pub no_touch: bool,

    /// Path to config file
    #[arg(long, env = "ISDV4_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Query the tablet, print its ranges and exit
    Query,
    /// Print raw bytes as they arrive alongside the decoded events
    Dump,
}
