use std::path::PathBuf;

use clap::Parser;

/// CFx: controller framework for the overlay VPN
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "cfx")]
#[command(about = "Loads controller modules and drives the data-plane daemon")]
pub struct Args {
    /// Configuration file (JSON)
    #[arg(short = 'c', long = "config")]
    pub config_file: Option<PathBuf>,

    /// Literal JSON merged over existing configuration sections
    #[arg(short = 's', long = "config-string")]
    pub config_string: Option<String>,

    /// Write the updated configuration back to the config file
    #[arg(short = 'u', long = "update-config")]
    pub update_config: bool,

    /// Peer address file (JSON object uid -> IPv4)
    #[arg(short = 'p', long = "peers")]
    pub peer_file: Option<PathBuf>,

    /// Show the password prompt on stdout
    #[arg(long = "pwdstdout")]
    pub pwd_stdout: bool,

    /// Raise log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}
