//! Server command line

use clap::Parser;
use std::path::PathBuf;

/// Serves one directory to ftclient over a control and a data connection
#[derive(Parser, Debug)]
#[command(name = "ftserver", version, about, long_about = None)]
pub struct Cli {
    /// Control port to listen on (1024-65535)
    pub port: String,

    /// Configuration file; `config.toml` in the working directory is used if present
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
