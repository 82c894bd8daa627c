//! ftserver - Entry Point
//!
//! Serves the working directory (or `root_dir`) to ftclient.

use clap::{CommandFactory, Parser};
use clap::error::ErrorKind;
use log::{info, warn};
use std::process::ExitCode;

use ftserver::error::FtServerError;
use ftserver::error::handlers::{error_to_exit_code, handle_fatal};
use ftserver::server::{self, Server, ServerConfig};
use ftserver::utils::cli::Cli;
use ftserver::utils::logging::setup_logging;
use ftserver::utils::validation::validate_control_port;

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) => {
            match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    let _ = e.print();
                }
                _ => eprintln!("{}", Cli::command().render_usage()),
            }
            return ExitCode::SUCCESS;
        }
    };

    setup_logging();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            handle_fatal(&e);
            ExitCode::from(error_to_exit_code(&e))
        }
    }
}

async fn run(args: Cli) -> Result<(), FtServerError> {
    let port = validate_control_port(&args.port)?;
    let config = ServerConfig::load(args.config.as_deref())?;

    info!("Launching file transfer server...");
    let server = Server::bind(port, config).await?;
    info!("Server control connection open on port {}", port);

    let (trigger, shutdown) = server::shutdown::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("SIGINT received, finishing current sessions");
                trigger.trigger();
            }
            Err(e) => warn!("Cannot listen for SIGINT: {}", e),
        }
    });

    server.run(shutdown).await?;
    info!("Server shut down");
    Ok(())
}
