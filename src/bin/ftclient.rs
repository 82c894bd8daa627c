//! ftclient - Entry Point

use clap::Parser;
use log::error;
use std::path::Path;
use std::process::ExitCode;
use tokio::io::AsyncWriteExt;

use ftserver::client::{ClientArgs, Delivery, Request, fetch, interpret, write_listing};
use ftserver::error::ClientError;
use ftserver::utils::logging::setup_logging;

#[tokio::main]
async fn main() -> ExitCode {
    let args = match ClientArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    setup_logging();

    match run(&args).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &ClientArgs) -> Result<ExitCode, ClientError> {
    let server_port = args.server_port()?;
    let request = args.request()?;

    if let Request::Get { filename, .. } = &request {
        if Path::new(filename).exists() {
            return Err(ClientError::LocalFileExists(filename.clone()));
        }
    }

    let reply = fetch(&args.host, server_port, &request, args.wait()).await?;
    let origin = format!("{}:{}", args.host, server_port);

    match interpret(&request, reply) {
        Delivery::Listing(listing) => {
            write_listing(&mut std::io::stdout().lock(), &origin, &listing)?;
        }
        Delivery::NotFound => println!("{} says FILE NOT FOUND", origin),
        Delivery::File(bytes) => {
            let Request::Get { filename, .. } = &request else {
                return Ok(ExitCode::FAILURE);
            };
            println!("Receiving {} from {}", filename, origin);
            save(filename, &bytes).await?;
            println!("File transfer complete");
        }
        Delivery::Rejected(message) => {
            println!("{}", message);
            return Ok(ExitCode::FAILURE);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Writes a received file into the current directory, never replacing one
async fn save(filename: &str, bytes: &[u8]) -> Result<(), ClientError> {
    let saving = |e| ClientError::SaveFailed(filename.to_string(), e);

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(filename)
        .await
        .map_err(saving)?;
    file.write_all(bytes).await.map_err(saving)?;
    file.flush().await.map_err(saving)?;
    Ok(())
}
