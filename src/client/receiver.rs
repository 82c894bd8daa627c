//! Client side of one exchange
//!
//! The data listener is bound before the command goes out, so the server's
//! connect-back can never arrive early.

use log::{debug, info};
use std::io;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

use crate::client::request::{Reply, Request};
use crate::error::{ClientError, ConnectorError};
use crate::transfer;

/// How long the data connection may lag behind the server closing control
const DATA_GRACE: Duration = Duration::from_secs(2);
const CHUNK_SIZE: usize = 64 * 1024;

/// Sends `request` to `host:server_port` and collects the reply.
///
/// `wait` bounds each step: connecting, waiting for the server to answer, and
/// every read on the data connection.
pub async fn fetch(
    host: &str,
    server_port: u16,
    request: &Request,
    wait: Duration,
) -> Result<Reply, ClientError> {
    let listener = transfer::listen(None, request.data_port(), 1)
        .await
        .map_err(ClientError::DataListener)?;

    let mut control = transfer::connect_to(host, &server_port.to_string(), wait)
        .await
        .map_err(ClientError::Control)?;
    info!("Connected to {}:{}", host, server_port);

    transfer::write_all(&mut control, request.command_line().as_bytes(), wait)
        .await
        .map_err(ClientError::Control)?;
    debug!("Sent {:?}", request.command_line().trim_end());

    let mut data = tokio::select! {
        biased;
        accepted = transfer::accept(&listener) => accepted.map_err(ClientError::Data)?.0,
        answer = read_until_closed(&mut control) => {
            let answer = answer.map_err(|e| ClientError::Control(ConnectorError::Read(e)))?;
            if !answer.is_empty() {
                return Ok(Reply::Rejected(String::from_utf8_lossy(&answer).into_owned()));
            }
            // The server closes control last; a data connection may still be queued
            match timeout(DATA_GRACE, transfer::accept(&listener)).await {
                Ok(accepted) => accepted.map_err(ClientError::Data)?.0,
                Err(_) => return Err(ClientError::NoDataConnection),
            }
        }
        _ = sleep(wait) => {
            return Err(ClientError::Data(ConnectorError::Timeout("waiting for the server")));
        }
    };

    let payload = receive_all(&mut data, wait).await.map_err(ClientError::Data)?;
    info!("Received {} bytes on port {}", payload.len(), request.data_port());

    transfer::close(data, "data").await;
    transfer::close(control, "control").await;
    Ok(Reply::Data(payload))
}

async fn read_until_closed(control: &mut TcpStream) -> io::Result<Vec<u8>> {
    let mut answer = Vec::new();
    control.read_to_end(&mut answer).await?;
    Ok(answer)
}

/// Reads until the server closes the data connection
async fn receive_all(data: &mut TcpStream, wait: Duration) -> Result<Vec<u8>, ConnectorError> {
    let mut payload = Vec::new();
    let mut chunk = vec![0u8; CHUNK_SIZE];

    loop {
        let read = timeout(wait, data.read(&mut chunk))
            .await
            .map_err(|_| ConnectorError::Timeout("data transfer"))?
            .map_err(ConnectorError::Read)?;
        if read == 0 {
            return Ok(payload);
        }
        payload.extend_from_slice(&chunk[..read]);
    }
}
