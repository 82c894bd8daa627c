//! Module `handler`
//!
//! Drives one control connection through the protocol:
//! read command → dispatch → connect back to the client → transfer → close.

use log::{debug, info, warn};
use std::sync::Arc;
use tokio::net::TcpStream;

use crate::error::SessionError;
use crate::error::handlers::report_session_error;
use crate::protocol::{
    Command, FILE_NOT_FOUND_REPLY, INVALID_COMMAND_REPLY, oversized_message, parse_message,
};
use crate::server::ServerConfig;
use crate::server::shutdown::Shutdown;
use crate::session::state::{SessionOutcome, SessionReport, SessionState};
use crate::storage::{FileLookup, list_directory, read_file};
use crate::transfer::{self, PeerIdentity, ReadOutcome};

/// Longest slice of an invalid command echoed to the log
const LOGGED_COMMAND_CHARS: usize = 80;

/// One accepted control connection and everything needed to serve it.
pub struct Session {
    control: TcpStream,
    peer: PeerIdentity,
    config: Arc<ServerConfig>,
    shutdown: Shutdown,
}

impl Session {
    pub fn new(
        control: TcpStream,
        peer: PeerIdentity,
        config: Arc<ServerConfig>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            control,
            peer,
            config,
            shutdown,
        }
    }

    pub fn peer(&self) -> &PeerIdentity {
        &self.peer
    }

    /// Runs the session to completion.
    ///
    /// Failures never escape: they end the session and are reported to the
    /// operator. Both connections are closed before this returns, the data
    /// connection first.
    pub async fn run(mut self) -> SessionReport {
        let mut command = None;
        let mut state = SessionState::AwaitingCommand;

        let outcome = loop {
            debug!("Session {}: {}", self.peer.addr, state.name());

            state = match state {
                SessionState::AwaitingCommand => self.await_command().await,
                SessionState::Dispatching(parsed) => {
                    command = Some(parsed.clone());
                    self.dispatch(parsed).await
                }
                SessionState::AwaitingDataConnection { payload, data_port } => {
                    self.open_data_connection(payload, data_port).await
                }
                SessionState::Transferring {
                    data,
                    payload,
                    data_port,
                } => self.send_payload(data, payload, &data_port).await,
                SessionState::Closed(outcome) => break outcome,
            };
        };

        if let SessionOutcome::Failed(e) = &outcome {
            report_session_error(&self.peer.addr, e);
        }

        transfer::close(self.control, "control").await;

        SessionReport {
            peer: self.peer,
            command,
            outcome,
        }
    }

    async fn await_command(&mut self) -> SessionState {
        let limits = self.config.read_limits();

        match self
            .shutdown
            .guard(transfer::read_message(&mut self.control, &limits))
            .await
        {
            None => SessionState::Closed(SessionOutcome::Cancelled),
            Some(Ok(ReadOutcome::Message(bytes))) => {
                SessionState::Dispatching(parse_message(&bytes))
            }
            Some(Ok(ReadOutcome::Oversized(prefix))) => {
                warn!(
                    "Client {} sent more than {} bytes without ending the command",
                    self.peer.host, limits.max_len
                );
                SessionState::Dispatching(oversized_message(&prefix))
            }
            Some(Ok(ReadOutcome::Closed)) => {
                info!("Client {} disconnected without a command", self.peer.host);
                SessionState::Closed(SessionOutcome::PeerClosed)
            }
            Some(Err(e)) => SessionState::Closed(SessionOutcome::Failed(SessionError::Read(e))),
        }
    }

    async fn dispatch(&mut self, command: Command) -> SessionState {
        let root = self.config.root_path();
        let limit = self.config.max_payload_bytes;

        match command {
            Command::Invalid { raw_text } => {
                let shown: String = raw_text.chars().take(LOGGED_COMMAND_CHARS).collect();
                info!("Client {} sent invalid command {:?}", self.peer.host, shown);
                self.reply_invalid().await
            }
            Command::ListDirectory { data_port } => {
                info!(
                    "List directory requested by {} on port {}",
                    self.peer.host, data_port
                );
                match list_directory(&root, limit).await {
                    Ok(payload) => SessionState::AwaitingDataConnection { payload, data_port },
                    Err(e) => SessionState::Closed(SessionOutcome::Failed(e.into())),
                }
            }
            Command::GetFile {
                filename,
                data_port,
            } => {
                info!(
                    "File {:?} requested by {} on port {}",
                    filename, self.peer.host, data_port
                );
                match read_file(&root, &filename, limit).await {
                    Ok(FileLookup::Found(payload)) => {
                        SessionState::AwaitingDataConnection { payload, data_port }
                    }
                    Ok(FileLookup::NotFound) => {
                        info!(
                            "File {:?} not found, sending notice to {}:{}",
                            filename, self.peer.host, data_port
                        );
                        SessionState::AwaitingDataConnection {
                            payload: FILE_NOT_FOUND_REPLY.as_bytes().to_vec(),
                            data_port,
                        }
                    }
                    Err(e) => SessionState::Closed(SessionOutcome::Failed(e.into())),
                }
            }
        }
    }

    /// Invalid commands are answered on the control connection; no data
    /// connection is opened.
    async fn reply_invalid(&mut self) -> SessionState {
        let timeout = self.config.write_timeout();
        let reply = INVALID_COMMAND_REPLY.as_bytes();
        let sent = self
            .shutdown
            .guard(transfer::write_all(&mut self.control, reply, timeout))
            .await;

        match sent {
            None => SessionState::Closed(SessionOutcome::Cancelled),
            Some(Ok(())) => SessionState::Closed(SessionOutcome::RejectedInvalid),
            Some(Err(e)) => SessionState::Closed(SessionOutcome::Failed(SessionError::Reply(e))),
        }
    }

    async fn open_data_connection(&mut self, payload: Vec<u8>, data_port: String) -> SessionState {
        let timeout = self.config.connect_timeout();
        let connected = self
            .shutdown
            .guard(transfer::connect_to(&self.peer.host, &data_port, timeout))
            .await;

        match connected {
            None => SessionState::Closed(SessionOutcome::Cancelled),
            Some(Ok(data)) => SessionState::Transferring {
                data,
                payload,
                data_port,
            },
            Some(Err(e)) => {
                SessionState::Closed(SessionOutcome::Failed(SessionError::DataConnection(e)))
            }
        }
    }

    async fn send_payload(
        &mut self,
        mut data: TcpStream,
        payload: Vec<u8>,
        data_port: &str,
    ) -> SessionState {
        let timeout = self.config.write_timeout();
        let sent = self
            .shutdown
            .guard(transfer::write_all(&mut data, &payload, timeout))
            .await;

        // Closed whether or not the write went through
        transfer::close(data, "data").await;

        match sent {
            None => SessionState::Closed(SessionOutcome::Cancelled),
            Some(Ok(())) => {
                info!(
                    "Sent {} bytes to {}:{}",
                    payload.len(),
                    self.peer.host,
                    data_port
                );
                SessionState::Closed(SessionOutcome::Transferred {
                    bytes: payload.len(),
                })
            }
            Some(Err(e)) => SessionState::Closed(SessionOutcome::Failed(SessionError::Transfer(e))),
        }
    }
}
