//! Supervisor
//!
//! Owns the control listener for the lifetime of the process and hands every
//! accepted connection to its own `Session`.

use log::{error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use crate::error::SetupError;
use crate::server::config::ServerConfig;
use crate::server::shutdown::Shutdown;
use crate::session::{Session, SessionOutcome, SessionReport};
use crate::transfer;

const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

pub struct Server {
    listener: TcpListener,
    config: Arc<ServerConfig>,
    session_slots: Arc<Semaphore>,
}

impl Server {
    /// Binds the control port. The listener is kept until the server stops.
    pub async fn bind(port: u16, config: ServerConfig) -> Result<Self, SetupError> {
        config.validate()?;

        let root = config.root_path();
        if !root.is_dir() {
            return Err(SetupError::Config(format!(
                "root_dir {} is not a directory",
                root.display()
            )));
        }

        let listener =
            transfer::listen(config.bind_host.as_deref(), port, config.listen_backlog).await?;

        Ok(Self {
            listener,
            session_slots: Arc::new(Semaphore::new(config.max_concurrent_sessions)),
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts and serves clients until `shutdown` fires.
    ///
    /// No new connection is accepted after shutdown; sessions already running
    /// are cancelled at their next blocking step and awaited before this
    /// returns. Only a listener that keeps failing is an error.
    pub async fn run(self, mut shutdown: Shutdown) -> Result<(), SetupError> {
        info!(
            "Serving {} on {} (max {} concurrent sessions)",
            self.config.root_path().display(),
            self.local_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|_| "unknown address".to_string()),
            self.config.max_concurrent_sessions
        );

        let mut sessions: JoinSet<SessionReport> = JoinSet::new();
        let mut accept_failures = 0u32;

        let result = loop {
            let slot = tokio::select! {
                biased;
                _ = shutdown.triggered() => break Ok(()),
                Some(finished) = sessions.join_next() => {
                    log_finished(finished);
                    continue;
                }
                slot = Arc::clone(&self.session_slots).acquire_owned() => slot,
            };
            // The semaphore is never closed
            let Ok(slot) = slot else {
                break Ok(());
            };

            let accepted = tokio::select! {
                biased;
                _ = shutdown.triggered() => break Ok(()),
                accepted = transfer::accept(&self.listener) => accepted,
            };

            match accepted {
                Ok((control, peer)) => {
                    accept_failures = 0;
                    let session =
                        Session::new(control, peer, Arc::clone(&self.config), shutdown.clone());
                    info!("Connection from {}", session.peer().host);

                    sessions.spawn(async move {
                        let report = session.run().await;
                        drop(slot);
                        report
                    });
                }
                Err(e) => {
                    accept_failures += 1;
                    error!(
                        "{} ({}/{} consecutive failures)",
                        e, accept_failures, self.config.max_accept_failures
                    );
                    if accept_failures >= self.config.max_accept_failures {
                        break Err(SetupError::ListenerFailed(io::Error::other(e.to_string())));
                    }
                    drop(slot);
                    tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                }
            }
        };

        if !sessions.is_empty() {
            info!("Waiting for {} session(s) to finish", sessions.len());
        }
        while let Some(finished) = sessions.join_next().await {
            log_finished(finished);
        }

        info!("Server on {} stopped accepting", self.config.root_path().display());
        result
    }
}

fn log_finished(finished: Result<SessionReport, JoinError>) {
    match finished {
        Ok(report) => match report.outcome {
            SessionOutcome::Failed(_) | SessionOutcome::Cancelled => {
                warn!("Session {} ended: {}", report.peer.addr, report.outcome)
            }
            _ => info!("Session {} ended: {}", report.peer.addr, report.outcome),
        },
        Err(e) => error!("Session task did not complete: {}", e),
    }
}
