//! Module `connector`
//!
//! Socket primitives used by the server and the client: binding the control
//! listener, accepting, connecting back to a client's data port, reading one
//! command message and writing a full buffer. Nothing here knows the protocol.

use log::{debug, info, warn};
use std::io::{self, ErrorKind};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream, lookup_host};
use tokio::time::timeout;

use crate::error::{ConnectorError, SetupError};

const READ_CHUNK_SIZE: usize = 4096;

/// Who is on the other end of an accepted control connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerIdentity {
    pub addr: SocketAddr,
    /// Host the data connection is opened to.
    pub host: String,
}

impl PeerIdentity {
    /// IPv4 clients accepted on a dual-stack socket show up as mapped IPv6
    /// addresses; connect back to them over IPv4.
    pub fn from_addr(addr: SocketAddr) -> Self {
        Self {
            addr,
            host: addr.ip().to_canonical().to_string(),
        }
    }
}

/// Limits applied while reading one command message.
#[derive(Debug, Clone, Copy)]
pub struct ReadLimits {
    pub max_len: usize,
    /// How long to wait for the first byte.
    pub first_byte_timeout: Duration,
    /// How long the peer may pause once it has started sending.
    pub idle_timeout: Duration,
}

/// Result of reading one command message.
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    Message(Vec<u8>),
    /// The peer closed without sending anything.
    Closed,
    /// More than `max_len` bytes arrived before the message ended.
    Oversized(Vec<u8>),
}

/// Binds and listens on `port`.
///
/// With no host, the IPv6 wildcard is tried first (dual-stack on most systems)
/// and the IPv4 wildcard second. The first address that binds wins.
pub async fn listen(
    bind_host: Option<&str>,
    port: u16,
    backlog: u32,
) -> Result<TcpListener, SetupError> {
    let target = match bind_host {
        Some(host) => format!("{}:{}", host, port),
        None => format!("port {}", port),
    };

    let candidates: Vec<SocketAddr> = match bind_host {
        Some(host) => lookup_host((host, port))
            .await
            .map_err(|e| SetupError::Bind(target.clone(), e))?
            .collect(),
        None => vec![
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, port)),
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
        ],
    };

    let mut last_error = io::Error::new(ErrorKind::AddrNotAvailable, "no address to bind");

    for addr in candidates {
        match bind_socket(addr) {
            Ok(socket) => {
                let listener = socket
                    .listen(backlog)
                    .map_err(|e| SetupError::Listen(addr, e))?;
                info!("Control listener bound to {}", addr);
                return Ok(listener);
            }
            Err(e) => {
                warn!("Cannot bind {}: {}", addr, e);
                last_error = e;
            }
        }
    }

    Err(SetupError::Bind(target, last_error))
}

fn bind_socket(addr: SocketAddr) -> io::Result<TcpSocket> {
    let socket = if addr.is_ipv6() {
        TcpSocket::new_v6()?
    } else {
        TcpSocket::new_v4()?
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    Ok(socket)
}

/// Waits for the next control connection.
pub async fn accept(listener: &TcpListener) -> Result<(TcpStream, PeerIdentity), ConnectorError> {
    let (stream, addr) = listener.accept().await.map_err(ConnectorError::Accept)?;
    Ok((stream, PeerIdentity::from_addr(addr)))
}

/// Connects to `host:port`, trying every resolved address in turn.
///
/// The port arrives as text straight from the client; a non-numeric or zero
/// port is a resolution failure. `limit` bounds the lookup and each address
/// attempt separately, so one unresponsive address cannot starve the rest.
pub async fn connect_to(
    host: &str,
    port: &str,
    limit: Duration,
) -> Result<TcpStream, ConnectorError> {
    let target = format!("{}:{}", host, port);

    let port: u16 = match port.parse() {
        Ok(port) if port != 0 => port,
        _ => {
            return Err(ConnectorError::Resolution {
                target,
                reason: "invalid port number".into(),
            });
        }
    };

    let resolution_failed = |reason: String| ConnectorError::Resolution {
        target: target.clone(),
        reason,
    };
    let addrs: Vec<SocketAddr> = timeout(limit, lookup_host((host, port)))
        .await
        .map_err(|_| resolution_failed("lookup timed out".into()))?
        .map_err(|e| resolution_failed(e.to_string()))?
        .collect();

    connect_first(&addrs, &target, limit).await
}

/// Tries `addrs` in order, giving each one `limit` to connect.
async fn connect_first(
    addrs: &[SocketAddr],
    target: &str,
    limit: Duration,
) -> Result<TcpStream, ConnectorError> {
    let mut last_error = ConnectorError::Resolution {
        target: target.to_string(),
        reason: "no addresses found".into(),
    };

    for addr in addrs {
        match timeout(limit, TcpStream::connect(*addr)).await {
            Ok(Ok(stream)) => {
                debug!("Connected to {} via {}", target, addr);
                return Ok(stream);
            }
            Ok(Err(e)) => {
                debug!("Connect to {} failed: {}", addr, e);
                last_error = ConnectorError::Connect {
                    target: target.to_string(),
                    source: e,
                };
            }
            Err(_) => {
                debug!("Connect to {} timed out", addr);
                last_error = ConnectorError::Timeout("connect");
            }
        }
    }

    Err(last_error)
}

/// Writes the whole buffer and flushes it.
pub async fn write_all<W>(
    stream: &mut W,
    bytes: &[u8],
    limit: Duration,
) -> Result<(), ConnectorError>
where
    W: AsyncWrite + Unpin,
{
    let write = async {
        stream.write_all(bytes).await?;
        stream.flush().await
    };

    timeout(limit, write)
        .await
        .map_err(|_| ConnectorError::Timeout("write"))?
        .map_err(ConnectorError::Write)
}

/// Reads one command message.
///
/// The message ends at the first newline (kept in the returned bytes), at end
/// of stream, or when the peer stops sending for `idle_timeout`. Anything after
/// the newline is discarded.
pub async fn read_message<R>(
    stream: &mut R,
    limits: &ReadLimits,
) -> Result<ReadOutcome, ConnectorError>
where
    R: AsyncRead + Unpin,
{
    let mut message = Vec::new();
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];

    loop {
        let wait = if message.is_empty() {
            limits.first_byte_timeout
        } else {
            limits.idle_timeout
        };

        let n = match timeout(wait, stream.read(&mut chunk)).await {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(ConnectorError::Read(e)),
            Err(_) if message.is_empty() => return Err(ConnectorError::Timeout("command read")),
            // Peer went quiet after sending something
            Err(_) => break,
        };

        if n == 0 {
            break;
        }

        let received = &chunk[..n];
        if let Some(pos) = received.iter().position(|b| *b == b'\n') {
            message.extend_from_slice(&received[..=pos]);
            break;
        }

        message.extend_from_slice(received);
        // Leave room for a CR still waiting for its LF
        if message.len() > limits.max_len + 1 {
            return Ok(ReadOutcome::Oversized(message));
        }
    }

    if message.is_empty() {
        return Ok(ReadOutcome::Closed);
    }

    let content_len = message
        .iter()
        .rposition(|b| *b != b'\n' && *b != b'\r')
        .map_or(0, |last| last + 1);
    if content_len > limits.max_len {
        return Ok(ReadOutcome::Oversized(message));
    }

    Ok(ReadOutcome::Message(message))
}

/// Shuts down the write side and drops the stream.
pub async fn close(mut stream: TcpStream, what: &str) {
    if let Err(e) = stream.shutdown().await {
        debug!("Shutdown of {} connection reported: {}", what, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_len: usize) -> ReadLimits {
        ReadLimits {
            max_len,
            first_byte_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_millis(100),
        }
    }

    async fn pair() -> (TcpStream, TcpStream) {
        let listener = listen(Some("127.0.0.1"), 0, 5).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, peer) = accept(&listener).await.unwrap();
        assert_eq!(peer.host, "127.0.0.1");
        (client, server)
    }

    #[test]
    fn test_peer_identity_unmaps_ipv4() {
        let addr: SocketAddr = "[::ffff:10.0.0.7]:40000".parse().unwrap();
        assert_eq!(PeerIdentity::from_addr(addr).host, "10.0.0.7");
    }

    #[tokio::test]
    async fn test_read_message_stops_at_newline() {
        let (mut client, mut server) = pair().await;
        client.write_all(b"-l 30022\nignored").await.unwrap();

        let outcome = read_message(&mut server, &limits(64)).await.unwrap();
        assert_eq!(outcome, ReadOutcome::Message(b"-l 30022\n".to_vec()));
    }

    #[tokio::test]
    async fn test_read_message_without_terminator_ends_when_peer_pauses() {
        let (mut client, mut server) = pair().await;
        client.write_all(b"-g a.txt 30022").await.unwrap();

        let outcome = read_message(&mut server, &limits(64)).await.unwrap();
        assert_eq!(outcome, ReadOutcome::Message(b"-g a.txt 30022".to_vec()));
    }

    #[tokio::test]
    async fn test_read_message_closed_without_data() {
        let (client, mut server) = pair().await;
        drop(client);

        let outcome = read_message(&mut server, &limits(64)).await.unwrap();
        assert_eq!(outcome, ReadOutcome::Closed);
    }

    #[tokio::test]
    async fn test_read_message_oversized() {
        let (mut client, mut server) = pair().await;
        let mut line = vec![b'x'; 100];
        line.push(b'\n');
        client.write_all(&line).await.unwrap();

        let outcome = read_message(&mut server, &limits(16)).await.unwrap();
        assert!(matches!(outcome, ReadOutcome::Oversized(_)));
    }

    #[tokio::test]
    async fn test_read_message_at_limit_with_crlf() {
        let (mut client, mut server) = pair().await;
        client.write_all(b"-l 30022\r\n").await.unwrap();

        let outcome = read_message(&mut server, &limits(8)).await.unwrap();
        assert_eq!(outcome, ReadOutcome::Message(b"-l 30022\r\n".to_vec()));
    }

    #[tokio::test]
    async fn test_read_message_times_out_on_silent_peer() {
        let (_client, mut server) = pair().await;
        let limits = ReadLimits {
            first_byte_timeout: Duration::from_millis(50),
            ..limits(64)
        };

        let err = read_message(&mut server, &limits).await.unwrap_err();
        assert!(matches!(err, ConnectorError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_write_all_delivers_everything() {
        let (mut client, mut server) = pair().await;
        let payload: Vec<u8> = (0..=255u8).cycle().take(256 * 1024).collect();

        let reader = tokio::spawn(async move {
            let mut received = Vec::new();
            client.read_to_end(&mut received).await.unwrap();
            received
        });

        write_all(&mut server, &payload, Duration::from_secs(5))
            .await
            .unwrap();
        close(server, "test").await;

        assert_eq!(reader.await.unwrap(), payload);
    }

    #[tokio::test]
    async fn test_connect_to_rejects_bad_port_text() {
        for port in ["abc", "0", "70000", ""] {
            let err = connect_to("127.0.0.1", port, Duration::from_secs(1))
                .await
                .unwrap_err();
            assert!(
                matches!(err, ConnectorError::Resolution { .. }),
                "{port:?} gave {err}"
            );
        }
    }

    #[tokio::test]
    async fn test_connect_to_refused() {
        let listener = listen(Some("127.0.0.1"), 0, 5).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = connect_to("127.0.0.1", &port.to_string(), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectorError::Connect { .. }));
    }

    #[tokio::test]
    async fn test_connect_moves_past_unresponsive_address() {
        let listener = listen(Some("127.0.0.1"), 0, 5).await.unwrap();
        let reachable = listener.local_addr().unwrap();
        // TEST-NET-1 is never routed; the attempt either hangs or fails fast
        let unresponsive: SocketAddr = "192.0.2.1:9".parse().unwrap();

        let addrs = [unresponsive, reachable];
        let connect = connect_first(
            &addrs,
            "test target",
            Duration::from_millis(300),
        );
        let (connected, accepted) = tokio::join!(connect, accept(&listener));
        assert!(connected.is_ok());
        assert!(accepted.is_ok());
    }

    #[tokio::test]
    async fn test_connect_first_without_addresses() {
        let err = connect_first(&[], "nowhere", Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectorError::Resolution { .. }));
    }

    #[tokio::test]
    async fn test_connect_to_reaches_listener() {
        let listener = listen(Some("127.0.0.1"), 0, 5).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let port = port.to_string();
        let connect = connect_to("localhost", &port, Duration::from_secs(5));
        let (connected, accepted) = tokio::join!(connect, accept(&listener));
        assert!(connected.is_ok());
        assert!(accepted.is_ok());
    }
}
