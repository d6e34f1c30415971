use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

use crate::error::{MatmulError, Result};
use crate::protocol::codec::{read_text, write_text};
use crate::protocol::message::{Response, decode_request, encode_response};

/// How long a connection may take to deliver its request before it is dropped.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Stateless dot-product server.
///
/// Each accepted connection is served on its own tokio task and carries
/// exactly one request and one response.
pub struct WorkerService {
    listener: TcpListener,
    local_addr: SocketAddr,
    read_timeout: Duration,
    served: Arc<AtomicU64>,
}

impl WorkerService {
    /// Binds the listener. Port 0 picks a free port; see `local_addr`.
    pub async fn bind(host: &str, port: u16) -> Result<Arc<Self>> {
        Self::bind_with_read_timeout(host, port, DEFAULT_READ_TIMEOUT).await
    }

    pub async fn bind_with_read_timeout(
        host: &str,
        port: u16,
        read_timeout: Duration,
    ) -> Result<Arc<Self>> {
        let listener = TcpListener::bind((host, port)).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Worker listening on {}", local_addr);

        Ok(Arc::new(Self {
            listener,
            local_addr,
            read_timeout,
            served: Arc::new(AtomicU64::new(0)),
        }))
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of connections that received a response (value or error).
    pub fn served_count(&self) -> u64 {
        self.served.load(Ordering::SeqCst)
    }

    /// Accept loop. Never returns under normal operation.
    pub async fn serve(self: Arc<Self>) {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let local_addr = self.local_addr;
                    let read_timeout = self.read_timeout;
                    let served = self.served.clone();
                    tokio::spawn(async move {
                        match handle_connection(stream, local_addr, read_timeout).await {
                            Ok(true) => {
                                served.fetch_add(1, Ordering::SeqCst);
                            }
                            Ok(false) => {
                                tracing::debug!("Peer {} closed without sending a request", peer);
                            }
                            Err(e) => {
                                tracing::warn!("Connection from {} failed: {}", peer, e);
                            }
                        }
                    });
                }
                Err(e) => {
                    // Typically fd exhaustion; back off instead of spinning.
                    tracing::error!("Failed to accept connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }
}

/// Serves one connection: read request, compute, respond, close.
///
/// Returns `Ok(false)` when the peer closed before sending anything, in which
/// case no response is attempted. A request that does not arrive within
/// `read_timeout` fails the connection without a response.
pub async fn handle_connection(
    mut stream: TcpStream,
    local_addr: SocketAddr,
    read_timeout: Duration,
) -> Result<bool> {
    let read = match tokio::time::timeout(read_timeout, read_text(&mut stream)).await {
        Ok(read) => read,
        Err(_) => {
            return Err(MatmulError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("no request within {:?}", read_timeout),
            )));
        }
    };
    let request = match read {
        Ok(text) => text,
        Err(MatmulError::ConnectionClosed) => return Ok(false),
        Err(e @ MatmulError::MalformedMessage(_)) | Err(e @ MatmulError::FrameTooLarge { .. }) => {
            tracing::warn!("[worker {}] rejecting request: {}", local_addr, e);
            write_text(&mut stream, &encode_response(&Response::Error(e.to_string()))).await?;
            return Ok(true);
        }
        Err(e) => return Err(e),
    };

    let response = match compute(&request) {
        Ok((row, col, value)) => {
            tracing::debug!(
                "[worker {}] {:?} . {:?} = {}",
                local_addr,
                row,
                col,
                value
            );
            tracing::info!(
                "[worker {}] computed dot product of length {} = {}",
                local_addr,
                row.len(),
                value
            );
            Response::Value(value)
        }
        Err(e) => {
            tracing::warn!("[worker {}] rejecting request: {}", local_addr, e);
            Response::Error(e.to_string())
        }
    };

    write_text(&mut stream, &encode_response(&response)).await?;
    Ok(true)
}

fn compute(request: &str) -> Result<(Vec<i64>, Vec<i64>, i64)> {
    let (row, col) = decode_request(request)?;
    let value = dot_product(&row, &col)?;
    Ok((row, col, value))
}

/// `Σ row[k] * col[k]` with overflow detection.
pub fn dot_product(row: &[i64], col: &[i64]) -> Result<i64> {
    if row.len() != col.len() {
        return Err(MatmulError::MalformedMessage(format!(
            "row has {} elements but column has {}",
            row.len(),
            col.len()
        )));
    }

    row.iter().zip(col).try_fold(0i64, |acc, (l, c)| {
        l.checked_mul(*c)
            .and_then(|product| acc.checked_add(product))
            .ok_or(MatmulError::Overflow)
    })
}
