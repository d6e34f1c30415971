use tokio::net::TcpStream;

use super::types::WorkerAddress;
use crate::error::{MatmulError, Result};
use crate::protocol::codec::{read_text, write_text};
use crate::protocol::message::{decode_response, encode_request};

/// One network round-trip: connect, send the task, wait for the scalar.
pub async fn request_dot_product(addr: &WorkerAddress, row: &[i64], col: &[i64]) -> Result<i64> {
    let mut stream = TcpStream::connect((addr.host.as_str(), addr.port))
        .await
        .map_err(|source| MatmulError::ConnectionFailure {
            addr: addr.clone(),
            source,
        })?;

    write_text(&mut stream, &encode_request(row, col))
        .await
        .map_err(|e| lift_io(addr, e))?;

    let response = read_text(&mut stream).await.map_err(|e| lift_io(addr, e))?;
    decode_response(&response)
}

/// Attributes bare I/O errors to the worker they came from.
fn lift_io(addr: &WorkerAddress, error: MatmulError) -> MatmulError {
    match error {
        MatmulError::Io(source) => MatmulError::ConnectionFailure {
            addr: addr.clone(),
            source,
        },
        other => other,
    }
}
