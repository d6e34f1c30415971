//! Text payloads carried inside frames.
//!
//! Request: `"1,2,3;4,5,6"`. Response: `"32"` on success, `"!reason"` when
//! the worker could not compute a value.

use crate::error::{MatmulError, Result};

/// Separates the elements of one sequence.
pub const ELEMENT_SEPARATOR: char = ',';
/// Separates the row from the column.
pub const VECTOR_SEPARATOR: char = ';';
/// Leading marker of an error response.
pub const ERROR_MARKER: char = '!';

/// A worker's answer to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Value(i64),
    Error(String),
}

pub fn encode_request(row: &[i64], col: &[i64]) -> String {
    let mut out = String::with_capacity((row.len() + col.len()) * 4);
    push_sequence(&mut out, row);
    out.push(VECTOR_SEPARATOR);
    push_sequence(&mut out, col);
    out
}

fn push_sequence(out: &mut String, values: &[i64]) {
    for (idx, value) in values.iter().enumerate() {
        if idx > 0 {
            out.push(ELEMENT_SEPARATOR);
        }
        out.push_str(&value.to_string());
    }
}

pub fn decode_request(message: &str) -> Result<(Vec<i64>, Vec<i64>)> {
    let (row, col) = message.split_once(VECTOR_SEPARATOR).ok_or_else(|| {
        MatmulError::MalformedMessage(format!("missing '{}' separator", VECTOR_SEPARATOR))
    })?;

    let row = decode_sequence(row)?;
    let col = decode_sequence(col)?;

    if row.len() != col.len() {
        return Err(MatmulError::MalformedMessage(format!(
            "row has {} elements but column has {}",
            row.len(),
            col.len()
        )));
    }

    Ok((row, col))
}

fn decode_sequence(part: &str) -> Result<Vec<i64>> {
    if part.is_empty() {
        return Err(MatmulError::MalformedMessage("empty sequence".to_string()));
    }
    part.split(ELEMENT_SEPARATOR)
        .map(|token| {
            token.parse::<i64>().map_err(|_| {
                MatmulError::MalformedMessage(format!("'{}' is not an integer", token))
            })
        })
        .collect()
}

pub fn encode_response(response: &Response) -> String {
    match response {
        Response::Value(value) => value.to_string(),
        Response::Error(reason) => format!("{}{}", ERROR_MARKER, reason),
    }
}

/// Decodes a response into the computed value.
///
/// An error response becomes `MatmulError::Remote` carrying the worker's reason.
pub fn decode_response(message: &str) -> Result<i64> {
    if let Some(reason) = message.strip_prefix(ERROR_MARKER) {
        return Err(MatmulError::Remote(reason.to_string()));
    }
    message
        .parse::<i64>()
        .map_err(|_| MatmulError::MalformedMessage(format!("'{}' is not an integer", message)))
}
