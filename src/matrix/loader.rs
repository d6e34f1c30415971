//! Matrix Loader
//!
//! Input format: two matrices separated by a blank line, one row per line,
//! elements separated by whitespace.
//!
//! ```text
//! 1 2
//! 3 4
//!
//! 5 6
//! 7 8
//! ```

use std::path::Path;

use super::types::Matrix;
use crate::error::{MatmulError, Result};

pub fn load_matrix_pair(path: &Path) -> Result<(Matrix, Matrix)> {
    let content = std::fs::read_to_string(path)?;
    let pair = parse_matrix_pair(&content)?;
    tracing::info!(
        "Loaded matrices {} and {} from {}",
        pair.0,
        pair.1,
        path.display()
    );
    Ok(pair)
}

pub fn parse_matrix_pair(content: &str) -> Result<(Matrix, Matrix)> {
    let normalized = content.replace("\r\n", "\n");
    let blocks: Vec<&str> = normalized
        .trim()
        .split("\n\n")
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .collect();

    if blocks.len() != 2 {
        return Err(MatmulError::ValidationFailure(format!(
            "Matrix file must contain two matrices separated by a blank line, found {} block(s).",
            blocks.len()
        )));
    }

    let first = parse_matrix(blocks[0])
        .map_err(|e| MatmulError::ValidationFailure(format!("First matrix invalid: {}", e)))?;
    let second = parse_matrix(blocks[1])
        .map_err(|e| MatmulError::ValidationFailure(format!("Second matrix invalid: {}", e)))?;

    Ok((first, second))
}

fn parse_matrix(block: &str) -> std::result::Result<Matrix, String> {
    let rows = block
        .lines()
        .map(|line| {
            line.split_whitespace()
                .map(|token| {
                    token
                        .parse::<i64>()
                        .map_err(|_| format!("Invalid element '{}', must be integer.", token))
                })
                .collect::<std::result::Result<Vec<i64>, String>>()
        })
        .collect::<std::result::Result<Vec<Vec<i64>>, String>>()?;

    Matrix::from_rows(rows).map_err(|e| match e {
        MatmulError::ValidationFailure(msg) => msg,
        other => other.to_string(),
    })
}
