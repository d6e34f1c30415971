use std::fmt;

use crate::error::{MatmulError, Result};

/// Dense, rectangular, non-empty integer matrix stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<i64>,
}

impl Matrix {
    /// Builds a matrix from nested rows, rejecting empty or ragged input.
    pub fn from_rows(rows: Vec<Vec<i64>>) -> Result<Self> {
        let first_len = match rows.first() {
            Some(row) if !row.is_empty() => row.len(),
            _ => return Err(MatmulError::ValidationFailure("Matrix is empty.".to_string())),
        };

        let mut data = Vec::with_capacity(rows.len() * first_len);
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != first_len {
                return Err(MatmulError::ValidationFailure(format!(
                    "All rows must have the same number of columns (row {} has {}, expected {}).",
                    idx,
                    row.len(),
                    first_len
                )));
            }
            data.extend_from_slice(row);
        }

        Ok(Self {
            rows: rows.len(),
            cols: first_len,
            data,
        })
    }

    /// Wraps a row-major buffer produced by the result aggregator.
    pub(crate) fn from_raw(rows: usize, cols: usize, data: Vec<i64>) -> Self {
        debug_assert_eq!(rows * cols, data.len());
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> i64 {
        self.data[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[i64] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    pub fn column(&self, col: usize) -> Vec<i64> {
        (0..self.rows).map(|row| self.get(row, col)).collect()
    }

    pub fn to_rows(&self) -> Vec<Vec<i64>> {
        self.data.chunks(self.cols).map(|row| row.to_vec()).collect()
    }

    pub fn elements(&self) -> &[i64] {
        &self.data
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}
