//! Result Writer
//!
//! Renders a matrix as right-aligned columns. Every element is padded to the
//! width of the widest rendered element plus a two-space margin.

use std::fmt::Write;
use std::path::Path;

use super::types::Matrix;
use crate::error::Result;

pub fn render_pretty(matrix: &Matrix) -> String {
    let width = matrix
        .elements()
        .iter()
        .map(|value| value.to_string().len())
        .max()
        .unwrap_or(1)
        + 2;

    let mut out = String::with_capacity(matrix.rows() * (matrix.cols() * width + 1));
    for row in 0..matrix.rows() {
        for value in matrix.row(row) {
            // Writing into a String cannot fail.
            let _ = write!(out, "{:>width$}", value, width = width);
        }
        out.push('\n');
    }
    out
}

pub fn export_pretty(matrix: &Matrix, path: &Path) -> Result<()> {
    std::fs::write(path, render_pretty(matrix))?;
    tracing::info!("Exported {} matrix to {}", matrix, path.display());
    Ok(())
}
