use super::types::Matrix;
use crate::error::{MatmulError, Result};

pub fn check_dimensions(left: &Matrix, right: &Matrix) -> Result<()> {
    if left.cols() != right.rows() {
        return Err(MatmulError::DimensionMismatch {
            left_rows: left.rows(),
            left_cols: left.cols(),
            right_rows: right.rows(),
            right_cols: right.cols(),
        });
    }
    Ok(())
}

/// Single-threaded triple-loop multiplication, used as the local baseline.
///
/// Uses wrapping arithmetic; the distributed path is the one that reports
/// overflow.
pub fn multiply_serial(left: &Matrix, right: &Matrix) -> Result<Matrix> {
    check_dimensions(left, right)?;

    let mut data = vec![0i64; left.rows() * right.cols()];
    for i in 0..left.rows() {
        for j in 0..right.cols() {
            let mut sum = 0i64;
            for k in 0..left.cols() {
                sum = sum.wrapping_add(left.get(i, k).wrapping_mul(right.get(k, j)));
            }
            data[i * right.cols() + j] = sum;
        }
    }

    Ok(Matrix::from_raw(left.rows(), right.cols(), data))
}
