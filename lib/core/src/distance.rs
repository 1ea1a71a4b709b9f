// Distance kernels for dense slices and sorted sparse rows.
// Scalar code with two accumulators so independent adds can pipeline.

use crate::sparse::SparseRow;
use std::cmp::Ordering;

/// Dot product of two equally long dense slices
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let mut sum1 = 0.0;
    let mut sum2 = 0.0;
    let mut chunks_a = a.chunks_exact(2);
    let mut chunks_b = b.chunks_exact(2);
    for (x, y) in (&mut chunks_a).zip(&mut chunks_b) {
        sum1 += x[0] * y[0];
        sum2 += x[1] * y[1];
    }
    for (x, y) in chunks_a.remainder().iter().zip(chunks_b.remainder()) {
        sum1 += x * y;
    }
    sum1 + sum2
}

/// Euclidean norm of a dense slice
#[inline]
pub fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

/// Squared Euclidean distance between two sparse rows
///
/// Computed by a sorted merge over the union of stored indices, so two
/// identical rows give exactly zero.
pub fn sparse_squared_l2(a: SparseRow<'_>, b: SparseRow<'_>) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut sum = 0.0;
    while i < a.indices.len() && j < b.indices.len() {
        match a.indices[i].cmp(&b.indices[j]) {
            Ordering::Less => {
                sum += a.values[i] * a.values[i];
                i += 1;
            }
            Ordering::Greater => {
                sum += b.values[j] * b.values[j];
                j += 1;
            }
            Ordering::Equal => {
                let d = a.values[i] - b.values[j];
                sum += d * d;
                i += 1;
                j += 1;
            }
        }
    }
    sum += a.values[i..].iter().map(|v| v * v).sum::<f64>();
    sum += b.values[j..].iter().map(|v| v * v).sum::<f64>();
    sum
}
