use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Borrowed view of one sparse row: parallel slices of sorted column indices
/// and their values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SparseRow<'a> {
    pub indices: &'a [usize],
    pub values: &'a [f64],
}

impl<'a> SparseRow<'a> {
    #[inline]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn norm(&self) -> f64 {
        crate::distance::norm(self.values)
    }
}

/// Compressed sparse row matrix
///
/// Column indices within a row are strictly increasing. Explicit zeros are
/// never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsrMatrix {
    n_cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f64>,
}

impl CsrMatrix {
    /// An empty matrix with `n_cols` columns and no rows
    #[must_use]
    pub fn empty(n_cols: usize) -> Self {
        Self {
            n_cols,
            indptr: vec![0],
            indices: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Build from dense rows, dropping zeros
    pub fn from_dense_rows(rows: &[Vec<f64>], n_cols: usize) -> Result<Self> {
        let mut m = Self::empty(n_cols);
        for row in rows {
            if row.len() != n_cols {
                return Err(Error::InvalidDimension {
                    expected: n_cols,
                    actual: row.len(),
                });
            }
            for (j, &v) in row.iter().enumerate() {
                if v != 0.0 {
                    m.indices.push(j);
                    m.data.push(v);
                }
            }
            m.indptr.push(m.indices.len());
        }
        Ok(m)
    }

    /// Build from unordered `(column, value)` entries per row. Entries that
    /// share a column are summed; resulting zeros are dropped.
    pub fn from_rows(rows: Vec<Vec<(usize, f64)>>, n_cols: usize) -> Result<Self> {
        let mut m = Self::empty(n_cols);
        for mut row in rows {
            row.sort_unstable_by_key(|&(j, _)| j);
            let mut merged: Vec<(usize, f64)> = Vec::with_capacity(row.len());
            for (j, v) in row {
                if j >= n_cols {
                    return Err(Error::InvalidDimension {
                        expected: n_cols,
                        actual: j + 1,
                    });
                }
                match merged.last_mut() {
                    Some((last, acc)) if *last == j => *acc += v,
                    _ => merged.push((j, v)),
                }
            }
            for (j, v) in merged {
                if v != 0.0 {
                    m.indices.push(j);
                    m.data.push(v);
                }
            }
            m.indptr.push(m.indices.len());
        }
        Ok(m)
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.indptr.len() - 1
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    #[inline]
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn row(&self, i: usize) -> SparseRow<'_> {
        let (start, end) = (self.indptr[i], self.indptr[i + 1]);
        SparseRow {
            indices: &self.indices[start..end],
            values: &self.data[start..end],
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = SparseRow<'_>> + '_ {
        (0..self.n_rows()).map(move |i| self.row(i))
    }

    /// Concatenate matrices side by side. All blocks must have the same row count.
    pub fn hstack(blocks: &[CsrMatrix]) -> Result<Self> {
        let first = blocks.first().ok_or(Error::EmptyFeatureSpace)?;
        let n_rows = first.n_rows();
        if let Some(bad) = blocks.iter().find(|b| b.n_rows() != n_rows) {
            return Err(Error::InvalidDimension {
                expected: n_rows,
                actual: bad.n_rows(),
            });
        }

        let n_cols = blocks.iter().map(CsrMatrix::n_cols).sum();
        let mut m = Self::empty(n_cols);
        let nnz: usize = blocks.iter().map(CsrMatrix::nnz).sum();
        m.indices.reserve(nnz);
        m.data.reserve(nnz);
        for i in 0..n_rows {
            let mut offset = 0;
            for block in blocks {
                let row = block.row(i);
                m.indices.extend(row.indices.iter().map(|&j| j + offset));
                m.data.extend_from_slice(row.values);
                offset += block.n_cols;
            }
            m.indptr.push(m.indices.len());
        }
        Ok(m)
    }

    /// Stack matrices on top of each other. All blocks must have the same column count.
    pub fn vstack(blocks: &[&CsrMatrix]) -> Result<Self> {
        let first = blocks.first().ok_or(Error::EmptyFeatureSpace)?;
        let n_cols = first.n_cols;
        let mut m = Self::empty(n_cols);
        for block in blocks {
            if block.n_cols != n_cols {
                return Err(Error::InvalidDimension {
                    expected: n_cols,
                    actual: block.n_cols,
                });
            }
            let base = m.indices.len();
            m.indices.extend_from_slice(&block.indices);
            m.data.extend_from_slice(&block.data);
            m.indptr.extend(block.indptr[1..].iter().map(|&p| p + base));
        }
        Ok(m)
    }

    /// Scale every row to unit Euclidean norm. All-zero rows are left as is.
    pub fn normalize_rows_l2(&mut self) {
        for i in 0..self.n_rows() {
            let (start, end) = (self.indptr[i], self.indptr[i + 1]);
            let norm = crate::distance::norm(&self.data[start..end]);
            if norm > 0.0 {
                let inv = 1.0 / norm;
                for v in &mut self.data[start..end] {
                    *v *= inv;
                }
            }
        }
    }

    /// Number of rows holding a stored value in each column
    pub fn column_doc_freq(&self) -> Vec<usize> {
        let mut df = vec![0usize; self.n_cols];
        for &j in &self.indices {
            df[j] += 1;
        }
        df
    }

    /// Multiply each column by its factor
    pub fn scale_columns(&mut self, factors: &[f64]) -> Result<()> {
        if factors.len() != self.n_cols {
            return Err(Error::InvalidDimension {
                expected: self.n_cols,
                actual: factors.len(),
            });
        }
        for (v, &j) in self.data.iter_mut().zip(&self.indices) {
            *v *= factors[j];
        }
        Ok(())
    }

    /// Dense copy of one row, for small matrices and tests
    pub fn row_dense(&self, i: usize) -> Vec<f64> {
        let mut out = vec![0.0; self.n_cols];
        let row = self.row(i);
        for (&j, &v) in row.indices.iter().zip(row.values) {
            out[j] = v;
        }
        out
    }
}
