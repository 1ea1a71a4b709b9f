use joinx_core::{CsrMatrix, Result};

/// Inverse-document-frequency re-weighting
///
/// `idf = ln((1 + n) / (1 + df)) + 1` with `n` the number of fitted rows and
/// `df` the number of rows storing the feature. Transformed rows are
/// L2-normalised.
#[derive(Debug, Clone, PartialEq)]
pub struct TfidfTransformer {
    idf: Vec<f64>,
}

impl TfidfTransformer {
    pub fn fit(counts: &CsrMatrix) -> Self {
        let n = counts.n_rows() as f64;
        let idf = counts
            .column_doc_freq()
            .into_iter()
            .map(|df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();
        Self { idf }
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    pub fn transform(&self, counts: &CsrMatrix) -> Result<CsrMatrix> {
        let mut out = counts.clone();
        out.scale_columns(&self.idf)?;
        out.normalize_rows_l2();
        Ok(out)
    }
}
