//! Key encoders
//!
//! Turns the key columns of the main and auxiliary tables into two sparse
//! matrices that share one feature space. Each key group has its own encoder,
//! a pure function of `(main, aux) -> (main_vectors, aux_vectors)` that
//! collects both sides, fits on their union, then transforms each side. Group
//! outputs are concatenated in [`KeyGroup::ORDER`] without per-group weights.

use crate::analyzer::{validate_ngram_range, Analyzer, NgramRange, DEFAULT_NGRAM_RANGE};
use crate::classify::{KeyGroup, KeyGroups, KeyPair};
use crate::scaler::StandardScaler;
use crate::tfidf::TfidfTransformer;
use crate::vectorizer::{HashingVectorizer, Vectorizer};
use ahash::AHashSet;
use joinx_core::frame::{float_values, text_values, timestamp_seconds};
use joinx_core::{require_column, CsrMatrix, DataFrame, Error, Result};
use polars::prelude::Column;
use tracing::debug;

/// Separator placed between the values of several textual keys of one row
pub const TEXT_KEY_SEPARATOR: &str = "  ";

/// Main and auxiliary encodings of the same keys, equally wide
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedPair {
    pub main: CsrMatrix,
    pub aux: CsrMatrix,
}

impl EncodedPair {
    pub fn n_features(&self) -> usize {
        self.main.n_cols()
    }
}

/// Standardise numeric keys jointly over both tables
pub fn encode_numeric(main: &DataFrame, aux: &DataFrame, pairs: &[KeyPair]) -> Result<EncodedPair> {
    encode_scaled(main, aux, pairs, KeyGroup::Numeric)
}

/// Encode datetime keys as whole-second timestamps, standardised jointly
pub fn encode_temporal(main: &DataFrame, aux: &DataFrame, pairs: &[KeyPair]) -> Result<EncodedPair> {
    encode_scaled(main, aux, pairs, KeyGroup::Temporal)
}

fn encode_scaled(
    main: &DataFrame,
    aux: &DataFrame,
    pairs: &[KeyPair],
    group: KeyGroup,
) -> Result<EncodedPair> {
    let mut main_cols = Vec::with_capacity(pairs.len());
    let mut aux_cols = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let m = require_column(main, &pair.main, "main")?;
        let a = require_column(aux, &pair.aux, "auxiliary")?;
        if KeyGroup::of(m.dtype()) != group || KeyGroup::of(a.dtype()) != group {
            return Err(Error::IncompatibleKeyTypes {
                main: m.name().to_string(),
                main_type: m.dtype().to_string(),
                aux: a.name().to_string(),
                aux_type: a.dtype().to_string(),
            });
        }
        main_cols.push(finite_values(m, group)?);
        aux_cols.push(finite_values(a, group)?);
    }

    let main_rows = transpose(&main_cols, main.height());
    let aux_rows = transpose(&aux_cols, aux.height());

    let scaler = StandardScaler::fit(
        aux_rows.iter().chain(&main_rows).map(Vec::as_slice),
        pairs.len(),
    )?;

    let main_scaled = scaler.transform(main_rows.iter().map(Vec::as_slice))?;
    let aux_scaled = scaler.transform(aux_rows.iter().map(Vec::as_slice))?;
    Ok(EncodedPair {
        main: CsrMatrix::from_dense_rows(&main_scaled, pairs.len())?,
        aux: CsrMatrix::from_dense_rows(&aux_scaled, pairs.len())?,
    })
}

/// Key values as `f64`. Missing cells stay `None`; infinities are rejected
/// because they poison the joint mean.
fn finite_values(column: &Column, group: KeyGroup) -> Result<Vec<Option<f64>>> {
    let values = match group {
        KeyGroup::Temporal => timestamp_seconds(column)?,
        _ => float_values(column)?,
    };
    if let Some(row) = values.iter().position(|v| v.is_some_and(|x| !x.is_finite())) {
        return Err(Error::NonFiniteKey {
            column: column.name().to_string(),
            row,
        });
    }
    Ok(values)
}

fn transpose(columns: &[Vec<Option<f64>>], height: usize) -> Vec<Vec<Option<f64>>> {
    (0..height)
        .map(|row| columns.iter().map(|c| c[row]).collect())
        .collect()
}

/// Vectorise textual keys with TF-IDF weighting
///
/// Every key value is coerced to text (nulls become empty strings) and the
/// keys of one row are joined with [`TEXT_KEY_SEPARATOR`]. The vectorizer is
/// fit on the distinct documents of both tables and the IDF weights on all
/// rows of both tables.
pub fn encode_textual(
    main: &DataFrame,
    aux: &DataFrame,
    pairs: &[KeyPair],
    mut vectorizer: Box<dyn Vectorizer>,
) -> Result<EncodedPair> {
    let main_cols = pairs
        .iter()
        .map(|p| require_column(main, &p.main, "main").and_then(text_values))
        .collect::<Result<Vec<_>>>()?;
    let aux_cols = pairs
        .iter()
        .map(|p| require_column(aux, &p.aux, "auxiliary").and_then(text_values))
        .collect::<Result<Vec<_>>>()?;

    let main_docs = text_documents(&main_cols, main.height());
    let aux_docs = text_documents(&aux_cols, aux.height());

    let mut seen = AHashSet::with_capacity(main_docs.len() + aux_docs.len());
    let corpus: Vec<String> = main_docs
        .iter()
        .chain(&aux_docs)
        .filter(|doc| seen.insert(doc.as_str()))
        .cloned()
        .collect();

    vectorizer.fit(&corpus)?;
    let main_counts = vectorizer.transform(&main_docs)?;
    let aux_counts = vectorizer.transform(&aux_docs)?;
    if main_counts.n_cols() != aux_counts.n_cols() {
        return Err(Error::InvalidDimension {
            expected: main_counts.n_cols(),
            actual: aux_counts.n_cols(),
        });
    }

    let tfidf = TfidfTransformer::fit(&CsrMatrix::vstack(&[&main_counts, &aux_counts])?);
    Ok(EncodedPair {
        main: tfidf.transform(&main_counts)?,
        aux: tfidf.transform(&aux_counts)?,
    })
}

fn text_documents(columns: &[Vec<String>], height: usize) -> Vec<String> {
    (0..height)
        .map(|row| {
            columns
                .iter()
                .map(|c| c[row].as_str())
                .collect::<Vec<_>>()
                .join(TEXT_KEY_SEPARATOR)
        })
        .collect()
}

/// Concatenate group encodings side by side
pub fn combine(parts: Vec<EncodedPair>) -> Result<EncodedPair> {
    if parts.is_empty() {
        return Err(Error::EmptyFeatureSpace);
    }
    let (main, aux): (Vec<CsrMatrix>, Vec<CsrMatrix>) =
        parts.into_iter().map(|p| (p.main, p.aux)).unzip();
    Ok(EncodedPair {
        main: CsrMatrix::hstack(&main)?,
        aux: CsrMatrix::hstack(&aux)?,
    })
}

/// Encodes classified key groups into one shared vector space
#[derive(Debug, Clone)]
pub struct KeyEncoder {
    analyzer: Analyzer,
    ngram_range: NgramRange,
    vectorizer: Option<Box<dyn Vectorizer>>,
}

impl KeyEncoder {
    /// Encoder with the default `char_wb` analyzer, `(2, 4)` n-grams and a
    /// hashing vectorizer
    pub fn new() -> Self {
        Self {
            analyzer: Analyzer::default(),
            ngram_range: DEFAULT_NGRAM_RANGE,
            vectorizer: None,
        }
    }

    pub fn analyzer(&self) -> Analyzer {
        self.analyzer
    }

    pub fn ngram_range(&self) -> NgramRange {
        self.ngram_range
    }

    /// Vectorizer for textual keys. A caller-supplied one is cloned so each
    /// encoding fits its own instance.
    fn text_vectorizer(&self) -> Box<dyn Vectorizer> {
        match &self.vectorizer {
            Some(v) => v.clone(),
            None => Box::new(HashingVectorizer::new(self.analyzer, self.ngram_range)),
        }
    }

    /// Encode one group of key pairs
    pub fn encode_group(
        &self,
        group: KeyGroup,
        pairs: &[KeyPair],
        main: &DataFrame,
        aux: &DataFrame,
    ) -> Result<EncodedPair> {
        let encoded = match group {
            KeyGroup::Numeric => encode_numeric(main, aux, pairs)?,
            KeyGroup::Temporal => encode_temporal(main, aux, pairs)?,
            KeyGroup::Textual => encode_textual(main, aux, pairs, self.text_vectorizer())?,
        };
        debug!(
            group = %group,
            keys = pairs.len(),
            features = encoded.n_features(),
            main_nnz = encoded.main.nnz(),
            aux_nnz = encoded.aux.nnz(),
            "encoded key group"
        );
        Ok(encoded)
    }

    /// Encode every active group and concatenate the results
    pub fn encode(&self, groups: &KeyGroups, main: &DataFrame, aux: &DataFrame) -> Result<EncodedPair> {
        let parts = groups
            .iter()
            .map(|(group, pairs)| self.encode_group(group, pairs, main, aux))
            .collect::<Result<Vec<_>>>()?;
        combine(parts)
    }
}

impl Default for KeyEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`KeyEncoder`]
#[derive(Debug, Clone, Default)]
pub struct EncoderBuilder {
    encoder: KeyEncoder,
}

impl EncoderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyzer(mut self, analyzer: Analyzer) -> Self {
        self.encoder.analyzer = analyzer;
        self
    }

    pub fn ngram_range(mut self, ngram_range: NgramRange) -> Self {
        self.encoder.ngram_range = ngram_range;
        self
    }

    /// Use this vectorizer for textual keys instead of the hashing default.
    /// Its own analyzer settings apply.
    pub fn vectorizer(mut self, vectorizer: Box<dyn Vectorizer>) -> Self {
        self.encoder.vectorizer = Some(vectorizer);
        self
    }

    pub fn build(self) -> Result<KeyEncoder> {
        validate_ngram_range(self.encoder.ngram_range)?;
        Ok(self.encoder)
    }
}
