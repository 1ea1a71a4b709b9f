//! Text vectorizers
//!
//! A [`Vectorizer`] is fit on a corpus, then maps documents to sparse rows in
//! a fixed feature space. The textual encoder fits one on the union of both
//! tables' documents so main and auxiliary rows share a space.

use crate::analyzer::{Analyzer, NgramRange, DEFAULT_NGRAM_RANGE};
use ahash::{AHashMap, RandomState};
use joinx_core::{CsrMatrix, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of hashed features: 2^20
pub const DEFAULT_N_FEATURES: usize = 1 << 20;

// Fixed seeds keep feature indices stable from one run to the next
const HASH_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

/// Fit-on-corpus, transform-to-vectors capability
pub trait Vectorizer: fmt::Debug + Send + Sync {
    /// Learn whatever the vectorizer needs from the corpus
    fn fit(&mut self, corpus: &[String]) -> Result<()>;

    /// Map documents to rows of a matrix whose width does not depend on `docs`
    fn transform(&self, docs: &[String]) -> Result<CsrMatrix>;

    /// Fresh boxed copy, so each join works on its own instance
    fn boxed_clone(&self) -> Box<dyn Vectorizer>;
}

impl Clone for Box<dyn Vectorizer> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

/// Stateless vectorizer hashing n-grams into a fixed number of features
///
/// Each n-gram adds `+1` or `-1` (picked by a hash bit) at its hashed index,
/// so collisions tend to cancel instead of piling up. Rows are L2-normalised.
#[derive(Debug, Clone, PartialEq)]
pub struct HashingVectorizer {
    analyzer: Analyzer,
    ngram_range: NgramRange,
    n_features: usize,
    alternate_sign: bool,
}

impl HashingVectorizer {
    pub fn new(analyzer: Analyzer, ngram_range: NgramRange) -> Self {
        Self {
            analyzer,
            ngram_range,
            n_features: DEFAULT_N_FEATURES,
            alternate_sign: true,
        }
    }

    #[must_use]
    pub fn with_n_features(mut self, n_features: usize) -> Self {
        self.n_features = n_features.max(1);
        self
    }

    #[must_use]
    pub fn with_alternate_sign(mut self, alternate_sign: bool) -> Self {
        self.alternate_sign = alternate_sign;
        self
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

impl Default for HashingVectorizer {
    fn default() -> Self {
        Self::new(Analyzer::default(), DEFAULT_NGRAM_RANGE)
    }
}

impl Vectorizer for HashingVectorizer {
    fn fit(&mut self, _corpus: &[String]) -> Result<()> {
        Ok(())
    }

    fn transform(&self, docs: &[String]) -> Result<CsrMatrix> {
        let state = RandomState::with_seeds(HASH_SEEDS[0], HASH_SEEDS[1], HASH_SEEDS[2], HASH_SEEDS[3]);
        let n = self.n_features as u64;

        let rows: Vec<Vec<(usize, f64)>> = docs
            .iter()
            .map(|doc| {
                self.analyzer
                    .analyze(doc, self.ngram_range)
                    .iter()
                    .map(|gram| {
                        let h = state.hash_one(gram.as_str());
                        let sign = if self.alternate_sign && h >> 63 == 1 { -1.0 } else { 1.0 };
                        ((h % n) as usize, sign)
                    })
                    .collect()
            })
            .collect();

        let mut m = CsrMatrix::from_rows(rows, self.n_features)?;
        m.normalize_rows_l2();
        Ok(m)
    }

    fn boxed_clone(&self) -> Box<dyn Vectorizer> {
        Box::new(self.clone())
    }
}

/// Vectorizer counting n-grams over a vocabulary learned at fit time
///
/// Features are the distinct n-grams of the corpus in sorted order. N-grams
/// unseen during fit are ignored.
#[derive(Debug, Clone)]
pub struct CountVectorizer {
    analyzer: Analyzer,
    ngram_range: NgramRange,
    vocabulary: AHashMap<String, usize>,
}

impl CountVectorizer {
    pub fn new(analyzer: Analyzer, ngram_range: NgramRange) -> Self {
        Self {
            analyzer,
            ngram_range,
            vocabulary: AHashMap::new(),
        }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn feature_index(&self, gram: &str) -> Option<usize> {
        self.vocabulary.get(gram).copied()
    }
}

impl Vectorizer for CountVectorizer {
    fn fit(&mut self, corpus: &[String]) -> Result<()> {
        let mut grams: Vec<String> = corpus
            .iter()
            .flat_map(|doc| self.analyzer.analyze(doc, self.ngram_range))
            .collect();
        grams.sort_unstable();
        grams.dedup();

        if grams.is_empty() {
            return Err(Error::EmptyFeatureSpace);
        }
        self.vocabulary = grams.into_iter().enumerate().map(|(i, g)| (g, i)).collect();
        Ok(())
    }

    fn transform(&self, docs: &[String]) -> Result<CsrMatrix> {
        let rows: Vec<Vec<(usize, f64)>> = docs
            .iter()
            .map(|doc| {
                self.analyzer
                    .analyze(doc, self.ngram_range)
                    .iter()
                    .filter_map(|gram| self.vocabulary.get(gram).map(|&j| (j, 1.0)))
                    .collect()
            })
            .collect();
        CsrMatrix::from_rows(rows, self.vocabulary.len())
    }

    fn boxed_clone(&self) -> Box<dyn Vectorizer> {
        Box::new(self.clone())
    }
}

/// Built-in vectorizers selectable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum EncoderKind {
    #[default]
    Hashing,
    Count,
}

impl EncoderKind {
    pub fn build(self, analyzer: Analyzer, ngram_range: NgramRange) -> Box<dyn Vectorizer> {
        match self {
            EncoderKind::Hashing => Box::new(HashingVectorizer::new(analyzer, ngram_range)),
            EncoderKind::Count => Box::new(CountVectorizer::new(analyzer, ngram_range)),
        }
    }
}

impl FromStr for EncoderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hashing" => Ok(EncoderKind::Hashing),
            "count" => Ok(EncoderKind::Count),
            other => Err(Error::InvalidEncoder(other.to_string())),
        }
    }
}

impl TryFrom<String> for EncoderKind {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_hashing_rows_unit_norm() {
        let v = HashingVectorizer::default();
        let m = v.transform(&docs(&["ana", "lala", ""])).unwrap();
        assert_eq!(m.n_rows(), 3);
        assert_eq!(m.n_cols(), DEFAULT_N_FEATURES);
        assert!((m.row(0).norm() - 1.0).abs() < 1e-12);
        assert_eq!(m.row(2).nnz(), 0);
    }

    #[test]
    fn test_hashing_is_deterministic() {
        let v = HashingVectorizer::new(Analyzer::Char, (1, 3));
        let a = v.transform(&docs(&["Fuzzy Join"])).unwrap();
        let b = v.boxed_clone().transform(&docs(&["fuzzy join"])).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_hashing_without_sign() {
        let v = HashingVectorizer::new(Analyzer::Word, (1, 1))
            .with_n_features(16)
            .with_alternate_sign(false);
        let m = v.transform(&docs(&["aa bb cc"])).unwrap();
        assert!(m.row(0).values.iter().all(|&x| x > 0.0));
    }

    #[test]
    fn test_count_vocabulary_sorted() {
        let mut v = CountVectorizer::new(Analyzer::Word, (1, 1));
        v.fit(&docs(&["bb aa", "cc aa"])).unwrap();
        assert_eq!(v.vocabulary_len(), 3);
        assert_eq!(v.feature_index("aa"), Some(0));
        assert_eq!(v.feature_index("cc"), Some(2));

        let m = v.transform(&docs(&["aa aa zz"])).unwrap();
        assert_eq!(m.row_dense(0), vec![2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_count_empty_vocabulary() {
        let mut v = CountVectorizer::new(Analyzer::Word, (1, 1));
        assert!(matches!(v.fit(&docs(&["", "a"])), Err(Error::EmptyFeatureSpace)));
    }

    #[test]
    fn test_encoder_kind_parse() {
        assert_eq!("count".parse::<EncoderKind>().unwrap(), EncoderKind::Count);
        assert!(matches!(
            "minhash".parse::<EncoderKind>(),
            Err(Error::InvalidEncoder(name)) if name == "minhash"
        ));
        assert!(serde_json::from_str::<EncoderKind>("\"tfidf\"").is_err());
    }
}
