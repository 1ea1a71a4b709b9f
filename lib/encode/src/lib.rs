//! # joinx Encode
//!
//! Turns key columns into vectors that can be compared across two tables.
//!
//! ## Overview
//!
//! Key pairs are first classified by the main column's type:
//!
//! - **numeric** keys are standardised jointly over both tables
//! - **temporal** keys (dates and datetimes) become whole-second timestamps,
//!   then standardised
//! - **textual** keys, and any other column type, are coerced to text, split
//!   into n-grams by an [`Analyzer`], vectorised and TF-IDF weighted
//!
//! Each group is fit on the union of both tables, so main and auxiliary rows
//! land in the same space. Group outputs are concatenated side by side.
//!
//! ```rust
//! use joinx_encode::{classify_keys, EncoderBuilder};
//! use polars::prelude::*;
//!
//! let main = df!("name" => ["ana", "lala"]).unwrap();
//! let aux = df!("name" => ["ana", "lala", "nnana"]).unwrap();
//! let keys = vec!["name".to_string()];
//!
//! let groups = classify_keys(&main, &keys, &aux, &keys).unwrap();
//! let encoded = EncoderBuilder::new().build().unwrap().encode(&groups, &main, &aux).unwrap();
//! assert_eq!(encoded.main.n_rows(), 2);
//! assert_eq!(encoded.aux.n_rows(), 3);
//! ```

pub mod analyzer;
pub mod classify;
pub mod embedder;
pub mod scaler;
pub mod tfidf;
pub mod vectorizer;

pub use analyzer::{validate_ngram_range, Analyzer, NgramRange, DEFAULT_NGRAM_RANGE};
pub use classify::{classify_keys, KeyGroup, KeyGroups, KeyPair};
pub use embedder::{
    combine, encode_numeric, encode_temporal, encode_textual, EncodedPair, EncoderBuilder,
    KeyEncoder, TEXT_KEY_SEPARATOR,
};
pub use scaler::StandardScaler;
pub use tfidf::TfidfTransformer;
pub use vectorizer::{CountVectorizer, EncoderKind, HashingVectorizer, Vectorizer, DEFAULT_N_FEATURES};
