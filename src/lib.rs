//! # joinx
//!
//! Fuzzy joins for tabular data: merge two tables whose join keys only
//! approximately agree because of typos, formatting differences or unit drift.
//!
//! ## How it works
//!
//! 1. Key columns are classified as numeric, temporal or textual
//! 2. Each group is encoded into a vector space fit on both tables together
//!    (standardised numbers and timestamps, TF-IDF weighted n-grams for text)
//! 3. Every main row finds its nearest auxiliary row under Euclidean distance
//! 4. Distances become scores in `[0.5, 1.0]`, relative to the largest
//!    distance of the call
//! 5. Matches below `match_score` are dropped or null-filled, then the tables
//!    are merged
//!
//! ## Quick Start
//!
//! ### As a Command
//!
//! ```bash
//! joinx --left left.csv --right right.json --on name --return-score
//! ```
//!
//! Tables are read and written with polars: `.csv` files as CSV, anything
//! else as a JSON array of row objects.
//!
//! ### As a Library
//!
//! ```rust
//! use joinx::prelude::*;
//! use polars::prelude::*;
//!
//! let left = df!(
//!     "a" => ["ana", "lala", "nana"],
//!     "b" => [1i64, 2, 3],
//! )
//! .unwrap();
//! let right = df!(
//!     "a" => ["anna", "lala", "ana", "nnana"],
//!     "c" => [5i64, 6, 7, 8],
//! )
//! .unwrap();
//!
//! let options = JoinOptions::new().on(["a"]).match_score(1.0).return_score(true);
//! let joined = fuzzy_join(&left, &right, &options).unwrap();
//!
//! assert_eq!(joined.column("a_y").unwrap().str().unwrap().get(2), None);
//! let scores = joined.column("matching_score").unwrap().f64().unwrap();
//! assert_eq!(scores.get(2), Some(0.5));
//! ```
//!
//! ## Crate Structure
//!
//! - `joinx-core` - data frame access, sparse matrices, nearest-neighbour search, errors
//! - `joinx-encode` - key classification, scaling, analyzers, vectorizers
//! - `joinx-merge` - options, match resolution, merge, match reports

// Re-export core types
pub use joinx_core::{CsrMatrix, DataFrame, Error, NearestNeighbors, Neighbor, Result};

// Re-export encoders
pub use joinx_encode::{
    Analyzer, CountVectorizer, EncoderKind, HashingVectorizer, KeyGroup, NgramRange, Vectorizer,
};

// Re-export the join engine
pub use joinx_merge::{
    fuzzy_join, Columns, FuzzyJoiner, JoinConfig, JoinHow, JoinOptions, JoinOutput, JoinWarning,
    KeySpec, MatchRecord, MatchReport, SCORE_COLUMN,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        fuzzy_join, Analyzer, DataFrame, EncoderKind, Error, FuzzyJoiner, JoinHow, JoinOptions,
        KeySpec, Result, Vectorizer,
    };
}
