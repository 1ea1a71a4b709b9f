//! # joinx Merge
//!
//! Joins two tables whose keys only approximately agree.
//!
//! Each row of the main table (the left one for [`JoinHow::Left`], the right
//! one for [`JoinHow::Right`]) is matched to its closest auxiliary row in a
//! shared encoding of the key columns. Matches scoring below the threshold are
//! either dropped or kept with their auxiliary columns set to null.
//!
//! ```rust
//! use joinx_merge::{fuzzy_join, JoinOptions};
//! use polars::prelude::*;
//!
//! let left = df!("country" => ["France", "Germny"]).unwrap();
//! let right = df!(
//!     "country" => ["germany", "france"],
//!     "capital" => ["Berlin", "Paris"],
//! )
//! .unwrap();
//!
//! let options = JoinOptions::new().on(["country"]).return_score(true);
//! let joined = fuzzy_join(&left, &right, &options).unwrap();
//!
//! let capital = joined.column("capital").unwrap().str().unwrap();
//! assert_eq!(capital.get(1), Some("Berlin"));
//! let names: Vec<&str> = joined.get_column_names().iter().map(|n| n.as_str()).collect();
//! assert_eq!(names, ["country_x", "country_y", "capital", "matching_score"]);
//! ```

pub mod joiner;
pub mod options;
pub mod report;

pub use joiner::{fuzzy_join, FuzzyJoiner, JoinOutput, JoinWarning, SCORE_COLUMN};
pub use options::{Columns, JoinConfig, JoinHow, JoinOptions, KeySpec};
pub use report::{MatchRecord, MatchReport, MatchStats};
