//! # joinx Core
//!
//! Core data structures for approximate table joins.
//!
//! - [`frame`] - typed views, row gather and sort order over polars data frames
//! - [`CsrMatrix`] - sparse row-major feature matrix
//! - [`NearestNeighbors`] - exact 1-nearest-neighbour search under Euclidean distance
//! - [`normalize_scores`] - batch-relative similarity scores
//!
//! ## Example
//!
//! ```rust
//! use joinx_core::{CsrMatrix, NearestNeighbors, normalize_scores};
//!
//! let aux = CsrMatrix::from_dense_rows(&[vec![0.0, 1.0], vec![3.0, 0.0]], 2).unwrap();
//! let main = CsrMatrix::from_dense_rows(&[vec![2.5, 0.0]], 2).unwrap();
//!
//! let neighbors = NearestNeighbors::fit(aux).unwrap().kneighbors(&main).unwrap();
//! assert_eq!(neighbors[0].index, 1);
//! assert_eq!(normalize_scores(&neighbors).unwrap(), vec![0.5]);
//! ```

pub mod frame;
pub mod sparse;
pub mod error;
pub mod neighbors;

/// Distance kernels over dense slices and sorted sparse rows
pub mod distance;

pub use frame::require_column;
pub use polars::prelude::DataFrame;
pub use sparse::{CsrMatrix, SparseRow};
pub use error::{Error, Result};
pub use neighbors::{NearestNeighbors, Neighbor, normalize_scores};
