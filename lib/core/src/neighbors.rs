//! Exact nearest-neighbour search over sparse rows.
//!
//! The fitted matrix is scanned linearly for every query row; query rows are
//! spread across the rayon thread pool and results come back in query order.

use crate::distance::sparse_squared_l2;
use crate::sparse::CsrMatrix;
use crate::{Error, Result};
use rayon::prelude::*;
use serde::Serialize;

/// Closest fitted row for one query row
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    /// Row index in the fitted matrix
    pub index: usize,
    /// Euclidean distance to that row
    pub distance: f64,
}

/// Brute-force 1-nearest-neighbour index under Euclidean distance
#[derive(Debug, Clone)]
pub struct NearestNeighbors {
    fitted: CsrMatrix,
}

impl NearestNeighbors {
    /// Index the rows to search. At least one row is required.
    pub fn fit(fitted: CsrMatrix) -> Result<Self> {
        if fitted.n_rows() == 0 {
            return Err(Error::EmptyTable("auxiliary"));
        }
        Ok(Self { fitted })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fitted.n_rows()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fitted.n_rows() == 0
    }

    /// Nearest fitted row for every query row. Ties go to the lowest index.
    pub fn kneighbors(&self, queries: &CsrMatrix) -> Result<Vec<Neighbor>> {
        if queries.n_cols() != self.fitted.n_cols() {
            return Err(Error::InvalidDimension {
                expected: self.fitted.n_cols(),
                actual: queries.n_cols(),
            });
        }

        let neighbors = (0..queries.n_rows())
            .into_par_iter()
            .map(|q| self.nearest(q, queries))
            .collect();
        Ok(neighbors)
    }

    fn nearest(&self, q: usize, queries: &CsrMatrix) -> Neighbor {
        let query = queries.row(q);
        let mut best = Neighbor {
            index: 0,
            distance: f64::INFINITY,
        };
        for (index, candidate) in self.fitted.rows().enumerate() {
            let d2 = sparse_squared_l2(query, candidate);
            // Strict comparison keeps the lowest index on ties
            if d2 < best.distance {
                best = Neighbor { index, distance: d2 };
            }
        }
        best.distance = best.distance.sqrt();
        best
    }
}

/// Map raw distances to similarity scores in `[0.5, 1.0]`
///
/// Distances are divided by the largest distance in the batch, then
/// `score = 1 - d / 2`. Scores are only comparable within one batch. A batch
/// whose largest distance is zero scores every row `1.0`. A non-finite
/// distance is an error, since it would turn every score into NaN.
pub fn normalize_scores(neighbors: &[Neighbor]) -> Result<Vec<f64>> {
    if let Some(bad) = neighbors.iter().find(|n| !n.distance.is_finite()) {
        return Err(Error::NonFiniteDistance(bad.distance));
    }
    let max = neighbors
        .iter()
        .map(|n| n.distance)
        .fold(0.0f64, f64::max);

    Ok(neighbors
        .iter()
        .map(|n| {
            if max > 0.0 {
                1.0 - (n.distance / max) / 2.0
            } else {
                1.0
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense(rows: &[Vec<f64>]) -> CsrMatrix {
        CsrMatrix::from_dense_rows(rows, rows[0].len()).unwrap()
    }

    #[test]
    fn test_nearest_row() {
        let aux = dense(&[vec![0.0, 0.0], vec![10.0, 0.0], vec![0.0, 5.0]]);
        let main = dense(&[vec![9.0, 0.0], vec![0.0, 4.0], vec![0.0, 0.0]]);
        let nn = NearestNeighbors::fit(aux).unwrap();
        let found = nn.kneighbors(&main).unwrap();
        let indices: Vec<usize> = found.iter().map(|n| n.index).collect();
        assert_eq!(indices, vec![1, 2, 0]);
        assert!((found[0].distance - 1.0).abs() < 1e-12);
        assert_eq!(found[2].distance, 0.0);
    }

    #[test]
    fn test_ties_prefer_lowest_index() {
        let aux = dense(&[vec![1.0], vec![-1.0], vec![1.0]]);
        let main = dense(&[vec![0.0]]);
        let found = NearestNeighbors::fit(aux).unwrap().kneighbors(&main).unwrap();
        assert_eq!(found[0].index, 0);
    }

    #[test]
    fn test_empty_fit_rejected() {
        assert!(matches!(
            NearestNeighbors::fit(CsrMatrix::empty(3)),
            Err(Error::EmptyTable("auxiliary"))
        ));
    }

    #[test]
    fn test_dimension_mismatch() {
        let nn = NearestNeighbors::fit(dense(&[vec![1.0, 2.0]])).unwrap();
        assert!(nn.kneighbors(&dense(&[vec![1.0]])).is_err());
    }

    #[test]
    fn test_normalize_scores() {
        let ns = [
            Neighbor { index: 0, distance: 0.0 },
            Neighbor { index: 1, distance: 2.0 },
            Neighbor { index: 2, distance: 1.0 },
        ];
        assert_eq!(normalize_scores(&ns).unwrap(), vec![1.0, 0.5, 0.75]);

        let exact = [Neighbor { index: 0, distance: 0.0 }];
        assert_eq!(normalize_scores(&exact).unwrap(), vec![1.0]);
        assert!(normalize_scores(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_normalize_scores_rejects_non_finite() {
        let ns = [
            Neighbor { index: 0, distance: 1.0 },
            Neighbor { index: 0, distance: f64::INFINITY },
        ];
        assert!(matches!(normalize_scores(&ns), Err(Error::NonFiniteDistance(d)) if d.is_infinite()));

        let nan = [Neighbor { index: 0, distance: f64::NAN }];
        assert!(matches!(normalize_scores(&nan), Err(Error::NonFiniteDistance(_))));
    }

    proptest::proptest! {
        #[test]
        fn prop_scores_stay_between_half_and_one(
            distances in proptest::collection::vec(0.0f64..1e6, 1..64)
        ) {
            let ns: Vec<Neighbor> = distances
                .iter()
                .enumerate()
                .map(|(index, &distance)| Neighbor { index, distance })
                .collect();
            for score in normalize_scores(&ns).unwrap() {
                proptest::prop_assert!((0.5..=1.0).contains(&score));
            }
        }
    }
}
