//! Match report
//!
//! Per-row view of how each main row was resolved, for inspection alongside
//! the joined table.

use joinx_core::Neighbor;
use serde::Serialize;

/// Nearest auxiliary row found for one main row
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchRecord {
    /// Row of the main table
    pub main_row: usize,
    /// Closest row of the auxiliary table
    pub aux_row: usize,
    /// Euclidean distance in the encoded space
    pub distance: f64,
    /// Batch-relative similarity in `[0.5, 1.0]`
    pub score: f64,
    /// Whether the score reached the threshold
    pub accepted: bool,
}

/// Summary statistics over all main rows
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MatchStats {
    pub rows: usize,
    pub accepted: usize,
    pub rejected: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_score: Option<f64>,
    /// Distance that maps to the lowest score
    pub max_distance: f64,
}

impl MatchStats {
    pub fn compute(records: &[MatchRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let accepted = records.iter().filter(|r| r.accepted).count();
        let min_score = records.iter().map(|r| r.score).fold(f64::INFINITY, f64::min);
        let mean_score = records.iter().map(|r| r.score).sum::<f64>() / records.len() as f64;
        let max_distance = records.iter().map(|r| r.distance).fold(0.0, f64::max);

        Self {
            rows: records.len(),
            accepted,
            rejected: records.len() - accepted,
            min_score: Some(min_score),
            mean_score: Some(mean_score),
            max_distance,
        }
    }
}

/// Every main row's match plus summary statistics
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MatchReport {
    /// Acceptance threshold the records were resolved against
    pub threshold: f64,
    pub stats: MatchStats,
    pub records: Vec<MatchRecord>,
}

impl MatchReport {
    /// Resolve neighbours and their scores against a threshold
    pub fn resolve(neighbors: &[Neighbor], scores: &[f64], threshold: f64) -> Self {
        let records: Vec<MatchRecord> = neighbors
            .iter()
            .zip(scores)
            .enumerate()
            .map(|(main_row, (n, &score))| MatchRecord {
                main_row,
                aux_row: n.index,
                distance: n.distance,
                score,
                accepted: score >= threshold,
            })
            .collect();

        Self {
            threshold,
            stats: MatchStats::compute(&records),
            records,
        }
    }

    pub fn record(&self, main_row: usize) -> Option<&MatchRecord> {
        self.records.get(main_row)
    }

    pub fn accepted(&self) -> impl Iterator<Item = &MatchRecord> + '_ {
        self.records.iter().filter(|r| r.accepted)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}
