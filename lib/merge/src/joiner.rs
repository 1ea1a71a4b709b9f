//! Fuzzy join pipeline
//!
//! ```text
//! keys ──> classify ──> encode (numeric | temporal | textual) ──> hstack
//!                                                                   │
//!  output <── merge <── resolve (threshold, drop or null) <── 1-NN search
//! ```
//!
//! Every stage runs inside one [`FuzzyJoiner::join`] call and nothing fitted
//! outlives it.

use crate::options::{JoinHow, JoinOptions};
use crate::report::MatchReport;
use joinx_core::frame::{has_missing, sorted_order, take_rows};
use joinx_core::{normalize_scores, require_column, DataFrame, Error, NearestNeighbors, Result};
use joinx_encode::{classify_keys, EncoderBuilder, KeyEncoder};
use polars::prelude::Column;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

/// Name of the appended score column
pub const SCORE_COLUMN: &str = "matching_score";

/// Non-fatal conditions noticed during a join
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JoinWarning {
    /// The join interface may still change
    Experimental,
    /// Main key columns holding missing values. Matches for those rows are
    /// arbitrary.
    MissingKeyValues { columns: Vec<String> },
}

impl fmt::Display for JoinWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinWarning::Experimental => {
                f.write_str("fuzzy join is experimental and its interface may change")
            }
            JoinWarning::MissingKeyValues { columns } => write!(
                f,
                "merging on missing values in {}; those rows get random or missing matches",
                columns.join(", ")
            ),
        }
    }
}

/// Result of a join
#[derive(Debug, Clone)]
pub struct JoinOutput {
    pub table: DataFrame,
    pub report: MatchReport,
    pub warnings: Vec<JoinWarning>,
}

/// Joins two tables on approximately matching keys
#[derive(Debug, Clone)]
pub struct FuzzyJoiner {
    options: JoinOptions,
}

impl FuzzyJoiner {
    /// Validate the options up front so a bad configuration fails before any
    /// table is touched
    pub fn new(options: JoinOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &JoinOptions {
        &self.options
    }

    fn key_encoder(&self) -> Result<KeyEncoder> {
        EncoderBuilder::new()
            .analyzer(self.options.analyzer)
            .ngram_range(self.options.ngram_range)
            .vectorizer(self.options.text_vectorizer())
            .build()
    }

    /// Match every main row to its closest auxiliary row and merge the two
    pub fn join(&self, left: &DataFrame, right: &DataFrame) -> Result<JoinOutput> {
        let options = &self.options;
        let mut warnings = vec![JoinWarning::Experimental];
        warn!("{}", JoinWarning::Experimental);

        let (left_keys, right_keys) = options.keys.as_ref().ok_or(Error::MissingKeys)?.columns();
        let (main, aux, main_keys, aux_keys) = match options.how {
            JoinHow::Left => (left, right, left_keys, right_keys),
            JoinHow::Right => (right, left, right_keys, left_keys),
        };

        let groups = classify_keys(main, main_keys, aux, aux_keys)?;

        let mut null_keys: Vec<String> = Vec::new();
        for key in main_keys {
            if has_missing(require_column(main, key, "main")?)? {
                null_keys.push(key.clone());
            }
        }
        if !null_keys.is_empty() {
            let warning = JoinWarning::MissingKeyValues { columns: null_keys };
            warn!("{}", warning);
            warnings.push(warning);
        }

        let report = if main.height() == 0 {
            MatchReport::resolve(&[], &[], options.match_score)
        } else {
            if aux.height() == 0 {
                return Err(Error::EmptyTable("auxiliary"));
            }
            let encoded = self.key_encoder()?.encode(&groups, main, aux)?;
            debug!(
                main_rows = main.height(),
                aux_rows = aux.height(),
                features = encoded.n_features(),
                "encoded join keys"
            );

            let neighbors = NearestNeighbors::fit(encoded.aux)?.kneighbors(&encoded.main)?;
            let scores = normalize_scores(&neighbors)?;
            MatchReport::resolve(&neighbors, &scores, options.match_score)
        };
        debug!(
            accepted = report.stats.accepted,
            rejected = report.stats.rejected,
            threshold = options.match_score,
            "resolved matches"
        );

        let rows = self.output_rows(main, main_keys, &report)?;
        let table = self.merge(main, aux, &rows, &report)?;
        debug!(rows = table.height(), columns = table.width(), "merged tables");

        Ok(JoinOutput {
            table,
            report,
            warnings,
        })
    }

    /// Main rows that make it into the output, in output order
    fn output_rows(&self, main: &DataFrame, main_keys: &[String], report: &MatchReport) -> Result<Vec<usize>> {
        let order = if self.options.sort {
            sorted_order(main, main_keys)?
        } else {
            (0..main.height()).collect()
        };

        if !self.options.drop_unmatched {
            return Ok(order);
        }
        Ok(order
            .into_iter()
            .filter(|&row| report.record(row).is_some_and(|r| r.accepted))
            .collect())
    }

    /// Gather matched rows side by side, left table's columns first
    fn merge(&self, main: &DataFrame, aux: &DataFrame, rows: &[usize], report: &MatchReport) -> Result<DataFrame> {
        let main_index: Vec<Option<usize>> = rows.iter().map(|&r| Some(r)).collect();
        // rejected rows gather nothing, which nulls every auxiliary column
        let aux_index: Vec<Option<usize>> = rows
            .iter()
            .map(|&r| report.record(r).filter(|m| m.accepted).map(|m| m.aux_row))
            .collect();

        let main_part = take_rows(main, &main_index)?;
        let aux_part = take_rows(aux, &aux_index)?;
        let (left, right) = match self.options.how {
            JoinHow::Left => (main_part, aux_part),
            JoinHow::Right => (aux_part, main_part),
        };

        let mut columns = suffix_overlapping(left, right, &self.options.suffixes)?;
        if self.options.return_score {
            let scores: Vec<Option<f64>> = rows
                .iter()
                .map(|&r| report.record(r).map(|m| m.score))
                .collect();
            let score = Column::new(SCORE_COLUMN.into(), scores);
            match columns.iter_mut().find(|c| c.name().as_str() == SCORE_COLUMN) {
                Some(existing) => {
                    warn!("overwriting existing column {}", SCORE_COLUMN);
                    *existing = score;
                }
                None => columns.push(score),
            }
        }
        Ok(DataFrame::new(columns)?)
    }
}

/// Concatenate the columns of both tables, suffixing names found in both
fn suffix_overlapping(
    left: DataFrame,
    right: DataFrame,
    (left_suffix, right_suffix): &(String, String),
) -> Result<Vec<Column>> {
    let left_names: HashSet<String> = left.get_column_names().iter().map(|n| n.to_string()).collect();
    let right_names: HashSet<String> = right.get_column_names().iter().map(|n| n.to_string()).collect();

    let overlap: Vec<&String> = left_names.intersection(&right_names).collect();
    if !overlap.is_empty() && left_suffix.is_empty() && right_suffix.is_empty() {
        let mut names: Vec<&str> = overlap.iter().map(|s| s.as_str()).collect();
        names.sort_unstable();
        return Err(Error::SuffixCollision(names.join(", ")));
    }

    let rename = |column: Column, others: &HashSet<String>, suffix: &str| {
        if others.contains(column.name().as_str()) {
            let name = format!("{}{}", column.name(), suffix);
            column.with_name(name.into())
        } else {
            column
        }
    };
    let mut columns: Vec<Column> = left
        .take_columns()
        .into_iter()
        .map(|c| rename(c, &right_names, left_suffix))
        .collect();
    columns.extend(
        right
            .take_columns()
            .into_iter()
            .map(|c| rename(c, &left_names, right_suffix)),
    );
    Ok(columns)
}

/// Join `left` and `right` on approximately matching keys
///
/// Shorthand for [`FuzzyJoiner::new`] followed by [`FuzzyJoiner::join`],
/// keeping only the table.
pub fn fuzzy_join(left: &DataFrame, right: &DataFrame, options: &JoinOptions) -> Result<DataFrame> {
    FuzzyJoiner::new(options.clone())?
        .join(left, right)
        .map(|output| output.table)
}
