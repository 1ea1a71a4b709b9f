//! Key column classification
//!
//! Splits the requested join keys into encoding groups. The group of a key
//! pair is decided by the main table's column type; the auxiliary column is
//! paired positionally and checked later by the group's encoder.

use joinx_core::frame::{is_numeric, is_temporal};
use joinx_core::{require_column, DataFrame, Error, Result};
use polars::prelude::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Encoding group of a key column
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum KeyGroup {
    /// Integer and float columns - joint standard scaling
    Numeric,
    /// Date and datetime columns - second timestamps, then joint standard scaling
    Temporal,
    /// Everything else, coerced to text - n-gram vectorizer with TF-IDF weighting
    Textual,
}

impl KeyGroup {
    /// Order in which group matrices are concatenated
    pub const ORDER: [KeyGroup; 3] = [KeyGroup::Numeric, KeyGroup::Temporal, KeyGroup::Textual];

    pub fn of(dtype: &DataType) -> Self {
        if is_numeric(dtype) {
            KeyGroup::Numeric
        } else if is_temporal(dtype) {
            KeyGroup::Temporal
        } else {
            KeyGroup::Textual
        }
    }
}

impl fmt::Display for KeyGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyGroup::Numeric => "numeric",
            KeyGroup::Temporal => "temporal",
            KeyGroup::Textual => "textual",
        };
        f.write_str(name)
    }
}

/// A main-table key column and the auxiliary column it is compared with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyPair {
    pub main: String,
    pub aux: String,
}

/// Key pairs partitioned by group, in [`KeyGroup::ORDER`], empty groups omitted
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct KeyGroups {
    groups: Vec<(KeyGroup, Vec<KeyPair>)>,
}

impl KeyGroups {
    pub fn iter(&self) -> impl Iterator<Item = (KeyGroup, &[KeyPair])> + '_ {
        self.groups.iter().map(|(g, pairs)| (*g, pairs.as_slice()))
    }

    pub fn get(&self, group: KeyGroup) -> Option<&[KeyPair]> {
        self.groups
            .iter()
            .find(|(g, _)| *g == group)
            .map(|(_, pairs)| pairs.as_slice())
    }

    /// Number of active groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Partition key columns into numeric, temporal and textual groups
///
/// `main_keys[i]` is paired with `aux_keys[i]`. Both lists must have the same
/// length and every name must exist in its table.
pub fn classify_keys(
    main: &DataFrame,
    main_keys: &[String],
    aux: &DataFrame,
    aux_keys: &[String],
) -> Result<KeyGroups> {
    if main_keys.is_empty() || aux_keys.is_empty() {
        return Err(Error::MissingKeys);
    }
    if main_keys.len() != aux_keys.len() {
        return Err(Error::KeyCountMismatch {
            left: main_keys.len(),
            right: aux_keys.len(),
        });
    }

    let mut buckets: [Vec<KeyPair>; 3] = Default::default();
    for (main_key, aux_key) in main_keys.iter().zip(aux_keys) {
        let column = require_column(main, main_key, "main")?;
        require_column(aux, aux_key, "auxiliary")?;

        let slot = match KeyGroup::of(column.dtype()) {
            KeyGroup::Numeric => 0,
            KeyGroup::Temporal => 1,
            KeyGroup::Textual => 2,
        };
        buckets[slot].push(KeyPair {
            main: main_key.clone(),
            aux: aux_key.clone(),
        });
    }

    let groups = KeyGroup::ORDER
        .into_iter()
        .zip(buckets)
        .filter(|(_, pairs)| !pairs.is_empty())
        .collect();
    Ok(KeyGroups { groups })
}
