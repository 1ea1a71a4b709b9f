//! Column access over polars data frames.
//!
//! Join inputs and outputs are [`DataFrame`]s. The helpers here give the
//! encoders typed views of key columns (numbers as `f64`, datetimes as UNIX
//! seconds, anything else as text) and the merge step its row gather and
//! sort order.

use crate::{Error, Result};
use chrono::NaiveDateTime;
use polars::prelude::{
    Column, DataFrame, DataType, IdxCa, IdxSize, NewChunkedArray, SortMultipleOptions, TimeUnit,
};

/// Scratch column carrying original row positions while sorting
const ROW_COLUMN: &str = "__joinx_row";

/// Look up a column, naming the table in the error when it is absent
pub fn require_column<'a>(df: &'a DataFrame, name: &str, table: &'static str) -> Result<&'a Column> {
    df.column(name).map_err(|_| Error::ColumnNotFound {
        table,
        name: name.to_string(),
    })
}

#[inline]
pub fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

#[inline]
pub fn is_temporal(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Date | DataType::Datetime(_, _))
}

fn type_error(column: &Column, expected: &'static str) -> Error {
    Error::ColumnType {
        name: column.name().to_string(),
        expected,
        actual: column.dtype().to_string(),
    }
}

/// Numeric column as `f64`. Nulls and NaN are `None`.
pub fn float_values(column: &Column) -> Result<Vec<Option<f64>>> {
    if !is_numeric(column.dtype()) {
        return Err(type_error(column, "numeric"));
    }
    let floats = column.cast(&DataType::Float64)?;
    Ok(floats
        .f64()?
        .iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Date or datetime column as whole UNIX seconds
pub fn timestamp_seconds(column: &Column) -> Result<Vec<Option<f64>>> {
    let column = match column.dtype() {
        DataType::Date => column.cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?,
        _ => column.clone(),
    };
    let per_second: i64 = match column.dtype() {
        DataType::Datetime(TimeUnit::Nanoseconds, _) => 1_000_000_000,
        DataType::Datetime(TimeUnit::Microseconds, _) => 1_000_000,
        DataType::Datetime(TimeUnit::Milliseconds, _) => 1_000,
        _ => return Err(type_error(&column, "datetime")),
    };
    let physical = column.cast(&DataType::Int64)?;
    Ok(physical
        .i64()?
        .iter()
        .map(|v| v.map(|t| t.div_euclid(per_second) as f64))
        .collect())
}

/// Any column coerced to text. Nulls become the empty string.
pub fn text_values(column: &Column) -> Result<Vec<String>> {
    let text = column.cast(&DataType::String)?;
    Ok(text
        .str()?
        .iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect())
}

/// Whether the column holds nulls, or NaN in a float column
pub fn has_missing(column: &Column) -> Result<bool> {
    if column.null_count() > 0 {
        return Ok(true);
    }
    match column.dtype() {
        DataType::Float32 | DataType::Float64 => {
            Ok(float_values(column)?.iter().any(Option::is_none))
        }
        _ => Ok(false),
    }
}

/// Millisecond datetime column from naive (UTC) timestamps
pub fn datetime_column(name: &str, values: &[NaiveDateTime]) -> Result<Column> {
    let millis: Vec<i64> = values.iter().map(|v| v.and_utc().timestamp_millis()).collect();
    Ok(Column::new(name.into(), millis).cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?)
}

/// Gather rows by index. A `None` index produces a row of nulls.
pub fn take_rows(df: &DataFrame, rows: &[Option<usize>]) -> Result<DataFrame> {
    let indices = IdxCa::from_iter_options(
        "rows".into(),
        rows.iter().map(|r| r.map(|i| i as IdxSize)),
    );
    Ok(df.take(&indices)?)
}

/// Row order that sorts the frame by the given columns, lexicographically
/// and stably, with nulls last
pub fn sorted_order(df: &DataFrame, by: &[String]) -> Result<Vec<usize>> {
    let mut names: Vec<String> = Vec::with_capacity(by.len());
    for name in by {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }

    let mut columns = names
        .iter()
        .map(|name| require_column(df, name, "sorted").cloned())
        .collect::<Result<Vec<Column>>>()?;
    let positions: Vec<u64> = (0..df.height() as u64).collect();
    columns.push(Column::new(ROW_COLUMN.into(), positions));

    let options = SortMultipleOptions::default()
        .with_maintain_order(true)
        .with_nulls_last(true);
    let sorted = DataFrame::new(columns)?.sort(names, options)?;
    Ok(sorted
        .column(ROW_COLUMN)?
        .u64()?
        .iter()
        .flatten()
        .map(|r| r as usize)
        .collect())
}
