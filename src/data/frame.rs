//! Small helpers over polars frames shared by the feature steps and the preprocessing code

use crate::error::{PricingError, Result};
use polars::prelude::*;

/// Whether `df` has a column called `name`
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_index(name).is_some()
}

/// Whether `df` has every column in `names`
pub fn has_columns(df: &DataFrame, names: &[&str]) -> bool {
    names.iter().all(|name| has_column(df, name))
}

/// Read a column as `f64`, casting integer columns. Nulls stay `None`.
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| PricingError::MissingColumn(name.to_string()))?;
    let casted = column.as_materialized_series().cast(&DataType::Float64)?;
    let values = casted.f64()?.into_iter().collect();
    Ok(values)
}

/// Read a column as strings, casting non-string columns.
pub fn str_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| PricingError::MissingColumn(name.to_string()))?;
    let casted = column.as_materialized_series().cast(&DataType::String)?;
    let values = casted
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect();
    Ok(values)
}

/// Replace a column in place, or append it when absent
pub fn set_column(df: &mut DataFrame, series: Series) -> Result<()> {
    df.with_column(series)?;
    Ok(())
}

/// Drop a column if it is present
pub fn drop_if_present(df: &mut DataFrame, name: &str) -> Result<bool> {
    if !has_column(df, name) {
        return Ok(false);
    }
    df.drop_in_place(name)?;
    Ok(true)
}

/// Select rows by position
pub fn take_rows(df: &DataFrame, indices: &[usize]) -> Result<DataFrame> {
    let idx = IdxCa::from_vec(
        "idx".into(),
        indices.iter().map(|&i| i as IdxSize).collect(),
    );
    Ok(df.take(&idx)?)
}

/// Whether the column holds numbers (integers, floats or booleans)
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
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
            | DataType::Boolean
    )
}

/// Whether the column holds categorical text
pub fn is_text_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::String)
}
