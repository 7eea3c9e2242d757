// SPDX-License-Identifier: AGPL-3.0-only
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use rayon::prelude::*;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ProfileConfig {
    /// Name fragments that mark a string column as a datetime candidate.
    pub date_name_keywords: Vec<String>,
    /// chrono format strings tried during datetime coercion, in order.
    pub temporal_formats: Vec<String>,
    /// Rows shown in data previews.
    pub preview_rows: usize,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            date_name_keywords: vec![
                "date".to_string(),
                "time".to_string(),
                "created".to_string(),
                "day".to_string(),
            ],
            temporal_formats: vec![
                "%Y-%m-%d".to_string(),
                "%Y-%m-%d %H:%M:%S".to_string(),
                "%Y-%m-%dT%H:%M:%S".to_string(),
                "%Y-%m-%dT%H:%M:%SZ".to_string(),
                "%m/%d/%Y".to_string(),
                "%d/%m/%Y".to_string(),
                "%Y%m%d".to_string(),
            ],
            preview_rows: 10,
        }
    }
}

/// The three disjoint column groups the selector works from. Order within
/// each group follows table column order.
#[derive(Debug, Clone, Default)]
pub struct ColumnGroups {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    pub temporal: Vec<String>,
}

impl ColumnGroups {
    pub fn from_dataframe(df: &DataFrame) -> Self {
        let mut groups = Self::default();
        for column in df.get_columns() {
            let name = column.name().to_string();
            let dtype = column.dtype();
            if is_numeric_dtype(dtype) {
                groups.numeric.push(name);
            } else if is_temporal_dtype(dtype) {
                groups.temporal.push(name);
            } else if matches!(dtype, DataType::String) {
                groups.categorical.push(name);
            }
            // Other dtypes (booleans, lists, ...) belong to no group and are
            // invisible to chart selection.
        }
        groups
    }

    pub fn summary(&self) -> String {
        format!(
            "Available columns:\n  Numeric: {:?}\n  Categorical: {:?}\n  DateTime: {:?}",
            self.numeric, self.categorical, self.temporal
        )
    }
}

pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float64
            | DataType::Float32
            | DataType::Int64
            | DataType::Int32
            | DataType::Int16
            | DataType::Int8
            | DataType::UInt64
            | DataType::UInt32
            | DataType::UInt16
            | DataType::UInt8
    )
}

pub fn is_temporal_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Datetime(_, _) | DataType::Date)
}

/// Best-effort in-place datetime coercion. String columns whose name contains
/// a date-like keyword are converted to a datetime column when every non-null
/// value parses under a single temporal format. Failures are silent by
/// contract; the column is left as-is. Returns the names of converted columns.
pub fn coerce_datetime_columns(df: &mut DataFrame, config: &ProfileConfig) -> Vec<String> {
    let candidates: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|c| {
            matches!(c.dtype(), DataType::String) && name_looks_temporal(c.name().as_str(), config)
        })
        .map(|c| c.name().to_string())
        .collect();

    let mut converted = Vec::new();
    for name in candidates {
        let replacement = match build_datetime_series(df, &name, config) {
            Ok(series) => series,
            Err(e) => {
                debug!(column = %name, error = %e, "datetime coercion skipped");
                None
            }
        };
        if let Some(series) = replacement {
            if df.with_column(series).is_ok() {
                debug!(column = %name, "converted to datetime");
                converted.push(name);
            }
        }
    }
    converted
}

fn name_looks_temporal(name: &str, config: &ProfileConfig) -> bool {
    let lowered = name.to_lowercase();
    config
        .date_name_keywords
        .iter()
        .any(|kw| lowered.contains(kw.as_str()))
}

fn build_datetime_series(
    df: &DataFrame,
    name: &str,
    config: &ProfileConfig,
) -> PolarsResult<Option<Series>> {
    let column = df.column(name)?;
    let series = column.as_materialized_series();
    let ca = series.str()?;
    let values: Vec<Option<&str>> = ca.into_iter().collect();
    let non_null: Vec<&str> = values.iter().filter_map(|v| *v).collect();
    if non_null.is_empty() {
        return Ok(None);
    }

    // A format qualifies only when it parses every non-null value; the first
    // qualifying format in the configured order wins.
    let format = config.temporal_formats.iter().find(|fmt| {
        non_null
            .par_iter()
            .all(|v| parse_datetime(v, fmt).is_some())
    });
    let Some(format) = format else {
        return Ok(None);
    };

    let millis: Vec<Option<i64>> = values
        .iter()
        .map(|v| v.and_then(|s| parse_datetime(s, format)).map(|dt| dt.and_utc().timestamp_millis()))
        .collect();
    let series = Series::new(name.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
    Ok(Some(series))
}

fn parse_datetime(value: &str, format: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
        return Some(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, format) {
        return date.and_hms_opt(0, 0, 0);
    }
    None
}
