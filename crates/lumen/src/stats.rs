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

use crate::error::DataError;
use indexmap::IndexMap;
use polars::prelude::*;
use serde::Serialize;

/// Pairwise Pearson correlation over a set of numeric columns.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major, `values[i][j]` is corr(columns[i], columns[j]).
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let width = self
            .columns
            .iter()
            .map(|c| c.len())
            .max()
            .unwrap_or(8)
            .max(8);
        out.push_str(&format!("{:width$}", "", width = width + 1));
        for col in &self.columns {
            out.push_str(&format!("{col:>width$} ", width = width));
        }
        out.push('\n');
        for (i, col) in self.columns.iter().enumerate() {
            out.push_str(&format!("{col:<width$} ", width = width));
            for value in &self.values[i] {
                if value.is_nan() {
                    out.push_str(&format!("{:>width$} ", "NaN", width = width));
                } else {
                    out.push_str(&format!("{value:>width$.3} ", width = width));
                }
            }
            out.push('\n');
        }
        out
    }
}

fn column_f64(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, DataError> {
    let column = df
        .column(name)
        .map_err(|_| DataError::ColumnNotFound {
            column: name.to_string(),
        })?;
    let series = column
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|_| DataError::NotNumeric {
            column: name.to_string(),
        })?;
    Ok(series.f64()?.into_iter().collect())
}

fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    // Pairwise-complete observations only.
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b.iter())
        .filter_map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some((*x, *y)),
            _ => None,
        })
        .collect();
    let n = pairs.len() as f64;
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    let denom = (var_x * var_y).sqrt();
    if denom < f64::EPSILON {
        return f64::NAN;
    }
    cov / denom
}

/// Correlation matrix over the named numeric columns. The diagonal is exactly
/// 1.0; off-diagonal entries may be NaN for degenerate inputs.
pub fn correlation_matrix(
    df: &DataFrame,
    columns: &[String],
) -> Result<CorrelationMatrix, DataError> {
    if columns.len() < 2 {
        return Err(DataError::Parsing(
            "correlation requires at least 2 numeric columns".to_string(),
        ));
    }
    let extracted: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|name| column_f64(df, name))
        .collect::<Result<_, _>>()?;
    let n = columns.len();
    let mut values = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            values[i][j] = if i == j {
                1.0
            } else if j < i {
                values[j][i]
            } else {
                pearson(&extracted[i], &extracted[j])
            };
        }
    }
    Ok(CorrelationMatrix {
        columns: columns.to_vec(),
        values,
    })
}

/// Frequency counts over a column's distinct values, descending by count with
/// ties in first-appearance order. Nulls are excluded.
pub fn value_counts(df: &DataFrame, column: &str) -> Result<Vec<(String, u32)>, DataError> {
    let col = df
        .column(column)
        .map_err(|_| DataError::ColumnNotFound {
            column: column.to_string(),
        })?;
    let series = col.as_materialized_series().cast(&DataType::String)?;
    let ca = series.str()?;
    let mut counts: IndexMap<String, u32> = IndexMap::new();
    for value in ca.into_iter().flatten() {
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }
    let mut out: Vec<(String, u32)> = counts.into_iter().collect();
    out.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_column_matrix_has_unit_diagonal() {
        let df = df!(
            "a" => &[1.0, 2.0, 3.0, 4.0],
            "b" => &[2.0, 4.0, 6.0, 8.0],
        )
        .unwrap();
        let m = correlation_matrix(&df, &["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(m.values.len(), 2);
        assert_eq!(m.values[0].len(), 2);
        assert!((m.values[0][0] - 1.0).abs() < 1e-12);
        assert!((m.values[1][1] - 1.0).abs() < 1e-12);
        assert!((m.values[0][1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn anticorrelated_columns() {
        let df = df!(
            "up" => &[1.0, 2.0, 3.0],
            "down" => &[3.0, 2.0, 1.0],
        )
        .unwrap();
        let m = correlation_matrix(&df, &["up".to_string(), "down".to_string()]).unwrap();
        assert!((m.values[0][1] + 1.0).abs() < 1e-9);
    }

    #[test]
    fn constant_column_yields_nan() {
        let df = df!(
            "a" => &[1.0, 2.0, 3.0],
            "c" => &[5.0, 5.0, 5.0],
        )
        .unwrap();
        let m = correlation_matrix(&df, &["a".to_string(), "c".to_string()]).unwrap();
        assert!(m.values[0][1].is_nan());
        assert!((m.values[1][1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn value_counts_descending() {
        let df = df!("kind" => &["a", "b", "a", "c", "a", "b"]).unwrap();
        let counts = value_counts(&df, "kind").unwrap();
        assert_eq!(
            counts,
            vec![
                ("a".to_string(), 3),
                ("b".to_string(), 2),
                ("c".to_string(), 1)
            ]
        );
    }

    #[test]
    fn value_counts_on_integers() {
        let df = df!("code" => &[1i64, 1, 2]).unwrap();
        let counts = value_counts(&df, "code").unwrap();
        assert_eq!(counts[0].1, 2);
    }
}
