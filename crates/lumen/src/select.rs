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

use crate::classify::ChartKind;
use crate::profile::ColumnGroups;
use polars::prelude::DataFrame;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectError {
    #[error("insufficient columns for requested {kind} chart: needs {needed}")]
    InsufficientColumns {
        kind: ChartKind,
        needed: &'static str,
    },
}

/// A transient per-call decision: which chart to draw over which columns.
#[derive(Debug, Clone, Serialize)]
pub struct ChartPlan {
    pub kind: ChartKind,
    pub x: Option<String>,
    pub y: Option<String>,
    /// All participating columns for matrix-shaped charts (heatmap).
    pub series: Vec<String>,
    pub title: String,
}

impl ChartPlan {
    fn xy(kind: ChartKind, x: String, y: String, title: String) -> Self {
        Self {
            kind,
            x: Some(x),
            y: Some(y),
            series: Vec::new(),
            title,
        }
    }

    fn single(kind: ChartKind, x: String, title: String) -> Self {
        Self {
            kind,
            x: Some(x),
            y: None,
            series: Vec::new(),
            title,
        }
    }
}

fn first_two_columns(df: &DataFrame) -> Option<(String, String)> {
    let columns = df.get_columns();
    if columns.len() >= 2 {
        Some((columns[0].name().to_string(), columns[1].name().to_string()))
    } else {
        None
    }
}

/// Pick axis columns for an explicitly requested chart kind. The preference
/// ladder per kind is fixed; a kind whose column preconditions cannot be met
/// yields an `InsufficientColumns` error which the pipeline converts into a
/// notice rather than a silent no-op.
pub fn select_columns(
    kind: ChartKind,
    groups: &ColumnGroups,
    df: &DataFrame,
) -> Result<ChartPlan, SelectError> {
    match kind {
        ChartKind::Bar => {
            let pair = if !groups.temporal.is_empty() && !groups.numeric.is_empty() {
                Some((groups.temporal[0].clone(), groups.numeric[0].clone()))
            } else if !groups.categorical.is_empty() && !groups.numeric.is_empty() {
                Some((groups.categorical[0].clone(), groups.numeric[0].clone()))
            } else {
                first_two_columns(df)
            };
            let (x, y) = pair.ok_or(SelectError::InsufficientColumns {
                kind,
                needed: "an x column and a numeric y column",
            })?;
            let title = format!("Bar Chart: {y} by {x}");
            Ok(ChartPlan::xy(kind, x, y, title))
        }
        ChartKind::Line => {
            // Unlike bar, line skips the categorical tier and goes straight
            // from temporal+numeric to positional columns.
            let pair = if !groups.temporal.is_empty() && !groups.numeric.is_empty() {
                Some((groups.temporal[0].clone(), groups.numeric[0].clone()))
            } else {
                first_two_columns(df)
            };
            let (x, y) = pair.ok_or(SelectError::InsufficientColumns {
                kind,
                needed: "an x column and a numeric y column",
            })?;
            let title = format!("Line Chart: {y} over {x}");
            Ok(ChartPlan::xy(kind, x, y, title))
        }
        ChartKind::Scatter => {
            if groups.numeric.len() >= 2 {
                let x = groups.numeric[0].clone();
                let y = groups.numeric[1].clone();
                let title = format!("Scatter Plot: {y} vs {x}");
                Ok(ChartPlan::xy(kind, x, y, title))
            } else {
                Err(SelectError::InsufficientColumns {
                    kind,
                    needed: "at least 2 numeric columns",
                })
            }
        }
        ChartKind::Pie => {
            if let Some(col) = groups.categorical.first() {
                let title = format!("Distribution of {col}");
                Ok(ChartPlan::single(kind, col.clone(), title))
            } else {
                Err(SelectError::InsufficientColumns {
                    kind,
                    needed: "at least 1 categorical column",
                })
            }
        }
        ChartKind::Histogram => {
            if let Some(col) = groups.numeric.first() {
                let title = format!("Histogram of {col}");
                Ok(ChartPlan::single(kind, col.clone(), title))
            } else {
                Err(SelectError::InsufficientColumns {
                    kind,
                    needed: "at least 1 numeric column",
                })
            }
        }
        ChartKind::Heatmap => {
            if groups.numeric.len() >= 2 {
                Ok(ChartPlan {
                    kind,
                    x: None,
                    y: None,
                    series: groups.numeric.clone(),
                    title: "Correlation Heatmap".to_string(),
                })
            } else {
                Err(SelectError::InsufficientColumns {
                    kind,
                    needed: "at least 2 numeric columns",
                })
            }
        }
    }
}

/// The default path when no keyword matched: time series get a line chart,
/// categorical+numeric tables get a bar chart, anything else gets no chart.
pub fn default_plan(groups: &ColumnGroups, df: &DataFrame) -> Option<ChartPlan> {
    if !groups.temporal.is_empty() && !groups.numeric.is_empty() {
        select_columns(ChartKind::Line, groups, df).ok()
    } else if !groups.categorical.is_empty() && !groups.numeric.is_empty() {
        select_columns(ChartKind::Bar, groups, df).ok()
    } else {
        None
    }
}

/// Textual suggestions for the default path's final branch, conditioned on
/// which column-type groups are populated.
pub fn suggestions(groups: &ColumnGroups) -> Vec<String> {
    let mut out = Vec::new();
    if !groups.categorical.is_empty() && !groups.numeric.is_empty() {
        out.push("Try: 'Create a bar chart'".to_string());
    }
    if groups.numeric.len() >= 2 {
        out.push("Try: 'Create a scatter plot'".to_string());
        out.push("Try: 'Show correlation heatmap'".to_string());
    }
    if !groups.temporal.is_empty() {
        out.push("Try: 'Create a line chart over time'".to_string());
    }
    if !groups.categorical.is_empty() {
        out.push("Try: 'Create a pie chart'".to_string());
    }
    if !groups.numeric.is_empty() {
        out.push("Try: 'Create a histogram'".to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn sample() -> (DataFrame, ColumnGroups) {
        let df = df!(
            "region" => &["east", "west", "east"],
            "sales" => &[10i64, 20, 30],
            "margin" => &[0.1, 0.2, 0.3],
        )
        .unwrap();
        let groups = ColumnGroups::from_dataframe(&df);
        (df, groups)
    }

    #[test]
    fn bar_prefers_categorical_numeric() {
        let (df, groups) = sample();
        let plan = select_columns(ChartKind::Bar, &groups, &df).unwrap();
        assert_eq!(plan.x.as_deref(), Some("region"));
        assert_eq!(plan.y.as_deref(), Some("sales"));
    }

    #[test]
    fn bar_falls_back_to_first_two_columns() {
        let df = df!("a" => &["x", "y"], "b" => &["p", "q"]).unwrap();
        let groups = ColumnGroups::from_dataframe(&df);
        let plan = select_columns(ChartKind::Bar, &groups, &df).unwrap();
        assert_eq!(plan.x.as_deref(), Some("a"));
        assert_eq!(plan.y.as_deref(), Some("b"));
    }

    #[test]
    fn bar_with_single_column_fails() {
        let df = df!("a" => &["x", "y"]).unwrap();
        let groups = ColumnGroups::from_dataframe(&df);
        assert!(select_columns(ChartKind::Bar, &groups, &df).is_err());
    }

    #[test]
    fn scatter_uses_first_two_numerics() {
        let (df, groups) = sample();
        let plan = select_columns(ChartKind::Scatter, &groups, &df).unwrap();
        assert_eq!(plan.x.as_deref(), Some("sales"));
        assert_eq!(plan.y.as_deref(), Some("margin"));
    }

    #[test]
    fn pie_requires_categorical() {
        let df = df!("a" => &[1i64, 2], "b" => &[3i64, 4]).unwrap();
        let groups = ColumnGroups::from_dataframe(&df);
        let err = select_columns(ChartKind::Pie, &groups, &df).unwrap_err();
        assert!(matches!(
            err,
            SelectError::InsufficientColumns {
                kind: ChartKind::Pie,
                ..
            }
        ));
    }

    #[test]
    fn heatmap_takes_all_numeric_columns() {
        let (df, groups) = sample();
        let plan = select_columns(ChartKind::Heatmap, &groups, &df).unwrap();
        assert_eq!(plan.series, vec!["sales", "margin"]);
    }

    #[test]
    fn default_plan_prefers_line_for_time_series() {
        let mut df = df!(
            "created" => &["2024-01-01", "2024-01-02"],
            "total" => &[5i64, 6],
        )
        .unwrap();
        crate::profile::coerce_datetime_columns(&mut df, &crate::profile::ProfileConfig::default());
        let groups = ColumnGroups::from_dataframe(&df);
        let plan = default_plan(&groups, &df).unwrap();
        assert_eq!(plan.kind, ChartKind::Line);
        assert_eq!(plan.x.as_deref(), Some("created"));
    }

    #[test]
    fn default_plan_none_for_numeric_only() {
        let df = df!("a" => &[1i64, 2], "b" => &[3i64, 4]).unwrap();
        let groups = ColumnGroups::from_dataframe(&df);
        assert!(default_plan(&groups, &df).is_none());
    }

    #[test]
    fn suggestions_limited_by_groups() {
        let df = df!("a" => &[1i64, 2]).unwrap();
        let groups = ColumnGroups::from_dataframe(&df);
        let s = suggestions(&groups);
        assert_eq!(s, vec!["Try: 'Create a histogram'".to_string()]);
    }
}
