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

//! Primary backend: Vega-Lite v5 specs with inline data. `render` produces
//! the spec itself; `render_to_file` wraps it in a self-contained vega-embed
//! HTML page in the system temp directory.

use std::io::Write as _;

use polars::prelude::*;
use serde_json::{json, Value};
use tracing::debug;

use crate::classify::ChartKind;
use crate::error::RenderError;
use crate::render::{Artifact, ChartBackend};
use crate::select::ChartPlan;
use crate::stats;

const CHART_WIDTH: u32 = 600;
const CHART_HEIGHT: u32 = 400;

#[derive(Debug, Clone, Copy, Default)]
pub struct VegaLiteBackend;

impl VegaLiteBackend {
    pub fn build_spec(&self, plan: &ChartPlan, df: &DataFrame) -> Result<Value, RenderError> {
        match plan.kind {
            ChartKind::Bar => self.xy_spec(plan, df, json!("bar"), false),
            ChartKind::Line => self.xy_spec(plan, df, json!({"type": "line", "point": true}), false),
            ChartKind::Scatter => self.xy_spec(plan, df, json!("point"), true),
            ChartKind::Pie => self.pie_spec(plan, df),
            ChartKind::Histogram => self.histogram_spec(plan, df),
            ChartKind::Heatmap => Err(RenderError::UnsupportedKind {
                backend: self.id(),
                kind: plan.kind.to_string(),
            }),
        }
    }

    fn xy_spec(
        &self,
        plan: &ChartPlan,
        df: &DataFrame,
        mark: Value,
        force_quantitative_x: bool,
    ) -> Result<Value, RenderError> {
        let (x, y) = plan_axes(plan)?;
        let xs = column_values(df, x)?;
        let ys = column_values(df, y)?;
        let rows: Vec<Value> = xs
            .into_iter()
            .zip(ys)
            .map(|(xv, yv)| json!({ x: xv, y: yv }))
            .collect();
        let x_type = if force_quantitative_x {
            "quantitative"
        } else {
            axis_type(df, x)?
        };
        Ok(json!({
            "$schema": "https://vega.github.io/schema/vega-lite/v5.json",
            "title": plan.title,
            "width": CHART_WIDTH,
            "height": CHART_HEIGHT,
            "data": { "values": rows },
            "mark": mark,
            "encoding": {
                "x": { "field": x, "type": x_type, "title": x },
                "y": { "field": y, "type": "quantitative", "title": y },
            },
        }))
    }

    fn pie_spec(&self, plan: &ChartPlan, df: &DataFrame) -> Result<Value, RenderError> {
        let column = plan.x.as_deref().ok_or_else(|| RenderError::Backend {
            backend: self.id(),
            reason: "pie plan has no category column".to_string(),
        })?;
        let counts = stats::value_counts(df, column).map_err(|e| RenderError::Backend {
            backend: self.id(),
            reason: e.to_string(),
        })?;
        let rows: Vec<Value> = counts
            .into_iter()
            .map(|(category, count)| json!({ "category": category, "count": count }))
            .collect();
        Ok(json!({
            "$schema": "https://vega.github.io/schema/vega-lite/v5.json",
            "title": plan.title,
            "width": CHART_WIDTH,
            "height": CHART_HEIGHT,
            "data": { "values": rows },
            "mark": { "type": "arc", "tooltip": true },
            "encoding": {
                "theta": { "field": "count", "type": "quantitative" },
                "color": { "field": "category", "type": "nominal", "title": column },
            },
        }))
    }

    fn histogram_spec(&self, plan: &ChartPlan, df: &DataFrame) -> Result<Value, RenderError> {
        let column = plan.x.as_deref().ok_or_else(|| RenderError::Backend {
            backend: self.id(),
            reason: "histogram plan has no value column".to_string(),
        })?;
        let values = column_values(df, column)?;
        let rows: Vec<Value> = values
            .into_iter()
            .map(|v| json!({ column: v }))
            .collect();
        Ok(json!({
            "$schema": "https://vega.github.io/schema/vega-lite/v5.json",
            "title": plan.title,
            "width": CHART_WIDTH,
            "height": CHART_HEIGHT,
            "data": { "values": rows },
            "mark": "bar",
            "encoding": {
                "x": { "field": column, "bin": true, "type": "quantitative", "title": column },
                "y": { "aggregate": "count", "type": "quantitative", "title": "count" },
            },
        }))
    }
}

impl ChartBackend for VegaLiteBackend {
    fn id(&self) -> &'static str {
        "vega-lite"
    }

    fn render(&self, plan: &ChartPlan, df: &DataFrame) -> Result<Artifact, RenderError> {
        let spec = self.build_spec(plan, df)?;
        debug!(kind = %plan.kind, "built vega-lite spec");
        Ok(Artifact::VegaLiteSpec(spec))
    }

    fn render_to_file(&self, plan: &ChartPlan, df: &DataFrame) -> Result<Artifact, RenderError> {
        let spec = self.build_spec(plan, df)?;
        let html = embed_page(&plan.title, &spec)?;
        let mut file = tempfile::Builder::new()
            .prefix("lumen-chart-")
            .suffix(".html")
            .tempfile()?;
        file.write_all(html.as_bytes())?;
        let (_, path) = file.keep().map_err(|e| RenderError::Io(e.error))?;
        debug!(path = %path.display(), "wrote chart page");
        Ok(Artifact::File {
            path,
            description: format!("{} ({})", plan.title, plan.kind),
        })
    }
}

/// Column values as JSON: numbers for numeric dtypes, strings otherwise.
/// Datetime columns go through polars' string cast, which formats timestamps.
fn column_values(df: &DataFrame, name: &str) -> Result<Vec<Value>, RenderError> {
    let column = df.column(name).map_err(|e| RenderError::Backend {
        backend: "vega-lite",
        reason: e.to_string(),
    })?;
    let series = column.as_materialized_series();
    if crate::profile::is_numeric_dtype(series.dtype()) {
        let floats = series
            .cast(&DataType::Float64)
            .and_then(|s| s.f64().cloned())
            .map_err(|e| RenderError::Backend {
                backend: "vega-lite",
                reason: e.to_string(),
            })?;
        Ok(floats
            .into_iter()
            .map(|v| v.map_or(Value::Null, |f| json!(f)))
            .collect())
    } else {
        let strings = series
            .cast(&DataType::String)
            .map_err(|e| RenderError::Backend {
                backend: "vega-lite",
                reason: e.to_string(),
            })?;
        let ca = strings.str().map_err(|e| RenderError::Backend {
            backend: "vega-lite",
            reason: e.to_string(),
        })?;
        Ok(ca
            .into_iter()
            .map(|v| v.map_or(Value::Null, |s| json!(s)))
            .collect())
    }
}

fn axis_type(df: &DataFrame, name: &str) -> Result<&'static str, RenderError> {
    let column = df.column(name).map_err(|e| RenderError::Backend {
        backend: "vega-lite",
        reason: e.to_string(),
    })?;
    let dtype = column.dtype();
    Ok(if crate::profile::is_numeric_dtype(dtype) {
        "quantitative"
    } else if crate::profile::is_temporal_dtype(dtype) {
        "temporal"
    } else {
        "nominal"
    })
}

fn plan_axes(plan: &ChartPlan) -> Result<(&str, &str), RenderError> {
    match (plan.x.as_deref(), plan.y.as_deref()) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(RenderError::Backend {
            backend: "vega-lite",
            reason: format!("{} plan is missing axis columns", plan.kind),
        }),
    }
}

fn embed_page(title: &str, spec: &Value) -> Result<String, RenderError> {
    let spec_json = serde_json::to_string(spec)?;
    Ok(format!(
        r##"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8" />
  <title>{title}</title>
  <script src="https://cdn.jsdelivr.net/npm/vega@5"></script>
  <script src="https://cdn.jsdelivr.net/npm/vega-lite@5"></script>
  <script src="https://cdn.jsdelivr.net/npm/vega-embed@6"></script>
</head>
<body>
  <div id="vis"></div>
  <script>
    vegaEmbed("#vis", {spec_json});
  </script>
</body>
</html>
"##
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ColumnGroups;
    use crate::select::select_columns;

    fn sample() -> DataFrame {
        df!(
            "region" => &["east", "west", "east"],
            "sales" => &[10i64, 20, 30],
            "margin" => &[0.5, 0.6, 0.7],
        )
        .unwrap()
    }

    fn plan(kind: ChartKind, df: &DataFrame) -> ChartPlan {
        let groups = ColumnGroups::from_dataframe(df);
        select_columns(kind, &groups, df).unwrap()
    }

    #[test]
    fn bar_spec_encodes_both_axes() {
        let df = sample();
        let spec = VegaLiteBackend.build_spec(&plan(ChartKind::Bar, &df), &df).unwrap();
        assert_eq!(spec["mark"], json!("bar"));
        assert_eq!(spec["encoding"]["x"]["field"], json!("region"));
        assert_eq!(spec["encoding"]["x"]["type"], json!("nominal"));
        assert_eq!(spec["encoding"]["y"]["field"], json!("sales"));
        assert_eq!(spec["data"]["values"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn line_mark_shows_points() {
        let df = sample();
        let spec = VegaLiteBackend.build_spec(&plan(ChartKind::Line, &df), &df).unwrap();
        assert_eq!(spec["mark"]["type"], json!("line"));
        assert_eq!(spec["mark"]["point"], json!(true));
    }

    #[test]
    fn pie_spec_aggregates_counts() {
        let df = sample();
        let spec = VegaLiteBackend.build_spec(&plan(ChartKind::Pie, &df), &df).unwrap();
        let rows = spec["data"]["values"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["category"], json!("east"));
        assert_eq!(rows[0]["count"], json!(2));
        assert_eq!(spec["encoding"]["theta"]["field"], json!("count"));
    }

    #[test]
    fn histogram_bins_the_column() {
        let df = sample();
        let spec = VegaLiteBackend
            .build_spec(&plan(ChartKind::Histogram, &df), &df)
            .unwrap();
        assert_eq!(spec["encoding"]["x"]["bin"], json!(true));
        assert_eq!(spec["encoding"]["y"]["aggregate"], json!("count"));
    }

    #[test]
    fn heatmap_is_unsupported() {
        let df = sample();
        let err = VegaLiteBackend
            .build_spec(&plan(ChartKind::Heatmap, &df), &df)
            .unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedKind { .. }));
    }

    #[test]
    fn embed_page_inlines_the_spec() {
        let df = sample();
        let p = plan(ChartKind::Bar, &df);
        let spec = VegaLiteBackend.build_spec(&p, &df).unwrap();
        let html = embed_page(&p.title, &spec).unwrap();
        assert!(html.contains("vega-embed"));
        assert!(html.contains("Bar Chart: sales by region"));
    }
}
