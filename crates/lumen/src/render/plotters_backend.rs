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

//! Secondary backend: static SVG charts drawn with plotters. Covers every
//! chart kind, including the correlation heatmap the primary backend
//! declines.

use std::io::Write as _;

use plotters::prelude::*;
use polars::prelude::{DataFrame, DataType};
use tracing::debug;

use crate::classify::ChartKind;
use crate::error::RenderError;
use crate::render::{Artifact, ChartBackend};
use crate::select::ChartPlan;
use crate::stats;

const SVG_SIZE: (u32, u32) = (640, 480);
const HISTOGRAM_BINS: usize = 20;

const SLICE_COLORS: &[RGBColor] = &[
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct PlottersBackend;

impl ChartBackend for PlottersBackend {
    fn id(&self) -> &'static str {
        "plotters"
    }

    fn render(&self, plan: &ChartPlan, df: &DataFrame) -> Result<Artifact, RenderError> {
        let svg = self.render_svg(plan, df)?;
        debug!(kind = %plan.kind, "drew svg chart");
        Ok(Artifact::Svg(svg))
    }

    fn render_to_file(&self, plan: &ChartPlan, df: &DataFrame) -> Result<Artifact, RenderError> {
        let svg = self.render_svg(plan, df)?;
        let mut file = tempfile::Builder::new()
            .prefix("lumen-chart-")
            .suffix(".svg")
            .tempfile()?;
        file.write_all(svg.as_bytes())?;
        let (_, path) = file.keep().map_err(|e| RenderError::Io(e.error))?;
        Ok(Artifact::File {
            path,
            description: format!("{} ({})", plan.title, plan.kind),
        })
    }
}

impl PlottersBackend {
    pub fn render_svg(&self, plan: &ChartPlan, df: &DataFrame) -> Result<String, RenderError> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, SVG_SIZE).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;
            match plan.kind {
                ChartKind::Bar => draw_bar(&root, plan, df)?,
                ChartKind::Line => draw_xy(&root, plan, df, true)?,
                ChartKind::Scatter => draw_xy(&root, plan, df, false)?,
                ChartKind::Pie => draw_pie(&root, plan, df)?,
                ChartKind::Histogram => draw_histogram(&root, plan, df)?,
                ChartKind::Heatmap => draw_heatmap(&root, plan, df)?,
            }
            root.present().map_err(draw_err)?;
        }
        Ok(svg)
    }
}

type Area<'a> = DrawingArea<SVGBackend<'a>, plotters::coord::Shift>;

fn draw_err(e: impl std::fmt::Display) -> RenderError {
    RenderError::Backend {
        backend: "plotters",
        reason: e.to_string(),
    }
}

fn draw_bar(root: &Area<'_>, plan: &ChartPlan, df: &DataFrame) -> Result<(), RenderError> {
    let (x, y) = plan_axes(plan)?;
    let labels = string_column(df, x)?;
    let values = numeric_column(df, y)?;
    if values.is_empty() {
        return Err(draw_err("no rows to draw"));
    }
    let (y_min, y_max) = padded_range(
        values.iter().cloned().fold(f64::INFINITY, f64::min).min(0.0),
        values.iter().cloned().fold(f64::NEG_INFINITY, f64::max).max(0.0),
    );
    let n = values.len() as f64;
    let mut chart = ChartBuilder::on(root)
        .caption(&plan.title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(45)
        .build_cartesian_2d(0.0..n, y_min..y_max)
        .map_err(draw_err)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len().min(12))
        .x_label_formatter(&|pos| {
            labels
                .get(pos.floor() as usize)
                .cloned()
                .unwrap_or_default()
        })
        .y_desc(y)
        .draw()
        .map_err(draw_err)?;
    chart
        .draw_series(values.iter().enumerate().map(|(i, v)| {
            let i = i as f64;
            Rectangle::new([(i + 0.1, 0.0), (i + 0.9, *v)], SLICE_COLORS[0].filled())
        }))
        .map_err(draw_err)?;
    Ok(())
}

fn draw_xy(
    root: &Area<'_>,
    plan: &ChartPlan,
    df: &DataFrame,
    as_line: bool,
) -> Result<(), RenderError> {
    let (x, y) = plan_axes(plan)?;
    let points = xy_pairs(df, x, y)?;
    if points.is_empty() {
        return Err(draw_err("no rows to draw"));
    }
    let (x_min, x_max) = padded_range(
        points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min),
        points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max),
    );
    let (y_min, y_max) = padded_range(
        points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min),
        points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max),
    );
    let mut chart = ChartBuilder::on(root)
        .caption(&plan.title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(45)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(draw_err)?;
    chart
        .configure_mesh()
        .x_desc(x)
        .y_desc(y)
        .draw()
        .map_err(draw_err)?;
    if as_line {
        chart
            .draw_series(LineSeries::new(points.iter().cloned(), &SLICE_COLORS[0]))
            .map_err(draw_err)?;
    }
    chart
        .draw_series(
            points
                .iter()
                .map(|p| Circle::new(*p, 3, SLICE_COLORS[0].filled())),
        )
        .map_err(draw_err)?;
    Ok(())
}

fn draw_pie(root: &Area<'_>, plan: &ChartPlan, df: &DataFrame) -> Result<(), RenderError> {
    let column = plan.x.as_deref().ok_or_else(|| draw_err("pie plan has no category column"))?;
    let counts = stats::value_counts(df, column).map_err(draw_err)?;
    if counts.is_empty() {
        return Err(draw_err("no rows to draw"));
    }
    let sizes: Vec<f64> = counts.iter().map(|(_, n)| f64::from(*n)).collect();
    let labels: Vec<String> = counts
        .iter()
        .map(|(label, n)| format!("{label} ({n})"))
        .collect();
    let colors: Vec<RGBColor> = (0..counts.len())
        .map(|i| SLICE_COLORS[i % SLICE_COLORS.len()])
        .collect();
    // Draw inside the titled sub-area so slices never run into the caption.
    let area = root
        .titled(&plan.title, ("sans-serif", 20))
        .map_err(draw_err)?;
    let (w, h) = area.dim_in_pixel();
    let center = (w as i32 / 2, h as i32 / 2);
    let radius = f64::from(h.min(w)) * 0.35;
    let pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    area.draw(&pie).map_err(draw_err)?;
    Ok(())
}

fn draw_histogram(root: &Area<'_>, plan: &ChartPlan, df: &DataFrame) -> Result<(), RenderError> {
    let column = plan.x.as_deref().ok_or_else(|| draw_err("histogram plan has no value column"))?;
    let values = numeric_column(df, column)?;
    if values.is_empty() {
        return Err(draw_err("no rows to draw"));
    }
    let (min, max) = padded_range(
        values.iter().cloned().fold(f64::INFINITY, f64::min),
        values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
    );
    let width = (max - min) / HISTOGRAM_BINS as f64;
    let mut counts = vec![0u32; HISTOGRAM_BINS];
    for v in &values {
        let idx = (((v - min) / width) as usize).min(HISTOGRAM_BINS - 1);
        counts[idx] += 1;
    }
    let top = f64::from(*counts.iter().max().unwrap_or(&1)) * 1.1;
    let mut chart = ChartBuilder::on(root)
        .caption(&plan.title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(45)
        .build_cartesian_2d(min..max, 0.0..top)
        .map_err(draw_err)?;
    chart
        .configure_mesh()
        .x_desc(column)
        .y_desc("count")
        .draw()
        .map_err(draw_err)?;
    chart
        .draw_series(counts.iter().enumerate().map(|(i, c)| {
            let x0 = min + width * i as f64;
            Rectangle::new(
                [(x0, 0.0), (x0 + width, f64::from(*c))],
                SLICE_COLORS[0].filled(),
            )
        }))
        .map_err(draw_err)?;
    Ok(())
}

fn draw_heatmap(root: &Area<'_>, plan: &ChartPlan, df: &DataFrame) -> Result<(), RenderError> {
    let matrix = stats::correlation_matrix(df, &plan.series).map_err(draw_err)?;
    let n = matrix.columns.len();
    let mut chart = ChartBuilder::on(root)
        .caption(&plan.title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..n as f64, 0.0..n as f64)
        .map_err(draw_err)?;
    let columns = matrix.columns.clone();
    let y_columns = columns.clone();
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n)
        .y_labels(n)
        .x_label_formatter(&|pos| {
            columns.get(pos.floor() as usize).cloned().unwrap_or_default()
        })
        .y_label_formatter(&|pos| {
            y_columns
                .get(pos.floor() as usize)
                .cloned()
                .unwrap_or_default()
        })
        .draw()
        .map_err(draw_err)?;
    chart
        .draw_series((0..n).flat_map(|i| {
            let row = matrix.values[i].clone();
            (0..n).map(move |j| {
                let color = correlation_color(row[j]);
                Rectangle::new(
                    [(j as f64, (n - 1 - i) as f64), ((j + 1) as f64, (n - i) as f64)],
                    color.filled(),
                )
            })
        }))
        .map_err(draw_err)?;
    Ok(())
}

/// Diverging blue-white-red scale over [-1, 1]; NaN draws grey.
fn correlation_color(value: f64) -> RGBColor {
    if value.is_nan() {
        return RGBColor(200, 200, 200);
    }
    let v = value.clamp(-1.0, 1.0);
    if v >= 0.0 {
        let t = 1.0 - v;
        RGBColor(255, (255.0 * t) as u8, (255.0 * t) as u8)
    } else {
        let t = 1.0 + v;
        RGBColor((255.0 * t) as u8, (255.0 * t) as u8, 255)
    }
}

fn padded_range(min: f64, max: f64) -> (f64, f64) {
    if (max - min).abs() < f64::EPSILON {
        (min - 1.0, max + 1.0)
    } else {
        (min, max)
    }
}

fn plan_axes(plan: &ChartPlan) -> Result<(&str, &str), RenderError> {
    match (plan.x.as_deref(), plan.y.as_deref()) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(draw_err(format!("{} plan is missing axis columns", plan.kind))),
    }
}

fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f64>, RenderError> {
    let series = df
        .column(name)
        .map_err(draw_err)?
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(draw_err)?;
    let ca = series.f64().map_err(draw_err)?;
    Ok(ca.into_iter().flatten().collect())
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<String>, RenderError> {
    let series = df
        .column(name)
        .map_err(draw_err)?
        .as_materialized_series()
        .cast(&DataType::String)
        .map_err(draw_err)?;
    let ca = series.str().map_err(draw_err)?;
    Ok(ca
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect())
}

/// Paired (x, y) points with nulls dropped. Non-numeric x columns fall back
/// to row position so a line chart over a text axis still draws.
fn xy_pairs(df: &DataFrame, x: &str, y: &str) -> Result<Vec<(f64, f64)>, RenderError> {
    let ys = optional_numeric(df, y)?;
    let x_column = df.column(x).map_err(draw_err)?;
    let xs: Vec<Option<f64>> = if crate::profile::is_numeric_dtype(x_column.dtype()) {
        optional_numeric(df, x)?
    } else if crate::profile::is_temporal_dtype(x_column.dtype()) {
        // Timestamps plot as epoch milliseconds.
        let series = x_column
            .as_materialized_series()
            .cast(&DataType::Int64)
            .and_then(|s| s.cast(&DataType::Float64))
            .map_err(draw_err)?;
        series.f64().map_err(draw_err)?.into_iter().collect()
    } else {
        (0..df.height()).map(|i| Some(i as f64)).collect()
    };
    Ok(xs
        .into_iter()
        .zip(ys)
        .filter_map(|(xv, yv)| match (xv, yv) {
            (Some(xv), Some(yv)) => Some((xv, yv)),
            _ => None,
        })
        .collect())
}

fn optional_numeric(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, RenderError> {
    let series = df
        .column(name)
        .map_err(draw_err)?
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(draw_err)?;
    Ok(series.f64().map_err(draw_err)?.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ColumnGroups;
    use crate::select::select_columns;
    use polars::prelude::df;

    fn sample() -> DataFrame {
        df!(
            "region" => &["east", "west", "east", "north"],
            "sales" => &[10i64, 20, 30, 40],
            "margin" => &[0.5, 0.6, 0.7, 0.8],
        )
        .unwrap()
    }

    fn svg_for(kind: ChartKind) -> String {
        let df = sample();
        let groups = ColumnGroups::from_dataframe(&df);
        let plan = select_columns(kind, &groups, &df).unwrap();
        PlottersBackend.render_svg(&plan, &df).unwrap()
    }

    #[test]
    fn every_kind_draws() {
        for kind in [
            ChartKind::Bar,
            ChartKind::Line,
            ChartKind::Scatter,
            ChartKind::Pie,
            ChartKind::Histogram,
            ChartKind::Heatmap,
        ] {
            let svg = svg_for(kind);
            assert!(svg.contains("<svg"), "no svg for {kind}");
        }
    }

    #[test]
    fn empty_frame_is_an_error() {
        let df = df!("region" => Vec::<String>::new(), "sales" => Vec::<i64>::new()).unwrap();
        let plan = ChartPlan {
            kind: ChartKind::Bar,
            x: Some("region".to_string()),
            y: Some("sales".to_string()),
            series: Vec::new(),
            title: "Bar Chart: sales by region".to_string(),
        };
        assert!(PlottersBackend.render_svg(&plan, &df).is_err());
    }

    #[test]
    fn pie_draws_caption_and_slice_labels() {
        let svg = svg_for(ChartKind::Pie);
        assert!(svg.contains("Distribution of region"));
        assert!(svg.contains("east (2)"));
        assert!(svg.contains("west (1)"));
    }

    #[test]
    fn constant_column_histogram_still_draws() {
        let df = df!("value" => &[5.0, 5.0, 5.0]).unwrap();
        let groups = ColumnGroups::from_dataframe(&df);
        let plan = select_columns(ChartKind::Histogram, &groups, &df).unwrap();
        assert!(PlottersBackend.render_svg(&plan, &df).is_ok());
    }

    #[test]
    fn correlation_colors_span_the_scale() {
        assert_eq!(correlation_color(1.0), RGBColor(255, 0, 0));
        assert_eq!(correlation_color(-1.0), RGBColor(0, 0, 255));
        assert_eq!(correlation_color(0.0), RGBColor(255, 255, 255));
        assert_eq!(correlation_color(f64::NAN), RGBColor(200, 200, 200));
    }
}
