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

pub mod plotters_backend;
pub mod vegalite;

use crate::classify::ChartKind;
use crate::error::RenderError;
use crate::select::ChartPlan;
use crate::stats;
use polars::prelude::DataFrame;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Something a render attempt produced. Previews are artifacts too, so a
/// caller always gets at least one artifact back from the ladder.
#[derive(Debug, Clone, Serialize)]
pub enum Artifact {
    /// Vega-Lite spec ready for interactive embedding.
    VegaLiteSpec(serde_json::Value),
    /// A chart written to disk (embed HTML or SVG); cleanup is the caller's.
    File { path: PathBuf, description: String },
    /// Standalone SVG markup.
    Svg(String),
    /// Plain-text table preview.
    Preview(String),
}

impl Artifact {
    pub fn is_chart(&self) -> bool {
        !matches!(self, Artifact::Preview(_))
    }
}

/// One rung of the fallback ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RenderStage {
    PrimaryInteractive,
    PrimaryFile,
    Secondary,
    DataPreview,
}

/// Record of a single render attempt, success or not. The full attempt list
/// makes the ladder's behavior observable instead of buried in catch blocks.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptRecord {
    pub stage: RenderStage,
    pub backend: &'static str,
    pub error: Option<String>,
}

impl AttemptRecord {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// When the secondary backend runs relative to the primary ladder. The
/// asymmetry across chart kinds reproduces long-standing behavior and is
/// covered by tests; see `ladder_policy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryPolicy {
    /// Secondary always runs, even after a primary success (bar, line).
    Always,
    /// Secondary runs only when the whole primary ladder failed
    /// (scatter, pie, histogram).
    OnPrimaryFailure,
    /// Primary is bypassed entirely (heatmap).
    Only,
}

pub fn ladder_policy(kind: ChartKind) -> SecondaryPolicy {
    match kind {
        ChartKind::Bar | ChartKind::Line => SecondaryPolicy::Always,
        ChartKind::Scatter | ChartKind::Pie | ChartKind::Histogram => {
            SecondaryPolicy::OnPrimaryFailure
        }
        ChartKind::Heatmap => SecondaryPolicy::Only,
    }
}

/// A charting engine. Implementations must be side-effect free on `render`;
/// only `render_to_file` touches the filesystem.
pub trait ChartBackend {
    fn id(&self) -> &'static str;

    /// Build the chart as an in-memory artifact.
    fn render(&self, plan: &ChartPlan, df: &DataFrame) -> Result<Artifact, RenderError>;

    /// Build the chart and persist it to a temporary file.
    fn render_to_file(&self, plan: &ChartPlan, df: &DataFrame) -> Result<Artifact, RenderError>;
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct LadderReport {
    pub attempts: Vec<AttemptRecord>,
    pub artifacts: Vec<Artifact>,
    pub messages: Vec<String>,
    pub primary_succeeded: bool,
    pub secondary_succeeded: bool,
}

impl LadderReport {
    pub fn rendered_chart(&self) -> bool {
        self.artifacts.iter().any(Artifact::is_chart)
    }

    fn record(&mut self, stage: RenderStage, backend: &'static str, error: Option<String>) {
        self.attempts.push(AttemptRecord {
            stage,
            backend,
            error,
        });
    }
}

/// First 10 rows (configurable) of the table, as text. Always succeeds.
pub fn preview_table(df: &DataFrame, rows: usize) -> String {
    format!("{}", df.head(Some(rows)))
}

fn preview_for(plan: &ChartPlan, df: &DataFrame, rows: usize) -> String {
    // Heatmap previews show the correlation matrix, not raw rows.
    if plan.kind == ChartKind::Heatmap {
        if let Ok(matrix) = stats::correlation_matrix(df, &plan.series) {
            return matrix.render_text();
        }
    }
    preview_table(df, rows)
}

/// Run the full dual-backend fallback ladder for one chart plan. Terminal on
/// first success within each sub-ladder; every attempt is recorded.
pub fn run_ladder(
    plan: &ChartPlan,
    df: &DataFrame,
    primary: &dyn ChartBackend,
    secondary: &dyn ChartBackend,
    preview_rows: usize,
) -> LadderReport {
    let mut report = LadderReport::default();
    let policy = ladder_policy(plan.kind);

    if policy != SecondaryPolicy::Only {
        run_primary_ladder(plan, df, primary, preview_rows, &mut report);
    }

    let run_secondary = match policy {
        SecondaryPolicy::Always | SecondaryPolicy::Only => true,
        SecondaryPolicy::OnPrimaryFailure => !report.primary_succeeded,
    };
    if run_secondary {
        run_secondary_ladder(plan, df, secondary, preview_rows, &mut report);
    }
    report
}

fn run_primary_ladder(
    plan: &ChartPlan,
    df: &DataFrame,
    primary: &dyn ChartBackend,
    preview_rows: usize,
    report: &mut LadderReport,
) {
    match primary.render(plan, df) {
        Ok(artifact) => {
            debug!(backend = primary.id(), kind = %plan.kind, "interactive render succeeded");
            report.record(RenderStage::PrimaryInteractive, primary.id(), None);
            report.messages.push(format!(
                "{} {} chart created successfully",
                primary.id(),
                plan.kind
            ));
            report.artifacts.push(artifact);
            report.primary_succeeded = true;
            return;
        }
        Err(e) => {
            warn!(backend = primary.id(), error = %e, "interactive render failed");
            report.record(RenderStage::PrimaryInteractive, primary.id(), Some(e.to_string()));
        }
    }

    match primary.render_to_file(plan, df) {
        Ok(artifact) => {
            report.record(RenderStage::PrimaryFile, primary.id(), None);
            if let Artifact::File { path, .. } = &artifact {
                report.messages.push(format!(
                    "Chart saved to {} - you can open it in a browser",
                    path.display()
                ));
            }
            report.artifacts.push(artifact);
            report.primary_succeeded = true;
            return;
        }
        Err(e) => {
            warn!(backend = primary.id(), error = %e, "file render failed");
            report.record(RenderStage::PrimaryFile, primary.id(), Some(e.to_string()));
        }
    }

    report.record(RenderStage::DataPreview, "preview", None);
    report.messages.push("Showing data instead:".to_string());
    report
        .artifacts
        .push(Artifact::Preview(preview_table(df, preview_rows)));
}

fn run_secondary_ladder(
    plan: &ChartPlan,
    df: &DataFrame,
    secondary: &dyn ChartBackend,
    preview_rows: usize,
    report: &mut LadderReport,
) {
    match secondary.render(plan, df) {
        Ok(artifact) => {
            debug!(backend = secondary.id(), kind = %plan.kind, "secondary render succeeded");
            report.record(RenderStage::Secondary, secondary.id(), None);
            report.messages.push(format!(
                "{} {} chart created",
                secondary.id(),
                plan.kind
            ));
            report.artifacts.push(artifact);
            report.secondary_succeeded = true;
        }
        Err(e) => {
            warn!(backend = secondary.id(), error = %e, "secondary render failed");
            report.record(RenderStage::Secondary, secondary.id(), Some(e.to_string()));
            report.record(RenderStage::DataPreview, "preview", None);
            report.messages.push("Showing data instead:".to_string());
            report
                .artifacts
                .push(Artifact::Preview(preview_for(plan, df, preview_rows)));
        }
    }
}
