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

//! Natural-language chart requests over polars tables.
//!
//! A request like "show sales by region as a bar chart" is classified into a
//! chart kind by keyword, axis columns are picked from the table's inferred
//! column groups, and the chart is drawn through a dual-backend fallback
//! ladder (Vega-Lite first, plotters SVG second, data preview last). The
//! pipeline never returns an error; every failure mode collapses into a
//! [`VizOutcome`].

pub mod classify;
pub mod error;
pub mod outcome;
pub mod profile;
pub mod query;
pub mod render;
pub mod select;
pub mod stats;

pub use classify::{classify_request, supported_requests, ChartKind};
pub use error::{DataError, QueryError, RenderError, Result, VizError};
pub use outcome::{Status, VizOutcome};
pub use profile::{ColumnGroups, ProfileConfig};
pub use query::{query_and_visualize, quick_visualize, SqlEngine};
pub use render::plotters_backend::PlottersBackend;
pub use render::vegalite::VegaLiteBackend;
pub use render::{Artifact, ChartBackend, RenderStage};
pub use select::ChartPlan;

use polars::prelude::DataFrame;
use tracing::{info, warn};

/// The visualization pipeline with its configuration and backend pair.
pub struct Visualizer {
    config: ProfileConfig,
    primary: Box<dyn ChartBackend>,
    secondary: Box<dyn ChartBackend>,
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new(ProfileConfig::default())
    }
}

impl Visualizer {
    pub fn new(config: ProfileConfig) -> Self {
        Self {
            config,
            primary: Box::new(VegaLiteBackend),
            secondary: Box::new(PlottersBackend),
        }
    }

    /// Swap the backend pair, mainly for tests and embedding.
    pub fn with_backends(
        config: ProfileConfig,
        primary: Box<dyn ChartBackend>,
        secondary: Box<dyn ChartBackend>,
    ) -> Self {
        Self {
            config,
            primary,
            secondary,
        }
    }

    /// Visualize a free-text request against a table. Mutates the table only
    /// by coercing date-named string columns to datetime. Never fails: the
    /// outcome's status says what happened.
    pub fn visualize(&self, request: &str, df: &mut DataFrame) -> VizOutcome {
        let mut outcome = VizOutcome::new(Status::NoChart);
        if let Err(e) = self.run_pipeline(request, df, &mut outcome) {
            self.absorb_failure(e, df, &mut outcome);
        }
        outcome
    }

    fn run_pipeline(&self, request: &str, df: &mut DataFrame, outcome: &mut VizOutcome) -> Result<()> {
        if df.height() == 0 {
            return Err(DataError::EmptyDataset.into());
        }
        info!(request, rows = df.height(), "visualizing");

        for column in profile::coerce_datetime_columns(df, &self.config) {
            outcome.say(format!("Converted {column} to datetime"));
        }
        let groups = ColumnGroups::from_dataframe(df);
        outcome.say(groups.summary());

        match classify_request(request) {
            Some(kind) => {
                outcome.say(creating_message(kind));
                let plan = select::select_columns(kind, &groups, df)?;
                let report = render::run_ladder(
                    &plan,
                    df,
                    self.primary.as_ref(),
                    self.secondary.as_ref(),
                    self.config.preview_rows,
                );
                outcome.absorb(kind, report);
            }
            None => self.default_path(&groups, df, outcome),
        }
        Ok(())
    }

    /// Pipeline errors never escape; each one collapses into messages and a
    /// status on the outcome.
    fn absorb_failure(&self, error: VizError, df: &DataFrame, outcome: &mut VizOutcome) {
        warn!(category = error.category(), error = %error, "visualization failed");
        match error {
            VizError::Data(DataError::EmptyDataset) => {
                *outcome = VizOutcome::empty_table();
            }
            error if error.is_recoverable() => {
                outcome.say(error.to_string());
                let groups = ColumnGroups::from_dataframe(df);
                for suggestion in select::suggestions(&groups) {
                    outcome.say(format!("- {suggestion}"));
                }
            }
            error => outcome.say(error.to_string()),
        }
    }

    fn default_path(&self, groups: &ColumnGroups, df: &DataFrame, outcome: &mut VizOutcome) {
        outcome.say("No specific visualization pattern detected. Creating default visualization...");
        if let Some(plan) = select::default_plan(groups, df) {
            let report = render::run_ladder(
                &plan,
                df,
                self.primary.as_ref(),
                self.secondary.as_ref(),
                self.config.preview_rows,
            );
            let kind = plan.kind;
            outcome.absorb(kind, report);
            return;
        }
        outcome.say("Here's your data:");
        outcome.attempts.push(render::AttemptRecord {
            stage: RenderStage::DataPreview,
            backend: "preview",
            error: None,
        });
        outcome
            .artifacts
            .push(Artifact::Preview(render::preview_table(
                df,
                self.config.preview_rows,
            )));
        outcome.status = Status::Preview;
        let suggestions = select::suggestions(groups);
        if !suggestions.is_empty() {
            outcome.say("Suggested visualizations based on your data:");
            for suggestion in suggestions {
                outcome.say(format!("- {suggestion}"));
            }
        }
    }
}

fn creating_message(kind: ChartKind) -> String {
    match kind {
        ChartKind::Scatter => "Creating scatter plot...".to_string(),
        ChartKind::Histogram => "Creating histogram...".to_string(),
        ChartKind::Heatmap => "Creating heatmap...".to_string(),
        other => format!("Creating {other} chart..."),
    }
}

/// One-shot entry point with default configuration and backends.
pub fn create_visualization_from_nl(request: &str, df: &mut DataFrame) -> VizOutcome {
    Visualizer::default().visualize(request, df)
}

/// Usage catalog, one line per supported request family.
pub fn visualization_examples() -> String {
    let mut out = String::from("Natural Language to Visualization Examples:\n");
    for (kind, phrasings) in supported_requests() {
        out.push_str(&format!("- {kind} charts: {phrasings}\n"));
    }
    out.push_str(
        "Column types are detected automatically; unrecognized requests fall back to a default chart or a data preview.\n",
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn empty_table_short_circuits() {
        let mut df = df!("a" => Vec::<i64>::new()).unwrap();
        let outcome = create_visualization_from_nl("bar chart", &mut df);
        assert_eq!(outcome.status, Status::Empty);
        assert!(outcome.attempts.is_empty());
        assert!(outcome.artifacts.is_empty());
    }

    #[test]
    fn bar_request_renders() {
        let mut df = df!(
            "region" => &["east", "west"],
            "sales" => &[10i64, 20],
        )
        .unwrap();
        let outcome = create_visualization_from_nl("Create a bar chart", &mut df);
        assert_eq!(outcome.status, Status::Rendered);
        assert_eq!(outcome.chart, Some(ChartKind::Bar));
        assert!(outcome.messages.iter().any(|m| m == "Creating bar chart..."));
    }

    #[test]
    fn insufficient_columns_becomes_notice() {
        let mut df = df!("name" => &["a", "b"]).unwrap();
        let outcome = create_visualization_from_nl("scatter plot", &mut df);
        assert_eq!(outcome.status, Status::NoChart);
        assert!(outcome
            .messages
            .iter()
            .any(|m| m.contains("insufficient columns")));
        // The notice is followed by what the table could support.
        assert!(outcome
            .messages
            .iter()
            .any(|m| m == "- Try: 'Create a pie chart'"));
        assert!(outcome.attempts.is_empty());
    }

    #[test]
    fn unknown_request_with_no_default_shows_data() {
        let mut df = df!("a" => &[1i64, 2], "b" => &[3i64, 4]).unwrap();
        let outcome = create_visualization_from_nl("do something", &mut df);
        assert_eq!(outcome.status, Status::Preview);
        assert!(outcome.preview_text().is_some());
        assert!(outcome
            .messages
            .iter()
            .any(|m| m == "- Try: 'Create a scatter plot'"));
    }

    #[test]
    fn examples_list_every_kind() {
        let text = visualization_examples();
        for kind in ["bar", "line", "scatter", "pie", "histogram", "heatmap"] {
            assert!(text.contains(kind), "missing {kind}");
        }
    }
}
