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

use serde::Serialize;

use crate::classify::ChartKind;
use crate::render::{Artifact, AttemptRecord, LadderReport};

/// Terminal state of a visualization call. The pipeline never returns an
/// error to the caller; every failure mode collapses into one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    /// At least one backend produced a chart artifact.
    Rendered,
    /// No chart could be drawn; a data preview stands in.
    Preview,
    /// The request or table shape ruled every chart out.
    NoChart,
    /// The input table had no rows.
    Empty,
    /// The upstream query failed before any table existed.
    QueryFailed,
}

/// Everything a visualization call produced: final status, console-style
/// messages in emission order, the full render attempt trail, and any
/// artifacts (charts and previews).
#[derive(Debug, Clone, Serialize)]
pub struct VizOutcome {
    pub status: Status,
    pub chart: Option<ChartKind>,
    pub messages: Vec<String>,
    pub attempts: Vec<AttemptRecord>,
    pub artifacts: Vec<Artifact>,
}

impl VizOutcome {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            chart: None,
            messages: Vec::new(),
            attempts: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    pub fn empty_table() -> Self {
        let mut outcome = Self::new(Status::Empty);
        outcome.say("No data to visualize");
        outcome
    }

    pub fn query_failed(reason: &str) -> Self {
        let mut outcome = Self::new(Status::QueryFailed);
        outcome.say(format!("Error executing query: {reason}"));
        outcome
    }

    pub fn say(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// Fold a ladder run into the outcome. Status becomes `Rendered` when any
    /// rung produced a chart, `Preview` otherwise.
    pub fn absorb(&mut self, kind: ChartKind, report: LadderReport) {
        self.chart = Some(kind);
        self.status = if report.rendered_chart() {
            Status::Rendered
        } else {
            Status::Preview
        };
        self.messages.extend(report.messages);
        self.attempts.extend(report.attempts);
        self.artifacts.extend(report.artifacts);
    }

    pub fn rendered(&self) -> bool {
        self.status == Status::Rendered
    }

    pub fn preview_text(&self) -> Option<&str> {
        self.artifacts.iter().find_map(|a| match a {
            Artifact::Preview(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Console-style transcript of the call, one message per line.
    pub fn report(&self) -> String {
        self.messages.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderStage;

    #[test]
    fn empty_table_outcome() {
        let outcome = VizOutcome::empty_table();
        assert_eq!(outcome.status, Status::Empty);
        assert_eq!(outcome.report(), "No data to visualize");
        assert!(outcome.attempts.is_empty());
    }

    #[test]
    fn absorb_sets_rendered_on_chart_artifact() {
        let mut outcome = VizOutcome::new(Status::NoChart);
        let report = LadderReport {
            attempts: vec![AttemptRecord {
                stage: RenderStage::PrimaryInteractive,
                backend: "vega-lite",
                error: None,
            }],
            artifacts: vec![Artifact::Svg("<svg/>".to_string())],
            messages: vec!["ok".to_string()],
            primary_succeeded: true,
            secondary_succeeded: false,
        };
        outcome.absorb(ChartKind::Bar, report);
        assert_eq!(outcome.status, Status::Rendered);
        assert_eq!(outcome.chart, Some(ChartKind::Bar));
    }

    #[test]
    fn absorb_previews_when_no_chart_drawn() {
        let mut outcome = VizOutcome::new(Status::NoChart);
        let report = LadderReport {
            artifacts: vec![Artifact::Preview("rows".to_string())],
            ..Default::default()
        };
        outcome.absorb(ChartKind::Line, report);
        assert_eq!(outcome.status, Status::Preview);
        assert_eq!(outcome.preview_text(), Some("rows"));
    }
}
