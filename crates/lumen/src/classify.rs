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

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartKind {
    Bar,
    Line,
    Scatter,
    Pie,
    Histogram,
    Heatmap,
}

impl ChartKind {
    pub fn name(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Scatter => "scatter",
            ChartKind::Pie => "pie",
            ChartKind::Histogram => "histogram",
            ChartKind::Heatmap => "heatmap",
        }
    }
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Keyword groups evaluated in priority order; the first group containing a
/// substring of the lowercased request wins. The order is part of the public
/// contract: "bar line chart" is a bar chart.
pub const KEYWORD_RULES: &[(&[&str], ChartKind)] = &[
    (&["bar", "column", "count"], ChartKind::Bar),
    (&["line", "trend", "time", "over time"], ChartKind::Line),
    (
        &["scatter", "correlation", "relationship"],
        ChartKind::Scatter,
    ),
    (&["pie", "distribution", "proportion"], ChartKind::Pie),
    (&["histogram", "frequency"], ChartKind::Histogram),
    (&["heatmap", "correlation matrix"], ChartKind::Heatmap),
];

/// Classify a free-text visualization request. Pure and stateless; returns
/// `None` when no keyword group matches, handing control to the default path.
pub fn classify_request(request: &str) -> Option<ChartKind> {
    let lowered = request.to_lowercase();
    KEYWORD_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|kw| lowered.contains(kw)))
        .map(|(_, kind)| *kind)
}

/// Human-readable catalog of request phrasings per chart kind, for help text
/// and for suggestion messages.
pub fn supported_requests() -> Vec<(ChartKind, &'static str)> {
    vec![
        (ChartKind::Bar, "'Create a bar chart', 'Show me a column chart'"),
        (ChartKind::Line, "'Create a line chart', 'Show trend over time'"),
        (ChartKind::Scatter, "'Create a scatter plot', 'Show correlation'"),
        (ChartKind::Pie, "'Create a pie chart', 'Show distribution'"),
        (ChartKind::Histogram, "'Create a histogram', 'Show frequency'"),
        (ChartKind::Heatmap, "'Show correlation heatmap', 'Create a heatmap'"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_each_kind() {
        assert_eq!(classify_request("show me a bar chart"), Some(ChartKind::Bar));
        assert_eq!(classify_request("trend please"), Some(ChartKind::Line));
        assert_eq!(
            classify_request("relationship between x and y"),
            Some(ChartKind::Scatter)
        );
        assert_eq!(classify_request("proportion of users"), Some(ChartKind::Pie));
        assert_eq!(classify_request("frequency plot"), Some(ChartKind::Histogram));
        assert_eq!(classify_request("a HEATMAP"), Some(ChartKind::Heatmap));
    }

    #[test]
    fn bar_wins_over_line() {
        // Priority order is fixed: bar, line, scatter, pie, histogram, heatmap.
        assert_eq!(
            classify_request("bar and line chart"),
            Some(ChartKind::Bar)
        );
    }

    #[test]
    fn count_is_a_bar_request() {
        assert_eq!(
            classify_request("count of orders by region"),
            Some(ChartKind::Bar)
        );
    }

    #[test]
    fn correlation_is_scatter_not_heatmap() {
        // "correlation" sits in the scatter group; only the full phrase
        // "correlation matrix" reaches the heatmap rule via "heatmap" absence.
        assert_eq!(
            classify_request("show correlation"),
            Some(ChartKind::Scatter)
        );
    }

    #[test]
    fn unknown_request_is_none() {
        assert_eq!(classify_request("xyz123"), None);
        assert_eq!(classify_request(""), None);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(classify_request("PIE CHART"), Some(ChartKind::Pie));
    }
}
