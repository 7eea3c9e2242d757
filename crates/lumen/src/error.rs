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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VizError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    #[error("Column selection error: {0}")]
    Select(#[from] crate::select::SelectError),
    #[error("Query error: {0}")]
    Query(#[from] QueryError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
    #[error("Empty dataset provided")]
    EmptyDataset,
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },
    #[error("Column '{column}' is not numeric")]
    NotNumeric { column: String },
    #[error("Parsing error: {0}")]
    Parsing(String),
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Backend '{backend}' failed: {reason}")]
    Backend {
        backend: &'static str,
        reason: String,
    },
    #[error("Chart kind '{kind}' is not supported by backend '{backend}'")]
    UnsupportedKind {
        backend: &'static str,
        kind: String,
    },
    #[error("Serialisation failed: {0}")]
    Serialisation(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Query execution failed: {reason}")]
    ExecutionFailed { reason: String },
}

pub type Result<T> = core::result::Result<T, VizError>;

impl VizError {
    /// Failures that the pipeline absorbs into a data-preview fallback
    /// rather than surfacing to the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            VizError::Render(_) | VizError::Select(_) | VizError::Data(_)
        )
    }

    pub fn category(&self) -> &'static str {
        match self {
            VizError::Data(_) => "Data",
            VizError::Render(_) => "Render",
            VizError::Select(_) => "Selection",
            VizError::Query(_) => "Query",
            VizError::Io(_) => "I/O",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ChartKind;
    use crate::select::SelectError;

    #[test]
    fn selection_and_render_failures_are_recoverable() {
        let select: VizError = SelectError::InsufficientColumns {
            kind: ChartKind::Scatter,
            needed: "at least 2 numeric columns",
        }
        .into();
        assert!(select.is_recoverable());
        assert_eq!(select.category(), "Selection");

        let render: VizError = RenderError::Backend {
            backend: "vega-lite",
            reason: "offline".to_string(),
        }
        .into();
        assert!(render.is_recoverable());
        assert_eq!(render.category(), "Render");
    }

    #[test]
    fn query_failures_are_not_recoverable() {
        let query: VizError = QueryError::ExecutionFailed {
            reason: "connection refused".to_string(),
        }
        .into();
        assert!(!query.is_recoverable());
        assert_eq!(query.category(), "Query");
    }

    #[test]
    fn empty_dataset_keeps_its_message() {
        let err: VizError = DataError::EmptyDataset.into();
        assert_eq!(err.to_string(), "Data error: Empty dataset provided");
        assert_eq!(err.category(), "Data");
    }
}
