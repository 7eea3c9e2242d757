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

use polars::prelude::DataFrame;
use tracing::info;

use crate::error::QueryError;
use crate::outcome::VizOutcome;
use crate::Visualizer;

/// Anything that can turn SQL text into a table. Implementations wrap a
/// database connection, an in-memory polars context, or a test fixture.
pub trait SqlEngine {
    fn execute(&self, sql: &str) -> Result<DataFrame, QueryError>;
}

impl Visualizer {
    /// Generate SQL from a question, run it, then visualize the result. A
    /// failed generation or query ends the call with `QueryFailed`; nothing
    /// is raised.
    pub fn query_and_visualize<G>(
        &self,
        question: &str,
        visualization_request: &str,
        engine: &dyn SqlEngine,
        generate_sql: G,
    ) -> VizOutcome
    where
        G: FnOnce(&str) -> Result<String, QueryError>,
    {
        let mut preamble = vec![format!("Question: {question}")];
        let sql = match generate_sql(question) {
            Ok(sql) => sql,
            Err(e) => {
                let mut outcome = VizOutcome::query_failed(&e.to_string());
                outcome.messages.splice(0..0, preamble);
                return outcome;
            }
        };
        preamble.push(format!("Generated SQL Query:\n{sql}"));
        let mut outcome = self.quick_visualize(&sql, visualization_request, engine);
        outcome.messages.splice(0..0, preamble);
        outcome
    }

    /// Run a ready-made SQL query and visualize the result.
    pub fn quick_visualize(
        &self,
        sql: &str,
        visualization_request: &str,
        engine: &dyn SqlEngine,
    ) -> VizOutcome {
        match engine.execute(sql) {
            Ok(mut df) => {
                info!(rows = df.height(), "query executed");
                let mut outcome = self.visualize(visualization_request, &mut df);
                outcome.messages.splice(
                    0..0,
                    [
                        format!("Query returned {} rows.", df.height()),
                        format!("Creating visualization: {visualization_request}"),
                    ],
                );
                outcome
            }
            Err(e) => VizOutcome::query_failed(&e.to_string()),
        }
    }
}

/// One-shot question-to-chart entry point with default configuration.
pub fn query_and_visualize<G>(
    question: &str,
    visualization_request: &str,
    engine: &dyn SqlEngine,
    generate_sql: G,
) -> VizOutcome
where
    G: FnOnce(&str) -> Result<String, QueryError>,
{
    Visualizer::default().query_and_visualize(question, visualization_request, engine, generate_sql)
}

/// One-shot SQL-to-chart entry point with default configuration.
pub fn quick_visualize(
    sql: &str,
    visualization_request: &str,
    engine: &dyn SqlEngine,
) -> VizOutcome {
    Visualizer::default().quick_visualize(sql, visualization_request, engine)
}
