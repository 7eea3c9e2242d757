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

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use polars::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lumen::{create_visualization_from_nl, visualization_examples, Artifact};

/// Visualize a CSV file from a natural-language request.
#[derive(Parser)]
#[command(name = "lumen-chart-demo")]
struct Args {
    /// CSV file to load.
    csv: Option<PathBuf>,
    /// What to draw, e.g. "Create a bar chart".
    request: Option<String>,
    /// Print the full Vega-Lite spec instead of a summary.
    #[arg(long)]
    spec: bool,
    /// Show example requests and exit.
    #[arg(long)]
    examples: bool,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    if args.examples {
        println!("{}", visualization_examples());
        return Ok(());
    }
    let (Some(csv), Some(request)) = (args.csv, args.request) else {
        anyhow::bail!("usage: lumen-chart-demo <csv> <request> (or --examples)");
    };

    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(csv.clone()))
        .with_context(|| format!("opening {}", csv.display()))?
        .finish()
        .with_context(|| format!("reading {}", csv.display()))?;
    info!(rows = df.height(), columns = df.width(), "loaded csv");

    let outcome = create_visualization_from_nl(&request, &mut df);
    println!("{}", outcome.report());

    for artifact in &outcome.artifacts {
        match artifact {
            Artifact::VegaLiteSpec(spec) if args.spec => {
                println!("{}", serde_json::to_string_pretty(spec)?);
            }
            Artifact::VegaLiteSpec(_) => {
                println!("[vega-lite spec built; rerun with --spec to print it]");
            }
            Artifact::File { path, description } => {
                println!("[{description} written to {}]", path.display());
            }
            Artifact::Svg(svg) => {
                println!("[svg chart drawn, {} bytes]", svg.len());
            }
            Artifact::Preview(text) => {
                println!("{text}");
            }
        }
    }
    Ok(())
}
