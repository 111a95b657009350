//! Grid command implementation
//!
//! Warms every cell of the grid and prints a hit-count map.

use anyhow::Result;
use beatpad_engine::{CacheStats, PatternSource};
use beatpad_spec::{BlendError, Cell, Pattern};
use colored::Colorize;
use serde::Serialize;
use std::process::ExitCode;

use super::json_output::JsonOutput;
use super::{block_on_local, errors_to_json, open_session};

/// One warmed cell.
#[derive(Debug, Clone, Serialize)]
pub struct CellReport {
    pub cell: Cell,
    pub hits: usize,
    pub pattern: Pattern,
}

/// Result of warming a grid.
#[derive(Debug, Clone, Serialize)]
pub struct GridReport {
    pub columns: u32,
    pub rows: u32,
    /// Where the cell patterns came from
    pub source: PatternSource,
    pub cells: Vec<CellReport>,
    pub stats: CacheStats,
}

impl GridReport {
    fn hits_at(&self, col: u32, row: u32) -> Option<usize> {
        self.cells
            .iter()
            .find(|c| c.cell.col == col && c.cell.row == row)
            .map(|c| c.hits)
    }
}

/// Run the grid command
///
/// # Arguments
/// * `corners_path` - Path to the corner set JSON file
/// * `config_path` - Optional engine config JSON file
/// * `model` - Model selector
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 on success, 1 on failure
pub fn run(
    corners_path: &str,
    config_path: Option<&str>,
    model: Option<&str>,
    json_output: bool,
) -> Result<ExitCode> {
    let report = block_on_local(warm(corners_path, config_path, model))?;
    if json_output {
        run_json(report)
    } else {
        run_human(report?)
    }
}

/// Resolves every cell of the grid.
///
/// With the model loaded and all four corners set, every cell is decoded once
/// and cached. Otherwise each cell is blended directly.
pub async fn warm(
    corners_path: &str,
    config_path: Option<&str>,
    model: Option<&str>,
) -> Result<GridReport> {
    let engine = open_session(corners_path, config_path, model).await?;
    let grid = *engine.grid();

    let (source, patterns) = match engine.warm_grid().await {
        Ok(Some(patterns)) => (
            PatternSource::Latent {
                version: engine.encoding_version(),
            },
            patterns,
        ),
        Ok(None) | Err(BlendError::ModelUnavailable(_)) => {
            let mut patterns = Vec::with_capacity(grid.cell_count() as usize);
            for cell in grid.cells() {
                let outcome = engine.blend_at(grid.center_of(cell)).await?;
                patterns.push(outcome.pattern);
            }
            (PatternSource::Direct, patterns)
        }
        Err(err) => return Err(err.into()),
    };

    let cells = grid
        .cells()
        .zip(patterns)
        .map(|(cell, pattern)| CellReport {
            cell,
            hits: pattern.hit_count(),
            pattern,
        })
        .collect();

    Ok(GridReport {
        columns: grid.columns(),
        rows: grid.rows(),
        source,
        cells,
        stats: engine.cache_stats(),
    })
}

fn run_human(report: GridReport) -> Result<ExitCode> {
    println!(
        "{} {}x{} cells",
        "Grid:".cyan().bold(),
        report.columns,
        report.rows
    );
    let source = match report.source {
        PatternSource::Latent { version } => format!("latent (v{})", version),
        PatternSource::Direct => "direct blend".to_string(),
    };
    println!("{} {}", "Source:".dimmed(), source);
    println!();

    println!("{}", "Hits per cell (row 0 = corners A/B):".dimmed());
    for row in 0..report.rows {
        let line: Vec<String> = (0..report.columns)
            .map(|col| match report.hits_at(col, row) {
                Some(hits) => format!("{:>4}", hits),
                None => format!("{:>4}", "-"),
            })
            .collect();
        println!("  {}", line.join(""));
    }
    println!();

    println!(
        "{} {} decode(s), {} cached, {} coalesced, {} fallback(s)",
        "Cache:".dimmed(),
        report.stats.misses,
        report.stats.entries,
        report.stats.coalesced,
        report.stats.fallbacks
    );
    println!(
        "{} {} cell(s) warmed",
        "SUCCESS".green().bold(),
        report.cells.len()
    );
    Ok(ExitCode::SUCCESS)
}

fn run_json(report: Result<GridReport>) -> Result<ExitCode> {
    let output = match report {
        Ok(report) => JsonOutput::success(report),
        Err(err) => JsonOutput::failure(errors_to_json(&err)),
    };
    println!("{}", output.to_json_string());
    Ok(if output.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
