//! Blend command implementation
//!
//! Blends the corner patterns at one surface position and prints the result.

use anyhow::Result;
use beatpad_engine::PatternSource;
use beatpad_spec::{Cell, Pattern, Point};
use colored::Colorize;
use serde::Serialize;
use std::process::ExitCode;

use super::json_output::JsonOutput;
use super::{block_on_local, errors_to_json, open_session};

/// Result of a blend.
#[derive(Debug, Clone, Serialize)]
pub struct BlendReport {
    /// Requested position (clamped)
    pub position: Point,
    /// Cell under the position
    pub cell: Cell,
    /// True when decoded at the exact position instead of the cell center
    pub exact: bool,
    /// Where the pattern came from (cell blends only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PatternSource>,
    /// Whether the model was loaded
    pub model_ready: bool,
    pub pattern: Pattern,
}

/// Run the blend command
///
/// # Arguments
/// * `corners_path` - Path to the corner set JSON file
/// * `position` - Surface position
/// * `exact` - Decode at the exact position instead of the cell center
/// * `config_path` - Optional engine config JSON file
/// * `model` - Model selector (`reference` or an http(s) URL)
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 on success, 1 on failure
pub fn run(
    corners_path: &str,
    position: Point,
    exact: bool,
    config_path: Option<&str>,
    model: Option<&str>,
    json_output: bool,
) -> Result<ExitCode> {
    let report = block_on_local(blend(corners_path, position, exact, config_path, model))?;
    if json_output {
        run_json(report)
    } else {
        run_human(report?)
    }
}

/// Blends one position.
pub async fn blend(
    corners_path: &str,
    position: Point,
    exact: bool,
    config_path: Option<&str>,
    model: Option<&str>,
) -> Result<BlendReport> {
    let engine = open_session(corners_path, config_path, model).await?;
    let position = position.clamped();
    let cell = engine.map_position_to_cell(position);
    let (pattern, source) = if exact {
        (engine.decode_exact_at(position).await?, None)
    } else {
        let outcome = engine.blend_at(position).await?;
        (outcome.pattern, Some(outcome.source))
    };
    Ok(BlendReport {
        position,
        cell,
        exact,
        source,
        model_ready: engine.is_model_ready(),
        pattern,
    })
}

fn run_human(report: BlendReport) -> Result<ExitCode> {
    println!(
        "{} ({:.3}, {:.3})",
        "Position:".cyan().bold(),
        report.position.x,
        report.position.y
    );
    println!(
        "{} #{} (col {}, row {})",
        "Cell:".dimmed(),
        report.cell.index,
        report.cell.col,
        report.cell.row
    );
    let source = match (report.exact, report.source) {
        (true, _) => "exact decode".to_string(),
        (false, Some(PatternSource::Latent { version })) => format!("latent (v{})", version),
        (false, Some(PatternSource::Direct)) | (false, None) => "direct blend".to_string(),
    };
    println!("{} {}", "Source:".dimmed(), source);
    if !report.model_ready {
        println!("{} model not loaded, blended directly", "!".yellow());
    }
    println!();
    print!("{}", report.pattern);
    println!(
        "\n{} {} hit(s)",
        "SUCCESS".green().bold(),
        report.pattern.hit_count()
    );
    Ok(ExitCode::SUCCESS)
}

fn run_json(report: Result<BlendReport>) -> Result<ExitCode> {
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
