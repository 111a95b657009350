//! Validate command implementation
//!
//! Validates an engine config file, and optionally a corner set file.

use anyhow::Result;
use beatpad_spec::{corner_set_hash, validate_config, CornerLabel, EngineConfig};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

use super::json_output::{
    input_error_to_json, validation_error_to_json, JsonError, JsonOutput,
};
use crate::input::{load_config, load_corners};

/// Summary of a validated corner set.
#[derive(Debug, Clone, Serialize)]
pub struct CornerSummary {
    /// Labels of filled corners, in slot order
    pub filled: Vec<CornerLabel>,
    pub complete: bool,
    /// Content hash of the corner set
    pub hash: String,
}

/// Result of a successful validation.
#[derive(Debug, Clone, Serialize)]
pub struct ValidateReport {
    pub config: EngineConfig,
    /// Cells in the configured grid
    pub cells: u32,
    /// Steps per playback loop
    pub loop_steps: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corners: Option<CornerSummary>,
}

/// Run the validate command
///
/// # Arguments
/// * `config_path` - Path to the engine config JSON file
/// * `corners_path` - Optional corner set JSON file to check as well
/// * `json_output` - Whether to output machine-readable JSON diagnostics
///
/// # Returns
/// Exit code: 0 if valid, 1 if invalid
pub fn run(config_path: &str, corners_path: Option<&str>, json_output: bool) -> Result<ExitCode> {
    let report = check(config_path, corners_path);
    if json_output {
        run_json(report)
    } else {
        run_human(config_path, report)
    }
}

/// Validates the inputs, collecting every error.
pub fn check(config_path: &str, corners_path: Option<&str>) -> Result<ValidateReport, Vec<JsonError>> {
    let mut errors = Vec::new();

    let config = match load_config(Some(Path::new(config_path))) {
        Ok(config) => {
            let result = validate_config(&config);
            errors.extend(result.errors.iter().map(validation_error_to_json));
            Some(config)
        }
        Err(err) => {
            errors.push(input_error_to_json(&err));
            None
        }
    };

    let corners = match corners_path.map(|p| load_corners(Path::new(p))) {
        Some(Ok(corners)) => Some(CornerSummary {
            filled: corners
                .iter()
                .filter_map(|(label, pattern)| pattern.map(|_| label))
                .collect(),
            complete: corners.is_complete(),
            hash: corner_set_hash(&corners),
        }),
        Some(Err(err)) => {
            errors.push(input_error_to_json(&err));
            None
        }
        None => None,
    };

    match config {
        Some(config) if errors.is_empty() => {
            let cells = config.columns * config.rows;
            let loop_steps = config.loop_steps();
            Ok(ValidateReport {
                config,
                cells,
                loop_steps,
                corners,
            })
        }
        _ => Err(errors),
    }
}

fn run_human(config_path: &str, report: Result<ValidateReport, Vec<JsonError>>) -> Result<ExitCode> {
    println!("{} {}", "Validating:".cyan().bold(), config_path);

    match report {
        Ok(report) => {
            println!(
                "{} {}x{} ({} cells), {} bar(s) = {} steps",
                "Grid:".dimmed(),
                report.config.columns,
                report.config.rows,
                report.cells,
                report.config.bars,
                report.loop_steps
            );
            println!(
                "{} temperature {}, threshold {}, path epsilon {}",
                "Blend:".dimmed(),
                report.config.temperature,
                report.config.blend_threshold,
                report.config.path_epsilon
            );
            if let Some(corners) = &report.corners {
                let labels: Vec<&str> = corners.filled.iter().map(|l| l.as_str()).collect();
                println!(
                    "{} [{}] ({})",
                    "Corners:".dimmed(),
                    labels.join(", "),
                    &corners.hash[..16]
                );
                if !corners.complete {
                    println!(
                        "  {} not every corner is set; blends will not use the model",
                        "!".yellow()
                    );
                }
            }
            println!("\n{}", "SUCCESS".green().bold());
            Ok(ExitCode::SUCCESS)
        }
        Err(errors) => {
            println!("\n{}", "Errors:".red().bold());
            for error in &errors {
                let location = error
                    .path
                    .as_ref()
                    .or(error.file.as_ref())
                    .map(|p| format!(" at {}", p))
                    .unwrap_or_default();
                println!(
                    "  {} [{}]{}: {}",
                    "x".red(),
                    error.code,
                    location.dimmed(),
                    error.message
                );
            }
            println!("\n{}", "FAILED".red().bold());
            Ok(ExitCode::from(1))
        }
    }
}

fn run_json(report: Result<ValidateReport, Vec<JsonError>>) -> Result<ExitCode> {
    let output = match report {
        Ok(report) => JsonOutput::success(report),
        Err(errors) => JsonOutput::failure(errors),
    };
    println!("{}", output.to_json_string());
    Ok(if output.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
