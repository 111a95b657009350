//! Path command implementation
//!
//! Records a drawn path from a points file, precomputes one pattern per loop
//! step along it, and prints the playback table.

use anyhow::{bail, Context, Result};
use beatpad_engine::PathPlayback;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

use super::json_output::JsonOutput;
use super::{block_on_local, errors_to_json, open_session};
use crate::input::load_path_points;

/// Result of a path precompute.
#[derive(Debug, Clone, Serialize)]
pub struct PathReport {
    /// Points in the input file
    pub input_points: usize,
    /// Points kept after near-duplicate filtering
    pub recorded_points: usize,
    /// Total path length in normalized units
    pub length: f64,
    pub playback: PathPlayback,
}

/// Run the path command
///
/// # Arguments
/// * `corners_path` - Path to the corner set JSON file
/// * `path_file` - Path to a JSON array of `{x, y}` points
/// * `steps` - Steps to precompute (defaults to the loop length)
/// * `config_path` - Optional engine config JSON file
/// * `model` - Model selector
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 on success, 1 on failure
pub fn run(
    corners_path: &str,
    path_file: &str,
    steps: Option<usize>,
    config_path: Option<&str>,
    model: Option<&str>,
    json_output: bool,
) -> Result<ExitCode> {
    let report = block_on_local(precompute(
        corners_path,
        path_file,
        steps,
        config_path,
        model,
    ))?;
    if json_output {
        run_json(report)
    } else {
        run_human(report?)
    }
}

/// Records the path and precomputes its playback table.
pub async fn precompute(
    corners_path: &str,
    path_file: &str,
    steps: Option<usize>,
    config_path: Option<&str>,
    model: Option<&str>,
) -> Result<PathReport> {
    let points = load_path_points(Path::new(path_file))
        .with_context(|| format!("Failed to load path: {}", path_file))?;
    let engine = open_session(corners_path, config_path, model).await?;

    let mut iter = points.iter().copied();
    match iter.next() {
        Some(first) => engine.begin_path(first),
        None => bail!("path file '{}' has no points", path_file),
    }
    for point in iter {
        engine.append_path_point(point);
    }
    let path = engine.path();
    if path.len() < 2 {
        bail!(
            "path needs at least 2 distinct points, got {} after filtering",
            path.len()
        );
    }

    let step_count = steps.unwrap_or_else(|| engine.loop_steps());
    let outcome = engine.precompute_path_playback(step_count).await?;
    let playback = outcome
        .playback
        .context("path playback was not computed")?;

    Ok(PathReport {
        input_points: points.len(),
        recorded_points: path.len(),
        length: path.total_length(),
        playback,
    })
}

fn run_human(report: PathReport) -> Result<ExitCode> {
    println!(
        "{} {} point(s), {} kept, length {:.3}",
        "Path:".cyan().bold(),
        report.input_points,
        report.recorded_points,
        report.length
    );
    let source = match report.playback.encoding_version {
        Some(version) => format!("latent (v{})", version),
        None => "direct blend".to_string(),
    };
    println!("{} {}", "Source:".dimmed(), source);
    println!();

    for (i, step) in report.playback.steps.iter().enumerate() {
        let position = format!("({:.3}, {:.3})", step.position.x, step.position.y);
        match &step.pattern {
            Some(pattern) => println!(
                "  {:>3} {} {} hit(s)",
                i,
                position.dimmed(),
                pattern.hit_count()
            ),
            None => println!("  {:>3} {} {}", i, position.dimmed(), "decode failed".red()),
        }
    }
    println!();

    let failed = report.playback.failed_steps();
    if failed == 0 {
        println!(
            "{} {} step(s) precomputed",
            "SUCCESS".green().bold(),
            report.playback.len()
        );
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "{} {} of {} step(s) failed to decode",
            "PARTIAL".yellow().bold(),
            failed,
            report.playback.len()
        );
        Ok(ExitCode::from(1))
    }
}

fn run_json(report: Result<PathReport>) -> Result<ExitCode> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use beatpad_spec::Track;
    use pretty_assertions::assert_eq;

    fn write_inputs(dir: &std::path::Path, points: &str) -> (String, String) {
        let corners = dir.join("corners.json");
        std::fs::write(
            &corners,
            r#"{
                "a": {"kick": "x...x...x...x..."},
                "b": {"snare": "....x.......x..."},
                "c": {"hat_closed": "x.x.x.x.x.x.x.x."},
                "d": {"ride": "xxxxxxxxxxxxxxxx"}
            }"#,
        )
        .unwrap();
        let path = dir.join("path.json");
        std::fs::write(&path, points).unwrap();
        (
            corners.to_string_lossy().into_owned(),
            path.to_string_lossy().into_owned(),
        )
    }

    #[test]
    fn test_diagonal_path_defaults_to_loop_length() {
        let tmp = tempfile::tempdir().unwrap();
        let (corners, path) = write_inputs(
            tmp.path(),
            r#"[{"x": 0.0, "y": 0.0}, {"x": 0.5, "y": 0.5}, {"x": 1.0, "y": 1.0}]"#,
        );
        let report = block_on_local(precompute(&corners, &path, None, None, None))
            .unwrap()
            .unwrap();
        assert_eq!(report.recorded_points, 3);
        assert_eq!(report.playback.len(), 32);
        assert_eq!(report.playback.failed_steps(), 0);

        let first = report.playback.steps[0].pattern.as_ref().unwrap();
        assert!(first.is_on(Track::Kick, 0));
        assert!(!first.is_on(Track::Ride, 1));
    }

    #[test]
    fn test_explicit_step_count() {
        let tmp = tempfile::tempdir().unwrap();
        let (corners, path) =
            write_inputs(tmp.path(), r#"[{"x": 0.0, "y": 0.0}, {"x": 1.0, "y": 0.0}]"#);
        let report = block_on_local(precompute(&corners, &path, Some(4), None, None))
            .unwrap()
            .unwrap();
        assert_eq!(report.playback.len(), 4);
        assert!((report.length - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_point_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let (corners, path) = write_inputs(
            tmp.path(),
            r#"[{"x": 0.2, "y": 0.2}, {"x": 0.2001, "y": 0.2}]"#,
        );
        let err = block_on_local(precompute(&corners, &path, None, None, None))
            .unwrap()
            .unwrap_err();
        assert!(err.to_string().contains("at least 2"));
    }
}
