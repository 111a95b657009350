//! Input loading for corner sets, paths and engine configs.
//!
//! All inputs are JSON files. Corner files hold a [`CornerSet`] (`a`..`d`, each
//! a pattern keyed by track); path files hold an array of `{x, y}` points.

use beatpad_spec::{CornerSet, EngineConfig, Point};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Errors that can occur while loading an input file.
#[derive(Debug)]
pub enum InputError {
    /// File could not be read.
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON parsing failed.
    JsonParse { path: PathBuf, message: String },
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::FileRead { path, source } => {
                write!(f, "failed to read file '{}': {}", path.display(), source)
            }
            InputError::JsonParse { path, message } => {
                write!(f, "JSON parse error in '{}': {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InputError::FileRead { source, .. } => Some(source),
            _ => None,
        }
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, InputError> {
    let content = std::fs::read_to_string(path).map_err(|e| InputError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| InputError::JsonParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Loads a corner set file.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use beatpad_cli::input::load_corners;
///
/// let corners = load_corners(Path::new("corners.json")).unwrap();
/// println!("{} corner(s) filled", corners.filled());
/// ```
pub fn load_corners(path: &Path) -> Result<CornerSet, InputError> {
    load_json(path)
}

/// Loads an engine config, or returns the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, InputError> {
    match path {
        Some(path) => load_json(path),
        None => Ok(EngineConfig::default()),
    }
}

/// Loads the raw points of a path file.
pub fn load_path_points(path: &Path) -> Result<Vec<Point>, InputError> {
    load_json(path)
}
