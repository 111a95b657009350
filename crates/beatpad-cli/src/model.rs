//! Model selection for CLI commands.

use std::rc::Rc;

use anyhow::{bail, Result};
use beatpad_engine::{ModelService, ReferenceModel};

/// Name of the built-in deterministic model.
pub const REFERENCE_MODEL: &str = "reference";

/// Resolves a `--model` argument.
///
/// `None` or `"reference"` selects the in-process reference model; an
/// `http://` or `https://` URL selects a remote model server.
pub fn resolve_model(spec: Option<&str>) -> Result<Rc<dyn ModelService>> {
    match spec {
        None | Some(REFERENCE_MODEL) => Ok(Rc::new(ReferenceModel::new())),
        Some(url) if url.starts_with("http://") || url.starts_with("https://") => remote(url),
        Some(other) => bail!(
            "unknown model '{}' (expected '{}' or an http(s) URL)",
            other,
            REFERENCE_MODEL
        ),
    }
}

#[cfg(feature = "remote")]
fn remote(url: &str) -> Result<Rc<dyn ModelService>> {
    Ok(Rc::new(crate::remote::HttpModel::new(url)))
}

#[cfg(not(feature = "remote"))]
fn remote(url: &str) -> Result<Rc<dyn ModelService>> {
    bail!(
        "model '{}' needs HTTP support; rebuild with --features remote",
        url
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_is_default() {
        assert!(resolve_model(None).is_ok());
        assert!(resolve_model(Some("reference")).is_ok());
    }

    #[test]
    fn test_unknown_model_rejected() {
        let err = resolve_model(Some("magenta")).err().unwrap();
        assert!(err.to_string().contains("unknown model"));
    }

    #[cfg(feature = "remote")]
    #[test]
    fn test_url_selects_remote() {
        let model = resolve_model(Some("http://localhost:8000")).unwrap();
        assert!(!model.is_ready());
    }
}
