//! BeatPad CLI library.
//!
//! This crate provides the core functionality for the `beatpad` binary:
//! input loading, model selection, logging setup, and the command
//! implementations (blend, path, grid, validate, serve).

pub mod commands;
pub mod input;
pub mod logging;
pub mod model;

#[cfg(feature = "remote")]
pub mod remote;
