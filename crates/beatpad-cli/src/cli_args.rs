//! CLI argument definitions for the BeatPad command-line interface.
//!
//! All `#[derive(Parser)]` and `#[derive(Subcommand)]` types are defined here,
//! keeping `main.rs` focused on dispatch logic.

use clap::{Parser, Subcommand};

/// BeatPad - Latent-space drum pattern blending
#[derive(Parser)]
#[command(name = "beatpad")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    /// Log debug output to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Blend the corner patterns at one surface position
    Blend {
        /// Path to the corner set file (JSON)
        #[arg(short, long)]
        corners: String,

        /// Horizontal position in [0, 1] (0 = corners A/C)
        #[arg(short)]
        x: f64,

        /// Vertical position in [0, 1] (0 = corners A/B)
        #[arg(short)]
        y: f64,

        /// Decode at the exact position instead of the cell center (uncached)
        #[arg(long)]
        exact: bool,

        /// Path to the engine config file (JSON)
        #[arg(long)]
        config: Option<String>,

        /// Model to use: "reference" (default) or an http(s) model server URL
        #[arg(short, long)]
        model: Option<String>,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Precompute playback along a drawn path
    Path {
        /// Path to the corner set file (JSON)
        #[arg(short, long)]
        corners: String,

        /// Path to a JSON array of {x, y} points
        #[arg(short, long)]
        path: String,

        /// Steps to precompute (default: one loop, bars * 16)
        #[arg(long)]
        steps: Option<usize>,

        /// Path to the engine config file (JSON)
        #[arg(long)]
        config: Option<String>,

        /// Model to use: "reference" (default) or an http(s) model server URL
        #[arg(short, long)]
        model: Option<String>,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Decode every grid cell and print a hit-count map
    Grid {
        /// Path to the corner set file (JSON)
        #[arg(short, long)]
        corners: String,

        /// Path to the engine config file (JSON)
        #[arg(long)]
        config: Option<String>,

        /// Model to use: "reference" (default) or an http(s) model server URL
        #[arg(short, long)]
        model: Option<String>,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Validate an engine config file
    Validate {
        /// Path to the engine config file (JSON)
        #[arg(long)]
        config: String,

        /// Also check a corner set file
        #[arg(short, long)]
        corners: Option<String>,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Start a WebSocket session server
    #[cfg(feature = "serve")]
    Serve {
        /// Port to listen on (default: 9124)
        #[arg(long)]
        port: Option<u16>,

        /// Path to the engine config file (JSON)
        #[arg(long)]
        config: Option<String>,

        /// Model to use: "reference" (default) or an http(s) model server URL
        #[arg(short, long)]
        model: Option<String>,
    },
}
