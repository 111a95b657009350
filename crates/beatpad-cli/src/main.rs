//! BeatPad CLI - Command-line interface for latent drum pattern blending
//!
//! This binary provides commands for blending corner patterns, precomputing
//! path playback, warming the cell cache and serving interactive sessions.

mod cli_args;

use beatpad_cli::{commands, logging};
use beatpad_spec::Point;
use clap::Parser;
use cli_args::{Cli, Commands};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Blend {
            corners,
            x,
            y,
            exact,
            config,
            model,
            json,
        } => commands::blend::run(
            &corners,
            Point::new(x, y),
            exact,
            config.as_deref(),
            model.as_deref(),
            json,
        ),
        Commands::Path {
            corners,
            path,
            steps,
            config,
            model,
            json,
        } => commands::path::run(
            &corners,
            &path,
            steps,
            config.as_deref(),
            model.as_deref(),
            json,
        ),
        Commands::Grid {
            corners,
            config,
            model,
            json,
        } => commands::grid::run(&corners, config.as_deref(), model.as_deref(), json),
        Commands::Validate {
            config,
            corners,
            json,
        } => commands::validate::run(&config, corners.as_deref(), json),
        #[cfg(feature = "serve")]
        Commands::Serve {
            port,
            config,
            model,
        } => commands::serve::run(
            port.unwrap_or(commands::serve::DEFAULT_PORT),
            config.as_deref(),
            model.as_deref(),
        ),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
