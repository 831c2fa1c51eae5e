//! Tracing subscriber setup.
//!
//! Terminal output goes to stderr through an `EnvFilter` (`RUST_LOG`
//! overrides the default). With `--debug`, a second non-ANSI layer writes
//! every tidymark `debug!` line to a file.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use crate::config::CleanupConfig;

const DEBUG_FILE_DIRECTIVE: &str = "warn,tidymark=debug,tidymark_tui=debug,tidymark_cli=debug";

pub fn init(config: &CleanupConfig) -> Result<(), Box<dyn std::error::Error>> {
    let terminal_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_directive()));
    let terminal = fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(terminal_filter);

    let file = if config.debug {
        std::fs::create_dir_all(&config.debug_dir)?;
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(config.debug_log_path())?;
        Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file))
                .with_filter(EnvFilter::new(DEBUG_FILE_DIRECTIVE)),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(terminal)
        .with(file)
        .try_init()?;
    Ok(())
}
