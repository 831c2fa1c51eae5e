//! Cleanup run configuration with sensible defaults.
//!
//! [`CleanupConfig`] captures everything a run needs from the command line
//! and environment, and converts the pipeline part into an
//! [`OrchestratorConfig`] via [`orchestrator_config`](CleanupConfig::orchestrator_config).

use std::path::PathBuf;

use tidymark::pipeline::OrchestratorConfig;

/// Environment variable holding the Raindrop.io API token.
pub const RAINDROP_TOKEN_ENV: &str = "RAINDROP_TOKEN";

/// Environment variable holding the OpenRouter API key.
pub const OPENROUTER_KEY_ENV: &str = "OPENROUTER_KEY";

/// Configuration for one invocation of the cleanup tool.
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// Bookmarks reviewed per batch. Default: `10`.
    pub batch_size: usize,
    /// Display name of the archive collection. Default: `"Archive"`.
    pub archive_name: String,
    /// Simulate every mutation. Default: `false`.
    pub dry_run: bool,
    /// Use the line-based presenter instead of the full-screen one.
    pub text_mode: bool,
    /// Directory for per-collection session records. Default: `.raindrop_state`.
    pub state_dir: PathBuf,
    /// Model identifier. Default: `"anthropic/claude-sonnet-4"`.
    pub model: String,
    /// Write debug logs to a file in `debug_dir`.
    pub debug: bool,
    /// Default: `.raindrop_debug`.
    pub debug_dir: PathBuf,
    /// Raise terminal logging to `debug`.
    pub verbose: bool,
    /// Highest page index visited. Default: `100`.
    pub page_limit: u32,
    /// Offer a break every this many bookmarks. Default: `25`.
    pub break_every: usize,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            archive_name: "Archive".to_string(),
            dry_run: false,
            text_mode: false,
            state_dir: PathBuf::from(".raindrop_state"),
            model: tidymark::DEFAULT_MODEL.to_string(),
            debug: false,
            debug_dir: PathBuf::from(".raindrop_debug"),
            verbose: false,
            page_limit: 100,
            break_every: 25,
        }
    }
}

impl CleanupConfig {
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            dry_run: self.dry_run,
            page_limit: self.page_limit,
            break_every: self.break_every,
        }
    }

    /// Terminal log filter used when `RUST_LOG` is unset.
    pub fn log_directive(&self) -> &'static str {
        if self.verbose {
            "warn,tidymark=debug,tidymark_tui=debug,tidymark_cli=debug"
        } else {
            "warn"
        }
    }

    pub fn debug_log_path(&self) -> PathBuf {
        self.debug_dir.join("tidymark.log")
    }
}

/// Read a required credential from the environment.
pub fn require_env(name: &str) -> Result<String, String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(format!("{name} environment variable is not set")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_command_line() {
        let config = CleanupConfig::default();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.archive_name, "Archive");
        assert_eq!(config.state_dir, PathBuf::from(".raindrop_state"));
        assert_eq!(config.model, "anthropic/claude-sonnet-4");
        assert!(!config.dry_run);
    }

    #[test]
    fn orchestrator_config_carries_run_knobs() {
        let config = CleanupConfig {
            dry_run: true,
            break_every: 5,
            ..Default::default()
        };
        let oc = config.orchestrator_config();
        assert!(oc.dry_run);
        assert_eq!(oc.page_limit, 100);
        assert_eq!(oc.break_every, 5);
    }

    #[test]
    fn verbose_raises_crate_logging() {
        let quiet = CleanupConfig::default();
        assert_eq!(quiet.log_directive(), "warn");
        let loud = CleanupConfig {
            verbose: true,
            ..Default::default()
        };
        assert!(loud.log_directive().contains("tidymark=debug"));
        assert_eq!(
            loud.debug_log_path(),
            PathBuf::from(".raindrop_debug/tidymark.log")
        );
    }

    #[test]
    fn missing_credential_is_reported_by_name() {
        let err = require_env("TIDYMARK_TEST_SURELY_UNSET_VAR").unwrap_err();
        assert!(err.contains("TIDYMARK_TEST_SURELY_UNSET_VAR"));
    }
}
