//! Building blocks of the `tidymark` command-line tool.
//!
//! [`CleanupConfig`] collects flags and environment, [`logging`] installs
//! the tracing subscriber, [`ConsoleHandler`] prints run progress,
//! [`select`] parses the collection and session pickers, and [`report`]
//! renders the final statistics.

pub mod config;
pub mod console;
pub mod logging;
pub mod report;
pub mod select;

pub use config::CleanupConfig;
pub use console::ConsoleHandler;
pub use report::Report;
