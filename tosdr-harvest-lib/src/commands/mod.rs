//! Command-line interface for tosdr-harvest
//!
//! This module parses arguments, loads configuration, sets up logging and the
//! terminal progress display, and hands the real work to [`crate::crawl`].
//!
//! ## Commands
//!
//! - **crawl**: Walk the service index, harvest every service's detail record,
//!   and write the dataset as a JSON array
//! - **init**: Generate a default configuration file
//! - **validate**: Check a configuration file for syntax and range errors
//!
//! Configuration lives in an optional TOML file (`tosdr-harvest.toml` by default);
//! every key has a default, and the `crawl` flags override the file.

mod common;
mod config;
mod crawl;
mod host;
mod init;
mod output;
mod progress_reporter;
mod run;
mod validate;

#[cfg(debug_assertions)]
pub use config::Config;

pub use crawl::{CrawlArgs, process_crawl};
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use run::run;
pub use validate::{ValidateArgs, validate_config};
