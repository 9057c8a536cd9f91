#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for tosdr-harvest
//!
//! Harvests the public ToS;DR service catalogue: every service's name, rating,
//! and the links to its legal documents.
//!
//! # Module Organization
//!
//! - [`crawl`]: Rate-limited fetching, index discovery, record normalization, and
//!   concurrent collection
//! - [`commands`]: Command-line interface, configuration, and output

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod crawl;

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

pub use crate::commands::{Host, run};
