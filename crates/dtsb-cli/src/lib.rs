//! Command-line driver for the declaration bundler.
//!
//! The `dtsb` binary is a thin wrapper: [`args`] parses flags, [`config`] reads
//! the bundle manifest, [`driver`] parses modules, bundles and writes files, and
//! [`reporter`] renders diagnostics.

pub mod args;
pub mod config;
pub mod driver;
pub mod reporter;
pub mod tracing_config;
