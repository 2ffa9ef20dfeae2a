//! Common types and utilities for the dtsb declaration bundler.
//!
//! This crate provides foundational types used across all dtsb crates:
//! - Source spans (`Span`)
//! - Line/column lookup (`LineMap`, `Position`)
//! - Source map generation (`SourceMapGenerator`, `vlq`)
//! - Path helpers shared by the bundler and the CLI
//! - Diagnostics reported alongside bundle output

// Common types - shared enums used by emitter and bundler
pub mod common;
pub use common::NewLineKind;

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Position types for line/column source locations
pub mod position;
pub use position::{LineMap, Position};

// Source Map generation
pub mod source_map;
pub use source_map::SourceMapGenerator;

// Path manipulation for module ids and emitted file names
pub mod path;

// Diagnostics
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory};
