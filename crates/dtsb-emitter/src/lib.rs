//! Declaration printer for the dtsb declaration bundler.
//!
//! - `printer` - `Printer`, which re-prints declaration trees as text
//! - `source_writer` - output buffer with line/column tracking and source map segments

pub mod printer;
pub mod source_writer;

pub use printer::{PrintOptions, PrintOutput, Printer, print_source_file};
