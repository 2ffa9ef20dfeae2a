//! Fatal bundling errors.
//!
//! Anything recoverable is reported as a [`dtsb_common::Diagnostic`] on the
//! bundle output instead; these variants abort the whole run.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BundleError {
    /// A statement kind the reference tracer has no traversal rule for.
    UnsupportedSyntax { module: String, kind: &'static str },
    /// A declared entry module is listed as a chunk member but was never parsed.
    ModuleMissing { module: String, chunk: String },
}

impl fmt::Display for BundleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundleError::UnsupportedSyntax { module, kind } => {
                write!(f, "cannot trace references through {kind} in {module}")
            }
            BundleError::ModuleMissing { module, chunk } => {
                write!(
                    f,
                    "entry module {module} of chunk {chunk} has no parsed declarations"
                )
            }
        }
    }
}

impl std::error::Error for BundleError {}
