//! Shared enums that several crates need without depending on each other.

use serde::{Deserialize, Serialize};

/// Newline style used when printing declaration files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewLineKind {
    #[default]
    Lf,
    Crlf,
}

impl NewLineKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            NewLineKind::Lf => "\n",
            NewLineKind::Crlf => "\r\n",
        }
    }
}
