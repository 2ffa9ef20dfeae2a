//! Log subscriber setup for the `dtsb` binary.
//!
//! Nothing is installed unless `DTSB_LOG` or `RUST_LOG` is set. The format is
//! picked with `DTSB_LOG_FORMAT`:
//!
//! ```bash
//! DTSB_LOG=debug dtsb bundle.json                          # flat text
//! DTSB_LOG=debug DTSB_LOG_FORMAT=tree dtsb bundle.json     # indented spans
//! DTSB_LOG=dtsb_bundler=trace DTSB_LOG_FORMAT=json dtsb bundle.json
//! ```
//!
//! Everything goes to stderr; stdout carries the list of written files.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Tree,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    fn from_env() -> Self {
        Self::parse(&std::env::var("DTSB_LOG_FORMAT").unwrap_or_default())
    }
}

/// `DTSB_LOG` wins over `RUST_LOG`; both use `EnvFilter` directive syntax.
fn build_filter() -> Option<EnvFilter> {
    if let Ok(directives) = std::env::var("DTSB_LOG") {
        return Some(EnvFilter::builder().parse_lossy(directives));
    }
    std::env::var("RUST_LOG")
        .is_ok()
        .then(EnvFilter::from_default_env)
}

pub fn init_tracing() {
    let Some(filter) = build_filter() else {
        return;
    };

    match LogFormat::from_env() {
        LogFormat::Tree => {
            let tree_layer = tracing_tree::HierarchicalLayer::new(2)
                .with_writer(std::io::stderr)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_targets(true);
            Registry::default().with(filter).with(tree_layer).init();
        }
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);
            Registry::default().with(filter).with(json_layer).init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
