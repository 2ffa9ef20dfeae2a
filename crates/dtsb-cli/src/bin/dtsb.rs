#![allow(clippy::print_stderr)]

use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;

use dtsb_cli::args::CliArgs;
use dtsb_cli::{driver, tracing_config};

const EXIT_SUCCESS: i32 = 0;
const EXIT_DIAGNOSTICS: i32 = 1;

fn main() -> Result<()> {
    // DTSB_LOG / RUST_LOG enable logging; DTSB_LOG_FORMAT=text|tree|json.
    tracing_config::init_tracing();

    let args = CliArgs::parse();
    let summary = driver::run(&args)?;

    if !summary.diagnostics.is_empty() {
        let color = args.pretty.unwrap_or_else(|| std::io::stderr().is_terminal());
        eprintln!("{}", summary.reporter(color).render(&summary.diagnostics));
    }

    if args.dry_run {
        for chunk in &summary.output.chunks {
            println!("{} ({} bytes)", chunk.declaration.file_name, chunk.declaration.contents.len());
            if let Some(map) = &chunk.declaration_map {
                println!("{} ({} bytes)", map.file_name, map.contents.len());
            }
        }
    } else {
        for path in &summary.written {
            println!("{}", path.display());
        }
    }

    let status = if summary.has_errors() {
        EXIT_DIAGNOSTICS
    } else {
        EXIT_SUCCESS
    };
    std::process::exit(status);
}
