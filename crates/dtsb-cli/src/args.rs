use clap::{Parser, ValueEnum};
use dtsb_common::NewLineKind;
use std::path::PathBuf;

/// CLI arguments for the dtsb binary.
#[derive(Parser, Debug)]
#[command(
    name = "dtsb",
    version,
    about = "Bundle TypeScript declaration files along the chunks of a host bundler"
)]
pub struct CliArgs {
    /// Path to the bundle manifest (JSON).
    pub manifest: PathBuf,

    // ==================== Output ====================
    /// Directory the host bundler writes chunks to. Overrides the manifest.
    #[arg(long = "outDir", alias = "out-dir")]
    pub out_dir: Option<PathBuf>,

    /// Directory for declaration files, if different from the output directory.
    #[arg(long = "declarationDir", alias = "declaration-dir")]
    pub declaration_dir: Option<PathBuf>,

    /// Emit a source map next to every declaration file.
    #[arg(long = "declarationMap", alias = "declaration-map")]
    pub declaration_map: bool,

    /// Newline sequence used in emitted files.
    #[arg(long = "newLine", alias = "new-line", value_enum, ignore_case = true)]
    pub new_line: Option<NewLine>,

    // ==================== Environment ====================
    /// Base directory for relative output paths. Defaults to the manifest's directory.
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Bundle and report, but write nothing.
    #[arg(long = "dryRun", alias = "dry-run")]
    pub dry_run: bool,

    /// Colored diagnostics. Defaults to on when stderr is a terminal.
    #[arg(long)]
    pub pretty: Option<bool>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum NewLine {
    Lf,
    Crlf,
}

impl From<NewLine> for NewLineKind {
    fn from(value: NewLine) -> Self {
        match value {
            NewLine::Lf => NewLineKind::Lf,
            NewLine::Crlf => NewLineKind::Crlf,
        }
    }
}
