use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod args;
mod parsers;


pub use args::{
    DiffArgs, LocateArgs, LogDetailArgs, NotesArgs, NotesCommand, RunArg, TrendArgs, WebArgs,
};

#[derive(Debug, Parser)]
#[command(name = "labdash")]
#[command(about = "Switch bring-up test report dashboard", version)]
pub struct Cli {
    /// Report base directory; overrides LABDASH_REPORT_BASE.
    #[arg(long)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run dates recorded for a platform, newest first.
    Dates { platform: String },
    Summary(RunArg),
    Trend(TrendArgs),
    Diff(DiffArgs),
    Notes(NotesArgs),
    /// Archive backing one category/level bucket of a run.
    Locate(LocateArgs),
    /// Log section of one test, searched in its bucket's archive.
    LogDetail(LogDetailArgs),
    CurrentPlatform,
    /// Build every missing or stale summary cache.
    Pregenerate,
    Web(WebArgs),
}
