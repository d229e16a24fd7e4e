use clap::{Args, Subcommand};
use labdash_core::models::{Category, Level, TrendRange};

use super::parsers::{parse_category, parse_level, parse_trend_range};

#[derive(Debug, Args)]
pub struct RunArg {
    pub platform: String,
    pub date: String,
}

#[derive(Debug, Args)]
pub struct TrendArgs {
    pub platform: String,
    /// Last day of the window; today when omitted.
    pub end_date: Option<String>,
    #[arg(long, value_parser = parse_category, requires = "level")]
    pub category: Option<Category>,
    #[arg(long, value_parser = parse_level, requires = "category")]
    pub level: Option<Level>,
    #[arg(long, default_value = "week", value_parser = parse_trend_range)]
    pub range: TrendRange,
}

#[derive(Debug, Args)]
pub struct DiffArgs {
    pub platform: String,
    pub date_curr: String,
    pub date_prev: String,
}

#[derive(Debug, Args)]
pub struct NotesArgs {
    #[command(subcommand)]
    pub command: NotesCommand,
}

#[derive(Debug, Subcommand)]
pub enum NotesCommand {
    Get(RunArg),
    Set {
        platform: String,
        date: String,
        key: String,
        /// JSON value; plain text is stored as a string.
        value: String,
    },
}

#[derive(Debug, Args)]
pub struct LocateArgs {
    pub platform: String,
    pub date: String,
    #[arg(value_parser = parse_category)]
    pub category: Category,
    #[arg(value_parser = parse_level)]
    pub level: Level,
}

#[derive(Debug, Args)]
pub struct LogDetailArgs {
    pub platform: String,
    pub date: String,
    #[arg(value_parser = parse_category)]
    pub category: Category,
    #[arg(value_parser = parse_level)]
    pub level: Level,
    pub test_name: String,
    /// Print a truncated preview in place of the full section.
    #[arg(long)]
    pub preview: bool,
}

#[derive(Debug, Args)]
pub struct WebArgs {
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    #[arg(long, default_value_t = 8787)]
    pub port: u16,
}
