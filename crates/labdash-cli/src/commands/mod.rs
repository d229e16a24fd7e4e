use std::path::Path;

use anyhow::{Context, Result, bail};
use labdash_core::models::BucketKey;
use labdash_core::test_log::PREVIEW_CHARS;
use labdash_core::{Dashboard, DashboardConfig};
use serde_json::json;

use crate::cli::{Commands, NotesCommand};

mod support;
mod web;

use self::support::{parse_note_value, print_json};
use self::web::{WebServeOptions, serve};


pub(crate) fn run_from_root(root: Option<&Path>, command: Commands) -> Result<()> {
    validate_command_preflight(&command)?;

    let dashboard = Dashboard::new(resolve_config(root));
    run_validated(&dashboard, command)
}

fn resolve_config(root: Option<&Path>) -> DashboardConfig {
    let config = DashboardConfig::from_env();
    match root {
        Some(root) => config.with_report_base(root),
        None => config,
    }
}

fn validate_command_preflight(command: &Commands) -> Result<()> {
    if let Commands::Notes(args) = command {
        if let NotesCommand::Set { key, .. } = &args.command {
            if key.trim().is_empty() {
                bail!("note key must not be empty");
            }
        }
    }
    Ok(())
}

fn run_validated(dashboard: &Dashboard, command: Commands) -> Result<()> {
    match command {
        Commands::Dates { platform } => {
            print_json(&dashboard.list_dates(&platform)?)?;
        }
        Commands::Summary(args) => {
            let Some(summary) = dashboard
                .summary(&args.platform, &args.date)
                .with_context(|| format!("failed to summarize {}/{}", args.platform, args.date))?
            else {
                bail!("report not found: {}/{}", args.platform, args.date);
            };
            print_json(&summary)?;
        }
        Commands::Trend(args) => {
            let bucket = args
                .category
                .zip(args.level)
                .map(|(category, level)| BucketKey::new(category, level));
            let points = dashboard.trend(
                &args.platform,
                args.end_date.as_deref(),
                bucket,
                args.range,
            )?;
            print_json(&points)?;
        }
        Commands::Diff(args) => {
            let report = dashboard.diff(&args.platform, &args.date_curr, &args.date_prev)?;
            print_json(&report)?;
        }
        Commands::Notes(args) => match args.command {
            NotesCommand::Get(run) => {
                print_json(&dashboard.notes(&run.platform, &run.date)?)?;
            }
            NotesCommand::Set {
                platform,
                date,
                key,
                value,
            } => {
                dashboard.save_note(&platform, &date, &key, parse_note_value(&value))?;
                print_json(&json!({ "status": "success", "key": key.trim() }))?;
            }
        },
        Commands::Locate(args) => {
            let bucket = BucketKey::new(args.category, args.level);
            let archive = dashboard.locate_archive(&args.platform, &args.date, bucket)?;
            print_json(&json!({
                "bucket": bucket.to_string(),
                "archive": archive.map(|path| path.display().to_string()),
            }))?;
        }
        Commands::LogDetail(args) => {
            let bucket = BucketKey::new(args.category, args.level);
            let detail = dashboard
                .test_log_detail(&args.platform, &args.date, bucket, &args.test_name)
                .with_context(|| {
                    format!("failed to read log of {} in {bucket}", args.test_name)
                })?;
            if args.preview {
                print_json(&detail.preview(PREVIEW_CHARS))?;
            } else {
                print_json(&detail)?;
            }
        }
        Commands::CurrentPlatform => {
            print_json(&dashboard.current_platform()?)?;
        }
        Commands::Pregenerate => {
            let report = dashboard
                .pregenerate_all()
                .context("failed to pregenerate summary caches")?;
            print_json(&report)?;
        }
        Commands::Web(args) => {
            serve(
                dashboard.clone(),
                WebServeOptions {
                    host: &args.host,
                    port: args.port,
                },
            )?;
        }
    }
    Ok(())
}
