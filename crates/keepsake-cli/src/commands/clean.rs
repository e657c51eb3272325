use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use keepsake::config::{Config, RetentionConfig};
use keepsake::{Candidate, RetentionDecision, RetentionPolicy, SortOrder};
use regex::Regex;
use walkdir::WalkDir;

use crate::error::CliResult;
use crate::output::{OutputFormat, format_timestamp, truncate_string};

#[derive(Parser)]
pub struct CleanCommand {
    #[clap(help = "Directory containing the backup files to prune")]
    pub source: PathBuf,

    #[clap(
        long,
        short,
        help = "Regex a file name must match; the first capture group is the date when --date-source is filename"
    )]
    pub pattern: Option<String>,

    #[clap(long, help = "Ignore files smaller than this many bytes")]
    pub min_size: Option<u64>,

    #[clap(
        long,
        help = "Move expired files here instead of deleting them; relative paths resolve against the source directory"
    )]
    pub destination: Option<PathBuf>,

    #[clap(
        long,
        help = "Where the file date comes from (filename, created, modified)"
    )]
    pub date_source: Option<String>,

    #[clap(long, help = "Which copy wins a contested bucket (newest, oldest)")]
    pub order: Option<String>,

    #[clap(long, short = 'n', help = "Report intended actions without touching any file")]
    pub dry_run: bool,

    #[clap(long, help = "Override the monthly retention window in days")]
    pub monthly: Option<i64>,

    #[clap(long, help = "Override the weekly retention window in days")]
    pub weekly: Option<i64>,

    #[clap(long, help = "Override the daily retention window in days")]
    pub daily: Option<i64>,

    #[clap(long, help = "Override the intra-daily retention window in days")]
    pub intra_daily: Option<i64>,
}

/// Where a candidate's timestamp is sourced from. Resolved once up front;
/// the classifier only ever sees the resulting timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DateSource {
    FileName,
    Created,
    Modified,
}

struct FileReport {
    file: String,
    date: String,
    reasons: String,
    action: String,
}

impl CleanCommand {
    pub fn execute(&self, config: &Config, format: OutputFormat) -> CliResult<()> {
        let source = self.source.as_path();
        if !source.is_dir() {
            return Err(format!("Source '{}' is not a directory", source.display()).into());
        }

        let pattern = self
            .pattern
            .clone()
            .unwrap_or_else(|| config.cleanup.pattern.clone());
        let regex =
            Regex::new(&pattern).map_err(|e| format!("Invalid pattern '{pattern}': {e}"))?;
        let min_size = self.min_size.unwrap_or(config.cleanup.min_size_bytes);
        let date_source = parse_date_source(
            self.date_source
                .as_deref()
                .unwrap_or(&config.cleanup.date_source),
        )?;
        let order = parse_order(self.order.as_deref().unwrap_or(&config.retention.prefer))?;
        let policy = self.effective_policy(&config.retention);
        let destination = self
            .destination
            .clone()
            .or_else(|| config.cleanup.destination.clone())
            .map(|d| if d.is_absolute() { d } else { source.join(d) });

        let candidates = collect_candidates(source, &regex, min_size, date_source)?;
        tracing::info!(
            "Classifying {} candidate(s) in {}",
            candidates.len(),
            source.display()
        );

        let results = keepsake::classify(&policy, order, candidates)?;

        let mut kept = 0u32;
        let mut removed = 0u32;
        let mut reports = Vec::with_capacity(results.len());
        for (candidate, decision) in &results {
            reports.push(self.apply(candidate, decision, destination.as_deref()));
            if decision.retain {
                kept += 1;
            } else {
                removed += 1;
            }
        }

        self.report(format, &reports, kept, removed)
    }

    /// Carry out (or, in dry-run mode, narrate) the verdict for one file.
    /// Move/delete failures are reported per file and never abort the run:
    /// the classification is already complete at this point.
    fn apply(
        &self,
        candidate: &Candidate,
        decision: &RetentionDecision,
        destination: Option<&Path>,
    ) -> FileReport {
        let path = PathBuf::from(&candidate.id);
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| candidate.id.clone());
        let date = candidate
            .timestamp
            .as_ref()
            .map(format_timestamp)
            .unwrap_or_default();
        let reasons = decision
            .reasons
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");

        let action = if decision.retain {
            "keep".to_string()
        } else if self.dry_run {
            match destination {
                Some(dest) => format!("would move to {}", dest.display()),
                None => "would delete".to_string(),
            }
        } else {
            match destination {
                Some(dest) => match move_file(&path, dest) {
                    Ok(()) => format!("moved to {}", dest.display()),
                    Err(e) => {
                        tracing::warn!("Failed to move {}: {e}", path.display());
                        format!("move failed: {e}")
                    }
                },
                None => match std::fs::remove_file(&path) {
                    Ok(()) => "deleted".to_string(),
                    Err(e) => {
                        tracing::warn!("Failed to delete {}: {e}", path.display());
                        format!("delete failed: {e}")
                    }
                },
            }
        };

        FileReport {
            file,
            date,
            reasons,
            action,
        }
    }

    fn report(
        &self,
        format: OutputFormat,
        reports: &[FileReport],
        kept: u32,
        removed: u32,
    ) -> CliResult<()> {
        match format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "source": self.source.display().to_string(),
                    "dry_run": self.dry_run,
                    "files": reports.iter().map(|r| {
                        serde_json::json!({
                            "file": r.file,
                            "date": r.date,
                            "reasons": r.reasons,
                            "action": r.action,
                        })
                    }).collect::<Vec<_>>(),
                    "summary": {
                        "kept": kept,
                        "removed": removed,
                    }
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                if self.dry_run {
                    println!("Cleanup Plan (dry run)");
                    println!("======================\n");
                } else {
                    println!("Cleanup Results");
                    println!("===============\n");
                }

                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["File", "Date", "Reasons", "Action"]);

                for r in reports {
                    table.add_row([&truncate_string(&r.file, 60), &r.date, &r.reasons, &r.action]);
                }

                println!("{table}\n");
                println!("Total: {kept} kept, {removed} expired");
            }
        }

        Ok(())
    }

    fn effective_policy(&self, retention: &RetentionConfig) -> RetentionPolicy {
        let mut policy = retention.to_policy();
        if let Some(days) = self.monthly {
            policy.monthly = days;
        }
        if let Some(days) = self.weekly {
            policy.weekly = days;
        }
        if let Some(days) = self.daily {
            policy.daily = days;
        }
        if let Some(days) = self.intra_daily {
            policy.intra_daily = days;
        }
        policy
    }
}

fn parse_date_source(value: &str) -> CliResult<DateSource> {
    match value {
        "filename" => Ok(DateSource::FileName),
        "created" => Ok(DateSource::Created),
        "modified" => Ok(DateSource::Modified),
        other => {
            Err(format!("Unknown date source: {other}. Use filename, created, or modified.").into())
        }
    }
}

fn parse_order(value: &str) -> CliResult<SortOrder> {
    match value {
        "newest" => Ok(SortOrder::PreferNewest),
        "oldest" => Ok(SortOrder::PreferOldest),
        other => Err(format!("Unknown order: {other}. Use newest or oldest.").into()),
    }
}

/// Enumerate direct children of `source` and build classifier candidates
/// from the files that pass the size and name filters.
///
/// A file whose name matches the pattern but whose captured date does not
/// parse is skipped with a warning; one bad name must not fail the run.
fn collect_candidates(
    source: &Path,
    pattern: &Regex,
    min_size: u64,
    date_source: DateSource,
) -> CliResult<Vec<Candidate>> {
    let mut candidates = Vec::new();

    for entry in WalkDir::new(source).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| format!("Failed to read {}: {e}", source.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(captures) = pattern.captures(&name) else {
            tracing::debug!("Skipping {name}: name does not match pattern");
            continue;
        };
        let metadata = entry
            .metadata()
            .map_err(|e| format!("Failed to read metadata for {name}: {e}"))?;
        if metadata.len() < min_size {
            tracing::debug!("Skipping {name}: below minimum size");
            continue;
        }

        let timestamp = match date_source {
            DateSource::FileName => {
                match captures.get(1).and_then(|m| parse_file_date(m.as_str())) {
                    Some(ts) => ts,
                    None => {
                        tracing::warn!("Skipping {name}: no parseable date in filename");
                        continue;
                    }
                }
            }
            DateSource::Created => DateTime::<Utc>::from(metadata.created()?),
            DateSource::Modified => DateTime::<Utc>::from(metadata.modified()?),
        };

        candidates.push(Candidate::new(
            entry.path().display().to_string(),
            timestamp,
        ));
    }

    Ok(candidates)
}

/// Parse a date captured from a file name. Datetime shapes are tried
/// before plain dates so a `2024-06-01_13-30-00` capture keeps its time
/// of day.
fn parse_file_date(value: &str) -> Option<DateTime<Utc>> {
    const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d_%H-%M-%S", "%Y-%m-%d %H:%M:%S", "%Y%m%d%H%M%S"];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.and_utc());
        }
    }

    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }

    None
}

fn move_file(path: &Path, destination: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(destination)?;
    let file_name = path
        .file_name()
        .ok_or_else(|| std::io::Error::other("path has no file name"))?;
    std::fs::rename(path, destination.join(file_name))
}
