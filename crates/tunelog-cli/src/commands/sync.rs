use chrono::NaiveDate;
use tunelog_core::{SyncOptions, SyncReport, SyncService, SyncStatus};

use crate::error::CliError;

pub async fn run_sync(
    service: &SyncService,
    date: Option<NaiveDate>,
    dry_run: bool,
    as_json: bool,
) -> Result<(), CliError> {
    let date = date.unwrap_or_else(|| service.today());
    let report = service
        .run_for_date(date, SyncOptions { dry_run })
        .await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if let SyncStatus::DryRun { content } = &report.status {
        print!("{content}");
        return Ok(());
    }

    for line in format_report_lines(&report) {
        println!("{line}");
    }
    Ok(())
}

pub fn format_report_lines(report: &SyncReport) -> Vec<String> {
    let mut lines = Vec::new();
    match &report.status {
        SyncStatus::UpToDate => {
            lines.push(format!("{} is up to date", report.path));
            lines.push(format!(
                "Fetched {} plays, none new for {}",
                report.fetched, report.date
            ));
        }
        SyncStatus::Written { version, attempts } => {
            lines.push(format!(
                "Updated {} ({} new, {} already logged)",
                report.path, report.appended, report.duplicates
            ));
            let suffix = if *attempts == 1 { "" } else { "s" };
            lines.push(format!("Version {version} after {attempts} attempt{suffix}"));
        }
        SyncStatus::DryRun { .. } => {
            lines.push(format!(
                "Dry run for {} ({} new, {} already logged)",
                report.path, report.appended, report.duplicates
            ));
        }
    }
    if let Some(watermark) = report.watermark {
        lines.push(format!("Last synced {watermark}"));
    }
    lines
}
