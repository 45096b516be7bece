// Report generation from a finished tally

use crate::collect::{StackTally, VacancyRow};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SUMMARY_BASENAME: &str = "stacks_summary";
pub const DETAILED_BASENAME: &str = "vacancies_detailed";
pub const DEFAULT_TOP: usize = 20;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Csv,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Some(ReportFormat::Csv),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub stack: String,
    pub vacancies_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedRow {
    pub vacancy: String,
    pub city: String,
    pub url: String,
    pub stacks: String,
}

impl From<&VacancyRow> for DetailedRow {
    fn from(row: &VacancyRow) -> Self {
        Self {
            vacancy: row.vacancy.clone(),
            city: row.city.clone(),
            url: row.url.clone(),
            stacks: row.stacks_joined(),
        }
    }
}

/// Paths of the two tables written for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPaths {
    pub summary: PathBuf,
    pub detailed: PathBuf,
}

impl ReportPaths {
    pub fn in_dir(dir: &Path, format: ReportFormat) -> Self {
        Self {
            summary: dir.join(format!("{}.{}", SUMMARY_BASENAME, format.extension())),
            detailed: dir.join(format!("{}.{}", DETAILED_BASENAME, format.extension())),
        }
    }
}

/// Per-stack vacancy counts, most frequent first; equal counts by name.
pub fn summary_rows(tally: &StackTally) -> Vec<SummaryRow> {
    let mut rows: Vec<SummaryRow> = tally
        .counts()
        .iter()
        .map(|(stack, count)| SummaryRow {
            stack: stack.clone(),
            vacancies_count: *count,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.vacancies_count
            .cmp(&a.vacancies_count)
            .then_with(|| a.stack.cmp(&b.stack))
    });
    rows
}

/// One row per processed vacancy, in fetch order.
pub fn detailed_rows(tally: &StackTally) -> Vec<DetailedRow> {
    tally.rows().iter().map(DetailedRow::from).collect()
}

/// Written ahead of every CSV header row.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub fn write_csv<T: Serialize>(rows: &[T], headers: &[&str], path: &Path) -> Result<(), ReportError> {
    let mut file = File::create(path)?;
    file.write_all(UTF8_BOM)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    writer.write_record(headers)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(rows: &[T], path: &Path) -> Result<(), ReportError> {
    let content = serde_json::to_string_pretty(rows)?;
    save_report(&content, path)?;
    Ok(())
}

/// Write both tables for `tally` into `dir`, creating it if needed.
pub fn write_reports(
    tally: &StackTally,
    dir: &Path,
    format: ReportFormat,
) -> Result<ReportPaths, ReportError> {
    fs::create_dir_all(dir)?;
    let paths = ReportPaths::in_dir(dir, format);
    let summary = summary_rows(tally);
    let detailed = detailed_rows(tally);

    match format {
        ReportFormat::Csv => {
            write_csv(&summary, &["stack", "vacancies_count"], &paths.summary)?;
            write_csv(&detailed, &["vacancy", "city", "url", "stacks"], &paths.detailed)?;
        }
        ReportFormat::Json => {
            write_json(&summary, &paths.summary)?;
            write_json(&detailed, &paths.detailed)?;
        }
    }

    tracing::info!(
        "Wrote {} and {}",
        paths.summary.display(),
        paths.detailed.display()
    );
    Ok(paths)
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Plain-text table of the `top` most frequent stacks.
pub fn generate_top_table(rows: &[SummaryRow], top: usize) -> String {
    let shown = &rows[..rows.len().min(top)];
    let width = shown
        .iter()
        .map(|r| r.stack.chars().count())
        .max()
        .unwrap_or(0)
        .max("stack".len());

    let mut table = String::new();
    table.push_str(&format!(
        "{:>4}  {:<width$}  {}\n",
        "#",
        "stack",
        "vacancies_count",
        width = width
    ));
    table.push_str(&format!("{}\n", "─".repeat(4 + 2 + width + 2 + "vacancies_count".len())));

    for (idx, row) in shown.iter().enumerate() {
        table.push_str(&format!(
            "{:>4}  {:<width$}  {:>15}\n",
            idx + 1,
            row.stack,
            row.vacancies_count,
            width = width
        ));
    }

    if shown.is_empty() {
        table.push_str("  (no stacks found)\n");
    }

    table
}
