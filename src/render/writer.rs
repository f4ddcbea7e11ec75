use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;

use super::csv::render_csv;
use super::summary_table;
use super::text::render_grid;
use crate::model::summary::Report;

/// Spreadsheet applications need the BOM to pick UTF-8 for the bullet markers.
const UTF8_BOM: &str = "\u{feff}";

pub struct ReportWriter {
    text_path: PathBuf,
    csv_path: PathBuf,
}

impl ReportWriter {
    pub fn new(text_path: PathBuf, csv_path: PathBuf) -> Self {
        Self {
            text_path,
            csv_path,
        }
    }

    /// Print the grid preview, then write the text and CSV artifacts.
    pub fn save(&self, report: &Report, generated_on: NaiveDate) -> Result<()> {
        let table = summary_table(&report.summaries);
        let grid = render_grid(&table);
        println!("\n{grid}");

        write_file(&self.text_path, &text_report(report, &grid, generated_on))?;
        write_file(&self.csv_path, &format!("{UTF8_BOM}{}", render_csv(&table)))?;

        println!("Report saved to: {}", self.text_path.display());
        println!("Data saved to:   {}", self.csv_path.display());
        tracing::info!(
            projects = report.summaries.len(),
            text = %self.text_path.display(),
            csv = %self.csv_path.display(),
            "report written"
        );
        Ok(())
    }
}

fn text_report(report: &Report, grid: &str, generated_on: NaiveDate) -> String {
    format!(
        "EXECUTIVE SUMMARY: {}\nGenerated: {}\nPeriod: {} to {}\n\n{grid}",
        report.user_name,
        generated_on.format("%Y-%m-%d"),
        report.window.start.date_naive(),
        report.window.end.date_naive(),
    )
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}
