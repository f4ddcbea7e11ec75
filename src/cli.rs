use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::aggregate::Aggregator;
use crate::config::{self, Settings};
use crate::model::project::{Project, WikiPage};
use crate::plane::PlaneClient;
use crate::render::writer::ReportWriter;
use crate::report;

#[derive(Parser, Debug)]
#[command(name = "plane-report")]
#[command(about = "Per-project work summaries from a Plane workspace")]
#[command(version)]
pub struct Cli {
    /// Path to config file (default: ~/.plane-report/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Build the summary grid and CSV (default)
    Report {
        /// Override the configured text report path
        #[arg(long)]
        text_out: Option<PathBuf>,
        /// Override the configured CSV path
        #[arg(long)]
        csv_out: Option<PathBuf>,
    },
    /// List workspace projects with their identifiers and ids
    Projects,
    /// Print a wiki page's title, author and content
    Page {
        page_id: String,
    },
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(config::default_config_path)
    }

    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let path = cli.config_path();
    let file = config::load_config(&path)?;
    let settings = Settings::resolve(file, chrono::Utc::now())
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    tracing::debug!(base_url = %settings.base_url, workspace = %settings.workspace, "configuration resolved");

    match cli.command.unwrap_or(Command::Report {
        text_out: None,
        csv_out: None,
    }) {
        Command::Report { text_out, csv_out } => handle_report(settings, text_out, csv_out).await,
        Command::Projects => handle_projects(&settings).await,
        Command::Page { page_id } => handle_page(&settings, &page_id).await,
    }
}

pub async fn handle_report(
    mut settings: Settings,
    text_out: Option<PathBuf>,
    csv_out: Option<PathBuf>,
) -> Result<()> {
    if let Some(path) = text_out {
        settings.text_file = path;
    }
    if let Some(path) = csv_out {
        settings.csv_file = path;
    }

    println!("--- GENERATING CUSTOM GRID REPORT ---");
    let client = PlaneClient::new(&settings);
    let aggregator = Aggregator::new(&settings.allowed_statuses, settings.window);

    match report::build_report(&client, &aggregator).await? {
        Some(report) => {
            let writer = ReportWriter::new(settings.text_file, settings.csv_file);
            writer.save(&report, chrono::Local::now().date_naive())?;
        }
        None => println!("\nNo matching tasks found for this configuration."),
    }
    Ok(())
}

pub async fn handle_projects(settings: &Settings) -> Result<()> {
    let client = PlaneClient::new(settings);
    let projects = client
        .try_project_index()
        .await
        .context("Failed to list workspace projects")?;
    print!("{}", format_project_index(&projects));
    Ok(())
}

pub async fn handle_page(settings: &Settings, page_id: &str) -> Result<()> {
    let client = PlaneClient::new(settings);
    let page = client
        .page(page_id)
        .await
        .with_context(|| format!("Failed to fetch page {page_id}"))?;
    print!("{}", format_page(&page));
    Ok(())
}

/// Name / identifier / id table used to look up project ids for the config.
pub fn format_project_index(projects: &[Project]) -> String {
    let mut out = format!(
        "{:<30} | {:<12} | {}\n{}\n",
        "PROJECT NAME",
        "IDENTIFIER",
        "PROJECT ID (UUID)",
        "-".repeat(85)
    );
    for p in projects {
        out.push_str(&format!("{:<30} | {:<12} | {}\n", p.name, p.identifier, p.id));
    }
    out
}

pub fn format_page(page: &WikiPage) -> String {
    format!(
        "--- Page Metadata ---\nTitle: {}\nCreated By: {}\n{}\n--- PAGE CONTENT (HTML/Raw) ---\n{}\n",
        page.title(),
        page.author(),
        "-".repeat(30),
        page.content().unwrap_or_else(|| "(empty)".to_string())
    )
}
