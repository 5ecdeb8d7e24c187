//! Index command - embed the SQL-related lines of a project

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use super::style::{colors, field, panel, symbols, truncate_path};
use crate::config::Config;
use crate::index::SnapshotStore;
use crate::service::BuildReport;

pub async fn run(config: Config, path: Option<&str>) -> Result<()> {
    let path = path
        .map(str::to_string)
        .or_else(|| config.general.project_path.clone())
        .unwrap_or_else(|| ".".to_string());
    let root = Path::new(&path)
        .canonicalize()
        .with_context(|| format!("Invalid path: {}", path))?;

    let service = super::build_service(&config)?;
    print_header(&root, &service.embedder().describe());

    // no progress bar when piped or scripted
    let result = if console::user_attended() {
        let pb = create_progress_bar()?;
        let result = service
            .build_index_with_progress(&root, |done, total| {
                pb.set_length(total as u64);
                pb.set_position(done as u64);
                pb.set_message(format!("batch {}/{}", done, total));
            })
            .await;
        pb.finish_and_clear();
        result
    } else {
        service.build_index(&root).await
    };

    let report = result.with_context(|| format!("Failed to index {}", root.display()))?;
    print_summary(&report, &service.store().location());
    Ok(())
}

/// Create a styled progress bar
fn create_progress_bar() -> Result<ProgressBar> {
    let pb = ProgressBar::new(0);

    let style = ProgressStyle::with_template(
        "{spinner:.cyan} {prefix:.bold} [{bar:40.cyan/dim}] {pos}/{len} {msg:.dim}",
    )
    .context("Invalid progress bar template")?
    .progress_chars("█▓░")
    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    pb.set_style(style);

    pb.set_prefix("Embedding");
    pb.set_message("scanning files");
    pb.enable_steady_tick(Duration::from_millis(80));

    Ok(pb)
}

fn print_header(root: &Path, backend: &str) {
    println!();
    panel(
        colors::PRIMARY,
        symbols::LOADING,
        "NEXUS SQL Forge",
        &[
            field("Target:", truncate_path(&root.display().to_string(), 42)),
            field("Embeddings:", backend),
        ],
    );
    println!();
}

fn print_summary(report: &BuildReport, snapshot: &str) {
    let (icon, color, title) = if report.files_failed > 0 || !report.snapshot_saved {
        (symbols::WARNING, colors::WARNING, "Indexing Completed with Warnings")
    } else {
        (symbols::SUCCESS, colors::SUCCESS, "Indexing Successful")
    };

    let mut rows = vec![
        field("Scanned:", truncate_path(&report.scan_root.display().to_string(), 42)),
        field("Files Read:", report.files_scanned),
        field("SQL Lines:", format!("{}{}", colors::AI_ACCENT, report.indexed)),
        field("Batches:", report.batches),
        field("Time Elapsed:", format!("{:.2}s", report.elapsed_ms as f64 / 1000.0)),
    ];

    if report.cap_reached {
        rows.push(format!(
            "{}File limit reached; raise index.max_files to scan more{}",
            colors::MUTED, colors::RESET
        ));
    }
    if report.files_failed > 0 {
        rows.push(format!(
            "{}Unreadable Files: {}{}",
            colors::ERROR, report.files_failed, colors::RESET
        ));
    }
    if report.snapshot_saved {
        rows.push(field("Snapshot:", truncate_path(snapshot, 42)));
    } else {
        rows.push(format!(
            "{}Snapshot not saved; the index lasts for this process only{}",
            colors::ERROR, colors::RESET
        ));
    }
    rows.push(String::new());
    rows.push(format!(
        "{}Ready for queries. Try: `nexus-sql analyze \"SELECT ...\"`{}",
        colors::MUTED, colors::RESET
    ));

    println!();
    panel(color, icon, title, &rows);
    println!();
}
