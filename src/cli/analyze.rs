//! Analyze command - match a SQL query to its source and report on it

use std::io::{IsTerminal, Read};

use anyhow::{bail, Context, Result};

use super::style::{colors, field, panel, symbols, truncate_path};
use crate::analysis::AnalysisResult;
use crate::config::Config;

pub async fn run(config: Config, sql: Option<&str>, file: Option<&str>, json: bool) -> Result<()> {
    let query = read_query(sql, file)?;

    let service = super::build_service(&config)?;
    let result = service
        .analyze_query(&query)
        .await
        .context("Query analysis failed")?;

    if json {
        let out = serde_json::to_string_pretty(&result).context("Failed to serialize analysis")?;
        println!("{}", out);
    } else {
        print_report(&result);
    }

    Ok(())
}

/// Query from the argument, then `--file`, then piped stdin
fn read_query(sql: Option<&str>, file: Option<&str>) -> Result<String> {
    if let Some(sql) = sql {
        return Ok(sql.to_string());
    }
    if let Some(file) = file {
        return std::fs::read_to_string(file).with_context(|| format!("Failed to read query from {}", file));
    }

    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        bail!("No SQL query given. Pass it as an argument, with --file, or on stdin");
    }
    let mut buf = String::new();
    stdin
        .read_to_string(&mut buf)
        .context("Failed to read query from stdin")?;
    Ok(buf)
}

fn print_report(result: &AnalysisResult) {
    let matched = &result.matched;

    println!();
    panel(
        colors::PRIMARY,
        symbols::SEARCH,
        "Closest Match",
        &[
            field("File:", format!("{} {}", symbols::FILE, truncate_path(&matched.line.file_path, 40))),
            field("Line:", matched.line.line_number),
            field("Similarity:", format!("{:.1}%", matched.similarity * 100.0)),
            field("Query Type:", matched.query_type),
            String::new(),
            format!("{}{}{}", colors::FG, matched.line.text, colors::RESET),
        ],
    );

    let (color, status) = if result.validated {
        (colors::SUCCESS, format!("{} Input validation found", symbols::SUCCESS))
    } else {
        (colors::WARNING, format!("{} No input validation near this line", symbols::WARNING))
    };
    let mut rows = vec![format!("{}{}{}", color, status, colors::RESET)];
    rows.extend(
        result
            .validation_methods
            .iter()
            .map(|m| format!("{}{}{}", colors::MUTED, m, colors::RESET)),
    );
    rows.extend(
        result
            .security_issues
            .iter()
            .map(|s| format!("{}{} {}{}", colors::ERROR, symbols::ERROR, s, colors::RESET)),
    );
    println!();
    panel(color, symbols::SHIELD, "Validation", &rows);

    let mut rows = vec![field(
        "Score:",
        format!(
            "{}{}/100{} {} {}",
            colors::AI_ACCENT,
            result.performance_score,
            colors::RESET,
            result.performance_rating.badge(),
            result.performance_rating
        ),
    )];
    if result.issues.is_empty() {
        rows.push(format!("{}No issues detected{}", colors::MUTED, colors::RESET));
    } else {
        rows.extend(result.issues.iter().map(|i| i.to_string()));
    }
    println!();
    panel(colors::PRIMARY, symbols::LOADING, "Performance", &rows);

    println!();
    println!("{}{}Suggestions{}", colors::PRIMARY, colors::BOLD, colors::RESET);
    for (i, suggestion) in result.suggestions.iter().enumerate() {
        println!("  {}{:>2}.{} {}", colors::MUTED, i + 1, colors::RESET, suggestion);
    }
    println!();
}
