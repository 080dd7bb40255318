//! Console, Markdown, and JSON renderings of a report snapshot.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::DateTime;
use hnscout_core::ItemKind;
use hnscout_pipeline::{DiscoverySummary, ReportSnapshot, RunSummary};

use crate::ReportFormat;

const CONSOLE_TOP_N: usize = 10;

/// Where report files land unless `--output-dir` says otherwise.
pub(crate) const DEFAULT_OUTPUT_DIR: &str = "reports";

/// Render `snapshot` in `format`: console output goes to stdout, Markdown
/// and JSON are written to a timestamped file plus a `latest` copy.
///
/// # Errors
///
/// Returns an error if the output directory or files cannot be written.
pub(crate) fn emit(
    snapshot: &ReportSnapshot,
    format: ReportFormat,
    output_dir: &Path,
) -> anyhow::Result<()> {
    match format {
        ReportFormat::Console => {
            print!("{}", render_console(snapshot));
            Ok(())
        }
        ReportFormat::Markdown => {
            let path = write_report(snapshot, output_dir, "md", &render_markdown(snapshot))?;
            println!("markdown report written to {}", path.display());
            Ok(())
        }
        ReportFormat::Json => {
            let path = write_report(snapshot, output_dir, "json", &render_json(snapshot)?)?;
            println!("json report written to {}", path.display());
            Ok(())
        }
    }
}

/// After a run that accepted something, write both the Markdown and JSON
/// reports. Returns the timestamped paths written, empty when nothing was
/// accepted.
///
/// # Errors
///
/// Returns an error if the output directory or files cannot be written.
pub(crate) fn write_run_reports(
    summary: &RunSummary,
    snapshot: &ReportSnapshot,
    output_dir: &Path,
) -> anyhow::Result<Vec<PathBuf>> {
    if summary.accepted == 0 {
        return Ok(Vec::new());
    }
    let markdown = write_report(snapshot, output_dir, "md", &render_markdown(snapshot))?;
    let json = write_report(snapshot, output_dir, "json", &render_json(snapshot)?)?;
    Ok(vec![markdown, json])
}

fn write_report(
    snapshot: &ReportSnapshot,
    output_dir: &Path,
    extension: &str,
    body: &str,
) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let stamp = snapshot.metadata.generated_at.format("%Y%m%d_%H%M%S");
    let path = output_dir.join(format!("startup_report_{stamp}.{extension}"));
    std::fs::write(&path, body)?;
    std::fs::write(output_dir.join(format!("latest.{extension}")), body)?;
    Ok(path)
}

/// Pretty-printed JSON of the full snapshot.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub(crate) fn render_json(snapshot: &ReportSnapshot) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

pub(crate) fn render_markdown(snapshot: &ReportSnapshot) -> String {
    let meta = &snapshot.metadata;
    let mut out = String::new();

    let _ = writeln!(out, "# Hacker News Startup & Innovation Report\n");
    let _ = writeln!(
        out,
        "Generated {} covering the last {} days.\n",
        meta.generated_at.format("%Y-%m-%d %H:%M UTC"),
        meta.since_days
    );

    let _ = writeln!(out, "## Summary\n");
    let _ = writeln!(out, "- Discoveries: {}", meta.total_discoveries);
    let _ = writeln!(out, "- Startups: {}", meta.total_startups);
    let _ = writeln!(out, "- Innovations: {}\n", meta.total_innovations);

    if snapshot.discoveries.is_empty() {
        let _ = writeln!(out, "No discoveries in this window.");
        return out;
    }

    let _ = writeln!(out, "## Categories\n");
    for (category, count) in category_distribution(&snapshot.discoveries) {
        let _ = writeln!(out, "- {category}: {count}");
    }
    out.push('\n');

    let _ = writeln!(out, "## Discoveries\n");
    for (rank, d) in snapshot.discoveries.iter().enumerate() {
        let _ = writeln!(out, "### {}. {}\n", rank + 1, d.display_name());
        let _ = writeln!(
            out,
            "**{}** | score {:.1}/10 | {} | {}",
            kind_label(d.kind),
            d.innovation_score,
            or_dash(&d.category),
            or_dash(&d.stage)
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "- Title: {}", d.title);
        if let Some(url) = &d.url {
            let _ = writeln!(out, "- Link: <{url}>");
        }
        let _ = writeln!(out, "- Discussion: <{}> ({} points, {} comments)", d.hn_url, d.score, d.comments);
        let _ = writeln!(out, "- Posted: {}", posted(d.timestamp));
        if !d.summary.is_empty() {
            let _ = writeln!(out, "\n{}", d.summary);
        }
        if !d.key_features.is_empty() {
            let _ = writeln!(out, "\nKey features:");
            for feature in &d.key_features {
                let _ = writeln!(out, "- {feature}");
            }
        }
        if !d.why_interesting.is_empty() {
            let _ = writeln!(out, "\nWhy it matters: {}", d.why_interesting);
        }
        out.push('\n');
    }

    out
}

/// Fixed-width table of the top discoveries.
pub(crate) fn render_console(snapshot: &ReportSnapshot) -> String {
    let mut out = String::new();
    let meta = &snapshot.metadata;
    let _ = writeln!(
        out,
        "{} discoveries ({} startups, {} innovations) in the last {} days",
        meta.total_discoveries, meta.total_startups, meta.total_innovations, meta.since_days
    );
    if snapshot.discoveries.is_empty() {
        return out;
    }

    let _ = writeln!(out, "{:>3}  {:<10}  {:>5}  {:<32}  {}", "#", "KIND", "SCORE", "NAME", "CATEGORY");
    for (rank, d) in snapshot.discoveries.iter().take(CONSOLE_TOP_N).enumerate() {
        let _ = writeln!(
            out,
            "{:>3}  {:<10}  {:>5.1}  {:<32}  {}",
            rank + 1,
            d.kind.as_str(),
            d.innovation_score,
            truncate(d.display_name(), 32),
            d.category
        );
    }
    out
}

fn category_distribution(discoveries: &[DiscoverySummary]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for d in discoveries {
        let key = if d.category.trim().is_empty() {
            "Uncategorized".to_string()
        } else {
            d.category.clone()
        };
        *counts.entry(key).or_default() += 1;
    }
    let mut sorted: Vec<(String, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}

fn kind_label(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Startup => "Startup",
        ItemKind::Innovation => "Innovation",
        ItemKind::Other => "Other",
    }
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}

fn posted(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map_or_else(|| "unknown".to_string(), |t| t.format("%Y-%m-%d %H:%M UTC").to_string())
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let mut cut: String = value.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
