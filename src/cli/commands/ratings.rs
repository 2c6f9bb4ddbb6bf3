//! Ratings merge command handler

use crate::constants::limits::MATCH_DETAILS_SHOWN;
use crate::services::catalog::{Catalog, write_json_atomic};
use crate::services::ratings::{MergeReport, merge_ratings, read_ratings};
use anyhow::Context;
use std::path::{Path, PathBuf};

pub fn cmd_ratings(csv_path: &Path, catalog_path: &Path, dry_run: bool) -> anyhow::Result<()> {
    let mut catalog = Catalog::load(catalog_path)?
        .with_context(|| format!("Catalog not found: {}", catalog_path.display()))?;
    println!(
        "Loaded {} movies from {}",
        catalog.movies.len(),
        catalog_path.display()
    );

    let rows = read_ratings(csv_path)?;
    println!("Loaded {} ratings from {}", rows.len(), csv_path.display());

    let report = merge_ratings(&mut catalog.movies, &rows);
    print_report(&report);

    if dry_run {
        println!("DRY RUN - no files were modified");
        return Ok(());
    }

    let backup = backup_path(catalog_path);
    std::fs::copy(catalog_path, &backup)
        .with_context(|| format!("Failed to back up catalog to {}", backup.display()))?;
    println!("Backup created: {}", backup.display());

    write_json_atomic(catalog_path, &catalog)?;
    println!("Saved {}", catalog_path.display());
    println!("  Matched: {}/{}", report.matched(), report.total_ratings);

    Ok(())
}

/// `movies.json` -> `movies.backup_<timestamp>.json` next to it.
fn backup_path(catalog_path: &Path) -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let stem = catalog_path
        .file_stem()
        .map_or_else(|| "movies".into(), |s| s.to_string_lossy());
    catalog_path.with_file_name(format!("{stem}.backup_{timestamp}.json"))
}

fn format_confidence(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}

fn print_report(report: &MergeReport) {
    println!();
    println!("{:=<60}", "");
    println!("MERGE REPORT");
    println!("{:=<60}", "");
    println!("Total movies in catalog: {}", report.total_movies);
    println!("Total ratings in CSV:    {}", report.total_ratings);
    #[allow(clippy::cast_precision_loss)]
    let rate = if report.total_ratings == 0 {
        0.0
    } else {
        report.matched() as f64 / report.total_ratings as f64
    };
    println!(
        "Matched:                 {} ({})",
        report.matched(),
        format_confidence(rate)
    );
    println!("Unmatched:               {}", report.unmatched.len());

    if !report.matches.is_empty() {
        println!();
        println!("{:-<60}", "");
        println!("MATCHED MOVIES:");
        println!("{:-<60}", "");
        for detail in report.matches.iter().take(MATCH_DETAILS_SHOWN) {
            let year = detail
                .matched_year
                .map_or_else(|| "?".to_string(), |y| y.to_string());
            println!("  {} ({})", detail.csv_title, detail.csv_year);
            println!(
                "    -> {} ({year}) - {}",
                detail.matched_title,
                format_confidence(detail.confidence)
            );
        }
        if report.matches.len() > MATCH_DETAILS_SHOWN {
            println!(
                "  ... and {} more",
                report.matches.len() - MATCH_DETAILS_SHOWN
            );
        }
    }

    if !report.unmatched.is_empty() {
        println!();
        println!("{:-<60}", "");
        println!("UNMATCHED RATINGS:");
        println!("{:-<60}", "");
        for item in &report.unmatched {
            let best = item
                .best_confidence
                .map_or_else(|| "No match".to_string(), format_confidence);
            println!("  {} ({}) - {best}", item.title, item.year);
        }
    }

    println!("{:=<60}", "");
    println!();
}
