use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use chorus_sync::driver::{
    CatalogSource, LibraryScanner, ReconcileConfig, Reconciler,
};
use chorus_sync::error::SyncError;
use chorus_sync::listens::{aggregate_plays, HistoryRecord, TrackPlays};
use chorus_sync::models::{Chart, EncoreChart, InstalledChart, Recommendation};
use chorus_sync::progress::{phase_bar, phase_spinner, set_quiet};

#[derive(Parser)]
#[command(name = "chorus-sync")]
#[command(about = "Recommend charts to install from listening history")]
struct Args {
    /// Spotify extended streaming history JSON files
    #[arg(required = true)]
    history: Vec<PathBuf>,

    /// Catalog snapshot (JSON array of Encore chart records)
    #[arg(long)]
    catalog: PathBuf,

    /// Installed library listing (JSON array of scanned charts)
    #[arg(long)]
    library: PathBuf,

    #[arg(long, default_value = "0")]
    workers: usize,

    /// Max artist edit distance for catalog lookup
    #[arg(long)]
    artist_distance: Option<usize>,

    /// Max title edit distance after normalization
    #[arg(long)]
    title_distance: Option<usize>,

    /// Only consider the N most-played tracks
    #[arg(long)]
    limit: Option<usize>,

    /// Emit the report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Suppress progress bars (for piped or background runs)
    #[arg(long)]
    log_only: bool,
}

struct JsonCatalog {
    path: PathBuf,
}

impl CatalogSource for JsonCatalog {
    fn fetch(&self) -> Result<Vec<Chart>, SyncError> {
        let raw = fs::read_to_string(&self.path)?;
        let records: Vec<EncoreChart> =
            serde_json::from_str(&raw).map_err(|e| SyncError::CatalogFetch(Box::new(e)))?;
        Ok(records.into_iter().map(Chart::from).collect())
    }
}

struct JsonLibrary {
    path: PathBuf,
}

impl LibraryScanner for JsonLibrary {
    fn scan(
        &self,
        progress: &mut dyn FnMut(&InstalledChart),
    ) -> Result<Vec<InstalledChart>, SyncError> {
        let raw = fs::read_to_string(&self.path)?;
        let installed: Vec<InstalledChart> =
            serde_json::from_str(&raw).map_err(|e| SyncError::LibraryScan(Box::new(e)))?;
        for entry in &installed {
            progress(entry);
        }
        Ok(installed)
    }
}

fn read_history(paths: &[PathBuf]) -> Result<Vec<HistoryRecord>> {
    let pb = phase_bar("Phase 1: Reading history", paths.len() as u64);
    let mut records = Vec::new();
    for path in paths {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read history file {:?}", path))?;
        let mut chunk: Vec<HistoryRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse history file {:?}", path))?;
        records.append(&mut chunk);
        pb.inc(1);
    }
    pb.finish_with_message(format!("Phase 1: Read {} plays", records.len()));
    Ok(records)
}

#[derive(Serialize)]
struct ReportEntry<'a> {
    play_count: u32,
    #[serde(flatten)]
    recommendation: &'a Recommendation,
    download_url: String,
}

fn print_text_report(entries: &[ReportEntry]) {
    for entry in entries {
        let rec = entry.recommendation;
        println!(
            "[{} plays] {} - {} (charter: {})",
            entry.play_count, rec.track.artist, rec.track.title, rec.chart.charter
        );
        for reason in &rec.reasons {
            println!("    {}", reason);
        }
        println!("    {}", entry.download_url);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    set_quiet(args.log_only || args.json);

    let start = Instant::now();

    let records = read_history(&args.history)?;
    let mut plays = aggregate_plays(&records);
    if let Some(limit) = args.limit {
        plays.truncate(limit);
    }
    if !args.json {
        println!("Found {} distinct completed tracks", plays.len());
    }

    let mut config = ReconcileConfig::default();
    if args.workers > 0 {
        config.workers = args.workers;
    }
    if let Some(d) = args.artist_distance {
        config.match_config.artist_distance = d;
    }
    if let Some(d) = args.title_distance {
        config.match_config.title_distance = d;
    }

    let reconciler = Reconciler::new(
        JsonLibrary {
            path: args.library.clone(),
        },
        JsonCatalog {
            path: args.catalog.clone(),
        },
        config,
    );

    let tracks: Vec<_> = plays.iter().map(|p| p.track.clone()).collect();
    let spinner = phase_spinner("Phase 2: Scanning library");
    let report = {
        let mut seen = 0u64;
        let result = reconciler.run(&tracks, &mut |_| {
            seen += 1;
            spinner.set_position(seen);
        });
        spinner.finish_with_message(format!("Phase 2: Scanned {} installed charts", seen));
        result.context("Reconciliation failed")?
    };

    if report.canceled {
        println!("Run canceled; no recommendations produced.");
        return Ok(());
    }

    let play_count = |rec: &Recommendation| {
        plays
            .iter()
            .find(|p: &&TrackPlays| p.track == rec.track)
            .map_or(0, |p| p.play_count)
    };
    let entries: Vec<ReportEntry> = report
        .recommendations
        .iter()
        .map(|rec| ReportEntry {
            play_count: play_count(rec),
            recommendation: rec,
            download_url: rec.chart.download_url(),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    print_text_report(&entries);

    let elapsed = start.elapsed();
    println!("\n{:=<60}", "");
    println!("Reconciliation complete!");
    println!("  Recommendations: {}", entries.len());
    println!("  Already installed: {}", report.skipped_installed);
    println!("  No matching chart: {}", report.skipped_no_match);
    println!("  Skipped (bad metadata): {}", report.skipped_invalid);
    println!("  Elapsed: {:.2}s", elapsed.as_secs_f64());
    println!("{:=<60}", "");

    Ok(())
}
