//! End-to-end reconciliation: scan the library, fetch the catalog, match and
//! select per track, aggregate recommendations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel as channel;

use crate::error::SyncError;
use crate::index::ArtistIndex;
use crate::matcher::{find_matching_charts, InstalledFilter, MatchConfig};
use crate::models::{Chart, InstalledChart, Recommendation, Track};
use crate::select::select_chart;

/// Supplies the installed library. `progress` is invoked once per discovered
/// chart. A user abort must surface as [`SyncError::Canceled`].
pub trait LibraryScanner {
    fn scan(
        &self,
        progress: &mut dyn FnMut(&InstalledChart),
    ) -> Result<Vec<InstalledChart>, SyncError>;
}

/// Supplies one atomic snapshot of the remote catalog.
pub trait CatalogSource {
    fn fetch(&self) -> Result<Vec<Chart>, SyncError>;
}

/// Cooperative cancellation flag shared with the caller. Workers stop
/// picking up new tracks as soon as it is set.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ReconcileConfig {
    pub match_config: MatchConfig,
    /// Worker pool width for per-track matching.
    pub workers: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            match_config: MatchConfig::default(),
            workers: 8,
        }
    }
}

/// Outcome of one reconciliation run.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub recommendations: Vec<Recommendation>,
    /// True when the run was aborted by the user. No partial output is kept.
    pub canceled: bool,
    pub skipped_installed: usize,
    pub skipped_no_match: usize,
    pub skipped_invalid: usize,
}

impl ReconcileReport {
    fn canceled() -> Self {
        Self {
            canceled: true,
            ..Self::default()
        }
    }
}

enum TrackOutcome {
    Recommend(Box<Recommendation>),
    Installed,
    NoMatch,
    Invalid,
}

pub struct Reconciler<S, C> {
    scanner: S,
    catalog: C,
    config: ReconcileConfig,
    cancel: CancelToken,
}

impl<S: LibraryScanner, C: CatalogSource> Reconciler<S, C> {
    pub fn new(scanner: S, catalog: C, config: ReconcileConfig) -> Self {
        Self {
            scanner,
            catalog,
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Handle for aborting the run from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run the full pipeline for the given listened tracks.
    ///
    /// A user cancel (from the scan collaborator or via the token) yields an
    /// empty report with `canceled` set, not an error. Collaborator failures
    /// are fatal for the run and surface as one typed error with no partial
    /// output. Per-track failures only skip that track.
    pub fn run(
        &self,
        tracks: &[Track],
        progress: &mut dyn FnMut(&InstalledChart),
    ) -> Result<ReconcileReport, SyncError> {
        let installed = match self.scanner.scan(progress) {
            Ok(installed) => installed,
            Err(SyncError::Canceled) => return Ok(ReconcileReport::canceled()),
            Err(err @ SyncError::LibraryScan(_)) => return Err(err),
            Err(other) => return Err(SyncError::LibraryScan(Box::new(other))),
        };

        let catalog = match self.catalog.fetch() {
            Ok(catalog) => catalog,
            Err(err @ SyncError::CatalogFetch(_)) => return Err(err),
            Err(other) => return Err(SyncError::CatalogFetch(Box::new(other))),
        };

        let index = ArtistIndex::build(catalog);
        let filter = InstalledFilter::build(&installed, self.config.match_config);

        let outcomes = self.match_tracks(tracks, &index, &filter);
        if self.cancel.is_canceled() {
            return Ok(ReconcileReport::canceled());
        }

        let mut report = ReconcileReport::default();
        for (_, outcome) in outcomes {
            match outcome {
                TrackOutcome::Recommend(rec) => report.recommendations.push(*rec),
                TrackOutcome::Installed => report.skipped_installed += 1,
                TrackOutcome::NoMatch => report.skipped_no_match += 1,
                TrackOutcome::Invalid => report.skipped_invalid += 1,
            }
        }
        Ok(report)
    }

    /// Fan tracks out over a bounded worker pool.
    ///
    /// Matching is embarrassingly parallel: the index and installed filter
    /// are read-only and shared by reference, each job owns nothing else.
    /// Results come back unordered and are re-sorted by track index.
    fn match_tracks(
        &self,
        tracks: &[Track],
        index: &ArtistIndex,
        filter: &InstalledFilter,
    ) -> Vec<(usize, TrackOutcome)> {
        let workers = self.config.workers.clamp(1, tracks.len().max(1));
        let (job_tx, job_rx) = channel::bounded::<(usize, &Track)>(workers * 2);
        let (out_tx, out_rx) = channel::unbounded();

        let mut outcomes: Vec<(usize, TrackOutcome)> = Vec::with_capacity(tracks.len());
        std::thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let out_tx = out_tx.clone();
                let cancel = self.cancel.clone();
                let config = self.config.match_config;
                scope.spawn(move || {
                    for (i, track) in job_rx {
                        if cancel.is_canceled() {
                            break;
                        }
                        let outcome = match_one(track, index, filter, &config);
                        if out_tx.send((i, outcome)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(job_rx);
            drop(out_tx);

            for job in tracks.iter().enumerate() {
                if self.cancel.is_canceled() {
                    break;
                }
                if job_tx.send(job).is_err() {
                    break;
                }
            }
            drop(job_tx);

            for result in out_rx {
                outcomes.push(result);
            }
        });

        outcomes.sort_by_key(|&(i, _)| i);
        outcomes
    }
}

/// Match and select for one track. Malformed tracks are skipped, never
/// fatal.
fn match_one(
    track: &Track,
    index: &ArtistIndex,
    filter: &InstalledFilter,
    config: &MatchConfig,
) -> TrackOutcome {
    if filter.is_installed(&track.artist, &track.title, None) {
        return TrackOutcome::Installed;
    }

    let candidates = match find_matching_charts(track, index, config) {
        Ok(candidates) => candidates,
        Err(_) => return TrackOutcome::Invalid,
    };

    let owned: Vec<Chart> = candidates.into_iter().cloned().collect();
    match select_chart(&owned) {
        Some(result) => TrackOutcome::Recommend(Box::new(Recommendation {
            track: track.clone(),
            chart: result.chart,
            reasons: result.reasons,
        })),
        None => TrackOutcome::NoMatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    struct StubScanner {
        result: fn() -> Result<Vec<InstalledChart>, SyncError>,
    }

    impl LibraryScanner for StubScanner {
        fn scan(
            &self,
            progress: &mut dyn FnMut(&InstalledChart),
        ) -> Result<Vec<InstalledChart>, SyncError> {
            let installed = (self.result)()?;
            for entry in &installed {
                progress(entry);
            }
            Ok(installed)
        }
    }

    struct StubCatalog {
        result: fn() -> Result<Vec<Chart>, SyncError>,
    }

    impl CatalogSource for StubCatalog {
        fn fetch(&self) -> Result<Vec<Chart>, SyncError> {
            (self.result)()
        }
    }

    fn chart(artist: &str, title: &str, charter: &str, drums: i32) -> Chart {
        let mut difficulties = BTreeMap::new();
        difficulties.insert("drums".to_string(), drums);
        Chart {
            artist: artist.to_string(),
            title: title.to_string(),
            charter: charter.to_string(),
            difficulties,
            uploaded_at: Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
            md5: "00".to_string(),
        }
    }

    fn track(artist: &str, title: &str) -> Track {
        Track {
            artist: artist.to_string(),
            title: title.to_string(),
        }
    }

    fn small_catalog() -> Result<Vec<Chart>, SyncError> {
        Ok(vec![
            chart("Metallica", "One", "UserA", -1),
            chart("Metallica", "One", "Harmonix", 7),
            chart("Queen", "39", "UserB", 3),
        ])
    }

    fn empty_library() -> Result<Vec<InstalledChart>, SyncError> {
        Ok(Vec::new())
    }

    fn reconciler(
        scan: fn() -> Result<Vec<InstalledChart>, SyncError>,
        fetch: fn() -> Result<Vec<Chart>, SyncError>,
    ) -> Reconciler<StubScanner, StubCatalog> {
        Reconciler::new(
            StubScanner { result: scan },
            StubCatalog { result: fetch },
            ReconcileConfig {
                workers: 2,
                ..ReconcileConfig::default()
            },
        )
    }

    #[test]
    fn recommends_and_keeps_input_order() {
        let driver = reconciler(empty_library, small_catalog);
        let tracks = vec![
            track("Queen", "39"),
            track("Metallica", "One"),
            track("Nobody", "Nothing"),
        ];

        let report = driver.run(&tracks, &mut |_| {}).unwrap();
        assert!(!report.canceled);
        assert_eq!(report.recommendations.len(), 2);
        assert_eq!(report.recommendations[0].track.artist, "Queen");
        assert_eq!(report.recommendations[1].track.artist, "Metallica");
        // The Harmonix chart overturns the incumbent for "One".
        assert_eq!(report.recommendations[1].chart.charter, "Harmonix");
        assert!(!report.recommendations[1].reasons.is_empty());
        assert_eq!(report.skipped_no_match, 1);
    }

    #[test]
    fn no_candidate_track_produces_no_entry() {
        let driver = reconciler(empty_library, small_catalog);
        let report = driver
            .run(&[track("Unknown Artist", "Unknown Song")], &mut |_| {})
            .unwrap();

        assert!(report.recommendations.is_empty());
        assert_eq!(report.skipped_no_match, 1);
    }

    #[test]
    fn installed_tracks_are_skipped() {
        fn library() -> Result<Vec<InstalledChart>, SyncError> {
            Ok(vec![InstalledChart {
                artist: "Metallica".to_string(),
                title: "One".to_string(),
                charter: None,
                modified_time: None,
            }])
        }

        let driver = reconciler(library, small_catalog);
        let report = driver.run(&[track("Metallica", "One")], &mut |_| {}).unwrap();

        assert!(report.recommendations.is_empty());
        assert_eq!(report.skipped_installed, 1);
    }

    #[test]
    fn invalid_tracks_are_skipped_not_fatal() {
        let driver = reconciler(empty_library, small_catalog);
        let tracks = vec![track("", ""), track("Queen", "39")];

        let report = driver.run(&tracks, &mut |_| {}).unwrap();
        assert_eq!(report.skipped_invalid, 1);
        assert_eq!(report.recommendations.len(), 1);
    }

    #[test]
    fn scan_cancel_returns_empty_non_error_report() {
        fn canceled_scan() -> Result<Vec<InstalledChart>, SyncError> {
            Err(SyncError::Canceled)
        }

        let driver = reconciler(canceled_scan, small_catalog);
        let report = driver.run(&[track("Queen", "39")], &mut |_| {}).unwrap();

        assert!(report.canceled);
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn catalog_failure_is_a_typed_fatal_error() {
        fn failing_fetch() -> Result<Vec<Chart>, SyncError> {
            Err(SyncError::CatalogFetch("503 from snapshot host".into()))
        }

        let driver = reconciler(empty_library, failing_fetch);
        let err = driver.run(&[track("Queen", "39")], &mut |_| {}).unwrap_err();
        assert!(matches!(err, SyncError::CatalogFetch(_)));
    }

    #[test]
    fn progress_callback_fires_once_per_installed_chart() {
        fn library() -> Result<Vec<InstalledChart>, SyncError> {
            Ok(vec![
                InstalledChart {
                    artist: "A".to_string(),
                    title: "x".to_string(),
                    charter: None,
                    modified_time: None,
                },
                InstalledChart {
                    artist: "B".to_string(),
                    title: "y".to_string(),
                    charter: None,
                    modified_time: None,
                },
            ])
        }

        let driver = reconciler(library, small_catalog);
        let mut seen = 0usize;
        driver.run(&[], &mut |_| seen += 1).unwrap();
        assert_eq!(seen, 2);
    }

    #[test]
    fn preset_cancel_token_short_circuits_matching() {
        let driver = reconciler(empty_library, small_catalog);
        driver.cancel_token().cancel();

        let report = driver.run(&[track("Queen", "39")], &mut |_| {}).unwrap();
        assert!(report.canceled);
        assert!(report.recommendations.is_empty());
    }
}
