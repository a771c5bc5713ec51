//! Streaming-history ingestion: turn raw play records into a ranked track
//! list.

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::models::Track;

/// One record from a Spotify extended streaming history dump. Only the
/// fields reconciliation cares about are decoded; the rest is ignored.
#[derive(Clone, Debug, Deserialize)]
pub struct HistoryRecord {
    pub reason_end: Option<String>,
    pub master_metadata_album_artist_name: Option<String>,
    pub master_metadata_track_name: Option<String>,
}

/// A track with its aggregated completed-play count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackPlays {
    pub track: Track,
    pub play_count: u32,
}

/// Aggregate play counts from raw history records.
///
/// Only completed plays (`reason_end == "trackdone"`) count. Records with no
/// artist metadata carry no information about what played and are dropped.
/// Output is ordered by play count descending, ties broken by artist then
/// title so the ranking is stable across runs.
pub fn aggregate_plays(records: &[HistoryRecord]) -> Vec<TrackPlays> {
    let mut counts: FxHashMap<(String, String), u32> = FxHashMap::default();

    for record in records {
        if record.reason_end.as_deref() != Some("trackdone") {
            continue;
        }
        let Some(artist) = record.master_metadata_album_artist_name.clone() else {
            continue;
        };
        let Some(title) = record.master_metadata_track_name.clone() else {
            continue;
        };
        *counts.entry((artist, title)).or_insert(0) += 1;
    }

    let mut plays: Vec<TrackPlays> = counts
        .into_iter()
        .map(|((artist, title), play_count)| TrackPlays {
            track: Track { artist, title },
            play_count,
        })
        .collect();

    plays.sort_by(|a, b| {
        b.play_count
            .cmp(&a.play_count)
            .then_with(|| a.track.artist.cmp(&b.track.artist))
            .then_with(|| a.track.title.cmp(&b.track.title))
    });
    plays
}
