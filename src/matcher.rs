//! Candidate matching: artist-level fuzzy lookup, then title verification.

use rustc_hash::FxHashMap;

use crate::distance::within_distance;
use crate::error::SyncError;
use crate::index::ArtistIndex;
use crate::models::{Chart, InstalledChart, Track};
use crate::normalize::{normalize_artist, normalize_title};

/// Edit-distance thresholds for matching. The defaults mirror the original
/// tuning; neither constant has a recorded derivation, so both stay
/// configurable rather than baked into the matching logic.
#[derive(Clone, Copy, Debug)]
pub struct MatchConfig {
    /// Max artist-key edit distance for catalog lookup.
    pub artist_distance: usize,
    /// Max artist-key edit distance when checking the installed library.
    pub installed_artist_distance: usize,
    /// Max title edit distance after normalization.
    pub title_distance: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            artist_distance: 1,
            installed_artist_distance: 2,
            title_distance: 4,
        }
    }
}

/// Whether two normalized titles identify the same song.
///
/// Containment in either direction tolerates suffix annotations present on
/// one side only, e.g. "(2x double bass)" on an installed folder name.
pub fn titles_match(a: &str, b: &str, max_distance: usize) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    within_distance(a, b, max_distance) || a.contains(b) || b.contains(a)
}

/// All catalog charts matching the track, in catalog insertion order.
/// Ranking happens later; this only filters.
pub fn find_matching_charts<'a>(
    track: &Track,
    index: &'a ArtistIndex,
    config: &MatchConfig,
) -> Result<Vec<&'a Chart>, SyncError> {
    if track.artist.trim().is_empty() {
        return Err(SyncError::InvalidTrack { field: "artist" });
    }
    if track.title.trim().is_empty() {
        return Err(SyncError::InvalidTrack { field: "title" });
    }

    let title_norm = normalize_title(&track.title);
    let candidates = index
        .lookup(&track.artist, config.artist_distance)
        .into_iter()
        .filter(|chart| {
            titles_match(
                &normalize_title(&chart.title),
                &title_norm,
                config.title_distance,
            )
        })
        .collect();
    Ok(candidates)
}

/// Predicate over the installed library: is an (artist, title) pair already
/// satisfied by a local chart? Uses the same bounded-distance technique as
/// catalog matching, with a wider artist threshold.
pub struct InstalledFilter {
    titles_by_artist: FxHashMap<String, Vec<String>>,
    artists: Vec<String>,
    config: MatchConfig,
}

impl InstalledFilter {
    pub fn build(installed: &[InstalledChart], config: MatchConfig) -> Self {
        let mut titles_by_artist: FxHashMap<String, Vec<String>> = FxHashMap::default();
        for entry in installed {
            titles_by_artist
                .entry(normalize_artist(&entry.artist))
                .or_default()
                .push(normalize_title(&entry.title));
        }
        let mut artists: Vec<String> = titles_by_artist.keys().cloned().collect();
        artists.sort();

        Self {
            titles_by_artist,
            artists,
            config,
        }
    }

    /// Consulted once per track. The charter is accepted for future
    /// narrowing; today any charter satisfies the match.
    pub fn is_installed(&self, artist: &str, title: &str, _charter: Option<&str>) -> bool {
        let artist_norm = normalize_artist(artist);
        let title_norm = normalize_title(title);

        self.artists
            .iter()
            .filter(|key| {
                within_distance(key, &artist_norm, self.config.installed_artist_distance)
            })
            .flat_map(|key| self.titles_by_artist[key].iter())
            .any(|installed| titles_match(installed, &title_norm, self.config.title_distance))
    }
}
