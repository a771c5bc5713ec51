//! Fuzzy-searchable index over catalog charts, keyed by normalized artist.

use rustc_hash::FxHashMap;

use crate::distance::bounded_levenshtein;
use crate::models::Chart;
use crate::normalize::normalize_artist;

/// Immutable artist index, built once per run over a catalog snapshot.
///
/// Approximate lookup only scans the key-length buckets that can possibly be
/// within the requested edit distance, so a query touches a small slice of
/// the key set instead of the whole corpus. The distance semantics are exact
/// regardless of the bucketing.
pub struct ArtistIndex {
    charts: Vec<Chart>,
    by_key: FxHashMap<String, Vec<usize>>,
    keys_by_len: FxHashMap<usize, Vec<String>>,
}

impl ArtistIndex {
    pub fn build(charts: Vec<Chart>) -> Self {
        let mut by_key: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        for (i, chart) in charts.iter().enumerate() {
            by_key
                .entry(normalize_artist(&chart.artist))
                .or_default()
                .push(i);
        }

        let mut keys_by_len: FxHashMap<usize, Vec<String>> = FxHashMap::default();
        for key in by_key.keys() {
            keys_by_len
                .entry(key.chars().count())
                .or_default()
                .push(key.clone());
        }
        // Hash map iteration order is arbitrary; keep bucket scans deterministic.
        for keys in keys_by_len.values_mut() {
            keys.sort();
        }

        Self {
            charts,
            by_key,
            keys_by_len,
        }
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    /// All charts whose normalized artist key is within `max_distance` edits
    /// of the query's key, in catalog insertion order. Distinct spellings
    /// that all match are all returned; disambiguation happens downstream.
    pub fn lookup(&self, query: &str, max_distance: usize) -> Vec<&Chart> {
        let needle = normalize_artist(query);
        let needle_len = needle.chars().count();

        let mut hits: Vec<usize> = Vec::new();
        let lo = needle_len.saturating_sub(max_distance);
        for len in lo..=needle_len + max_distance {
            let Some(keys) = self.keys_by_len.get(&len) else {
                continue;
            };
            for key in keys {
                if bounded_levenshtein(&needle, key, max_distance).is_some() {
                    hits.extend(self.by_key[key].iter().copied());
                }
            }
        }

        hits.sort_unstable();
        hits.dedup();
        hits.into_iter().map(|i| &self.charts[i]).collect()
    }
}
