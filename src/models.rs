//! Core data models for chart reconciliation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A listened track: the external identity we try to find a chart for.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Track {
    pub artist: String,
    pub title: String,
}

/// One chart from the remote catalog snapshot.
///
/// Difficulty values are per-part: `-1` or absent means the part is not
/// charted, `>= 0` means charted (higher is harder). The map is ordered so
/// anything iterating difficulties is deterministic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub artist: String,
    pub title: String,
    pub charter: String,
    pub difficulties: BTreeMap<String, i32>,
    pub uploaded_at: DateTime<Utc>,
    pub md5: String,
}

impl Chart {
    /// Difficulty rating for one part, if the catalog record carried it.
    pub fn difficulty(&self, part: &str) -> Option<i32> {
        self.difficulties.get(part).copied()
    }

    /// Whether the part is charted at all.
    pub fn has_part(&self, part: &str) -> bool {
        self.difficulty(part).is_some_and(|d| d >= 0)
    }

    /// Sum of all non-negative difficulty values across parts.
    pub fn difficulty_sum(&self) -> i32 {
        self.difficulties.values().filter(|&&d| d >= 0).sum()
    }

    /// Download reference for the chart's content archive.
    pub fn download_url(&self) -> String {
        format!("https://files.enchor.us/{}.sng", self.md5)
    }
}

/// Wire form of an Encore catalog record. Difficulty ratings arrive as
/// dynamic `diff_*` keys next to the fixed fields, so they land in `extra`
/// and get sifted out during conversion.
#[derive(Debug, Deserialize)]
pub struct EncoreChart {
    pub name: String,
    pub artist: String,
    pub charter: String,
    #[serde(rename = "modifiedTime")]
    pub modified_time: DateTime<Utc>,
    pub md5: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl From<EncoreChart> for Chart {
    fn from(raw: EncoreChart) -> Self {
        let difficulties = raw
            .extra
            .iter()
            .filter_map(|(key, value)| {
                let part = key.strip_prefix("diff_")?;
                let rating = value.as_i64()?;
                Some((part.to_string(), rating as i32))
            })
            .collect();

        Chart {
            artist: raw.artist,
            title: raw.name,
            charter: raw.charter,
            difficulties,
            uploaded_at: raw.modified_time,
            md5: raw.md5,
        }
    }
}

/// A chart already present in the local library, from the scan collaborator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InstalledChart {
    pub artist: String,
    pub title: String,
    pub charter: Option<String>,
    pub modified_time: Option<DateTime<Utc>>,
}

/// Outcome of one selection round. `reasons` is non-empty only when `chart`
/// differs from the incumbent (the first candidate).
#[derive(Clone, Debug, Serialize)]
pub struct SelectionResult {
    pub chart: Chart,
    pub reasons: Vec<String>,
}

/// One entry in the final recommendation list.
#[derive(Clone, Debug, Serialize)]
pub struct Recommendation {
    pub track: Track,
    pub chart: Chart,
    pub reasons: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encore_record_decodes_dynamic_difficulties() {
        let json = r#"{
            "name": "Everlong",
            "artist": "Foo Fighters",
            "charter": "Neversoft",
            "modifiedTime": "2021-03-04T12:00:00Z",
            "md5": "d41d8cd98f00b204e9800998ecf8427e",
            "diff_drums": 7,
            "diff_guitar": -1,
            "diff_drums_real": 8,
            "song_length": 250000
        }"#;
        let raw: EncoreChart = serde_json::from_str(json).unwrap();
        let chart = Chart::from(raw);

        assert_eq!(chart.title, "Everlong");
        assert_eq!(chart.difficulty("drums"), Some(7));
        assert_eq!(chart.difficulty("guitar"), Some(-1));
        assert_eq!(chart.difficulty("drums_real"), Some(8));
        // Non-diff numeric fields must not leak into the map.
        assert_eq!(chart.difficulty("song_length"), None);
    }

    #[test]
    fn part_presence_and_sum() {
        let json = r#"{
            "name": "t", "artist": "a", "charter": "c",
            "modifiedTime": "2020-01-01T00:00:00Z", "md5": "00",
            "diff_drums": -1, "diff_guitar": 5, "diff_bass": 0
        }"#;
        let chart = Chart::from(serde_json::from_str::<EncoreChart>(json).unwrap());

        assert!(!chart.has_part("drums"));
        assert!(chart.has_part("guitar"));
        assert!(chart.has_part("bass"));
        assert!(!chart.has_part("keys"));
        assert_eq!(chart.difficulty_sum(), 5);
    }

    #[test]
    fn download_url_uses_content_digest() {
        let json = r#"{
            "name": "t", "artist": "a", "charter": "c",
            "modifiedTime": "2020-01-01T00:00:00Z",
            "md5": "0cc175b9c0f1b6a831c399e269772661"
        }"#;
        let chart = Chart::from(serde_json::from_str::<EncoreChart>(json).unwrap());
        assert_eq!(
            chart.download_url(),
            "https://files.enchor.us/0cc175b9c0f1b6a831c399e269772661.sng"
        );
    }
}
