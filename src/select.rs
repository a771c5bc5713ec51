//! Chart selection: a multi-stage ranking protocol over near-duplicate
//! candidates.
//!
//! The first candidate is the incumbent; every rule judges one challenger
//! against it and, when the challenger is preferable, says why in a sentence.
//! Groups run in order and the first group that singles out one challenger
//! decides the whole selection.

use crate::models::{Chart, SelectionResult};

/// A pure ranking rule. Returns a human-readable reason when the challenger
/// is preferable to the incumbent, `None` otherwise.
pub type Rule = fn(incumbent: &Chart, challenger: &Chart) -> Option<String>;

/// Charters whose charts came from official rhythm games.
const OFFICIAL_CHARTERS: [&str; 2] = ["Harmonix", "Neversoft"];

fn same_charter_newer(incumbent: &Chart, challenger: &Chart) -> Option<String> {
    (challenger.charter == incumbent.charter && challenger.uploaded_at > incumbent.uploaded_at)
        .then(|| "Chart from same charter is newer".to_string())
}

fn prefer_harmonix(incumbent: &Chart, challenger: &Chart) -> Option<String> {
    (incumbent.charter != "Harmonix" && challenger.charter == "Harmonix")
        .then(|| "Better chart is from Harmonix".to_string())
}

fn prefer_official(incumbent: &Chart, challenger: &Chart) -> Option<String> {
    (!OFFICIAL_CHARTERS.contains(&incumbent.charter.as_str())
        && OFFICIAL_CHARTERS.contains(&challenger.charter.as_str()))
    .then(|| "Better chart is from official game".to_string())
}

fn prefer_drums(incumbent: &Chart, challenger: &Chart) -> Option<String> {
    (!incumbent.has_part("drums") && challenger.has_part("drums"))
        .then(|| "Better chart has drums, current chart doesn't".to_string())
}

fn prefer_guitar(incumbent: &Chart, challenger: &Chart) -> Option<String> {
    (!incumbent.has_part("guitar") && challenger.has_part("guitar"))
        .then(|| "Better chart has guitar, current chart doesn't".to_string())
}

fn prefer_higher_diff_sum(incumbent: &Chart, challenger: &Chart) -> Option<String> {
    (challenger.difficulty_sum() > incumbent.difficulty_sum())
        .then(|| "Better chart has more instruments or difficulty".to_string())
}

/// Ranking groups in evaluation order. Later groups only run while more than
/// one challenger is still in consideration.
fn ranking_groups() -> Vec<Vec<Rule>> {
    vec![
        vec![
            same_charter_newer,
            prefer_harmonix,
            prefer_official,
            prefer_drums,
        ],
        vec![prefer_guitar],
        vec![prefer_higher_diff_sum],
    ]
}

/// Pick the single best chart out of a candidate list.
///
/// Protocol, per group:
/// 1. Run every rule against the *original* incumbent (`candidates[0]`),
///    never the survivor of an earlier group.
/// 2. Exactly one challenger with reasons wins outright.
/// 3. Several challengers with reasons narrow the in-consideration set and
///    the next group runs.
/// 4. No challenger with reasons: run the group reversed against the first
///    remaining challenger; any reason there confirms the incumbent outright,
///    with empty reasons. The reverse check never promotes a challenger.
///
/// Exhausting all groups leaves the incumbent winning with empty reasons.
/// Deterministic for a fixed candidate ordering: nothing here iterates an
/// unordered map.
pub fn select_chart(candidates: &[Chart]) -> Option<SelectionResult> {
    let (incumbent, challengers) = candidates.split_first()?;
    let mut in_consideration: Vec<&Chart> = challengers.iter().collect();

    for group in ranking_groups() {
        if in_consideration.is_empty() {
            break;
        }

        let mut with_reasons: Vec<(&Chart, Vec<String>)> = in_consideration
            .iter()
            .map(|challenger| {
                let reasons: Vec<String> = group
                    .iter()
                    .filter_map(|rule| rule(incumbent, challenger))
                    .collect();
                (*challenger, reasons)
            })
            .filter(|(_, reasons)| !reasons.is_empty())
            .collect();

        match with_reasons.len() {
            1 => {
                let (chart, reasons) = with_reasons.pop().expect("len checked");
                return Some(SelectionResult {
                    chart: chart.clone(),
                    reasons,
                });
            }
            0 => {
                let challenger = in_consideration[0];
                let incumbent_wins = group.iter().any(|rule| rule(challenger, incumbent).is_some());
                if incumbent_wins {
                    return Some(SelectionResult {
                        chart: incumbent.clone(),
                        reasons: Vec::new(),
                    });
                }
                // Neither side preferred under this group; next group decides.
            }
            _ => {
                in_consideration = with_reasons.into_iter().map(|(chart, _)| chart).collect();
            }
        }
    }

    Some(SelectionResult {
        chart: incumbent.clone(),
        reasons: Vec::new(),
    })
}
