//! Text normalization for fuzzy identity keys.
//!
//! Library folder names and streaming metadata disagree on case, punctuation
//! and featured-artist credits; both sides are folded to a plain ASCII key
//! before any edit-distance comparison happens.

use any_ascii::any_ascii;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Featured-artist credits and similar trailing junk on artist names.
static ARTIST_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![Regex::new(r"(?i)\s+(?:feat\.?|ft\.?|featuring|with)\s+.*").unwrap()]
});

/// Decorative punctuation stripped from titles before comparison.
static TITLE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r#"["'!?.,:;…]+"#).unwrap());

static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

/// Check if a character is a Unicode combining mark (diacritical mark).
fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0xFE20..=0xFE2F)
}

/// Fold to lowercase ASCII: NFKD decomposition, drop combining marks,
/// transliterate whatever non-Latin script remains.
/// e.g. "Motörhead" → "motorhead", "Beyoncé" → "beyonce"
pub fn fold_to_ascii(s: &str) -> String {
    let stripped: String = s.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    any_ascii(&stripped).to_lowercase()
}

/// Straighten curly quotes, unify "&" with "and", collapse runs of spaces.
fn normalize_punctuation(s: &str) -> String {
    let result = s
        .replace(['\u{2018}', '\u{2019}', '\u{00B4}', '\u{0060}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(" & ", " and ");
    MULTI_SPACE.replace_all(&result, " ").to_string()
}

/// Normalize an artist name into an index key.
pub fn normalize_artist(artist: &str) -> String {
    let mut result = normalize_punctuation(artist);
    for pattern in ARTIST_PATTERNS.iter() {
        result = pattern.replace_all(&result, "").to_string();
    }

    let mut normalized = fold_to_ascii(result.trim());

    // "The Beatles" and "Beatles, The" index under the same key.
    if normalized.starts_with("the ") {
        normalized = normalized[4..].to_string();
    }
    if normalized.ends_with(", the") {
        normalized.truncate(normalized.len() - 5);
    }

    normalized.trim().to_string()
}

/// Normalize a title for the secondary fuzzy check.
///
/// Only decorative punctuation is dropped. Suffix annotations such as
/// "(2x double bass)" are left in place; the matcher tolerates them through
/// substring containment rather than stripping.
pub fn normalize_title(title: &str) -> String {
    let result = normalize_punctuation(title);
    let result = TITLE_PUNCT.replace_all(&result, "");
    let folded = fold_to_ascii(result.trim());
    MULTI_SPACE.replace_all(folded.trim(), " ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_artist_basic() {
        assert_eq!(normalize_artist("The Beatles"), "beatles");
        assert_eq!(normalize_artist("Beatles, The"), "beatles");
        assert_eq!(normalize_artist("Artist feat. Other"), "artist");
        assert_eq!(normalize_artist("Artist ft Other"), "artist");
        assert_eq!(normalize_artist("METALLICA"), "metallica");
    }

    #[test]
    fn test_fold_to_ascii() {
        assert_eq!(fold_to_ascii("Björk"), "bjork");
        assert_eq!(fold_to_ascii("Motörhead"), "motorhead");
        assert_eq!(fold_to_ascii("Beyoncé"), "beyonce");
    }

    #[test]
    fn test_normalize_title_strips_decoration() {
        assert_eq!(normalize_title("Don't Stop Me Now!"), "dont stop me now");
        assert_eq!(normalize_title("What's  Up?"), "whats up");
        // Parenthesized suffixes survive; containment handles them later.
        assert_eq!(
            normalize_title("Through the Fire and Flames (2x double bass)"),
            "through the fire and flames (2x double bass)"
        );
    }

    #[test]
    fn test_normalize_punctuation_variants() {
        assert_eq!(normalize_title("Rock & Roll"), "rock and roll");
        assert_eq!(normalize_title("Can\u{2019}t Stop"), "cant stop");
    }
}
