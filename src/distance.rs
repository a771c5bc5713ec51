//! Bounded Levenshtein edit distance.
//!
//! Every caller asks "is this within k edits", never "what is the exact
//! distance of arbitrary strings", so the DP bails out as soon as a whole row
//! exceeds the cap instead of filling the full matrix.

/// Edit distance (insertions, deletions, substitutions) between `a` and `b`,
/// capped at `max`. Returns `None` when the distance exceeds `max`.
pub fn bounded_levenshtein(a: &str, b: &str, max: usize) -> Option<usize> {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    // A length gap alone already costs that many insertions.
    if a_len.abs_diff(b_len) > max {
        return None;
    }
    if a_len == 0 {
        return (b_len <= max).then_some(b_len);
    }
    if b_len == 0 {
        return (a_len <= max).then_some(a_len);
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0usize; b_len + 1];

    for i in 1..=a_len {
        curr[0] = i;
        let mut row_min = curr[0];
        for j in 1..=b_len {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
            row_min = row_min.min(curr[j]);
        }
        if row_min > max {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let dist = prev[b_len];
    (dist <= max).then_some(dist)
}

/// True when the two strings are within `max` edits of each other.
pub fn within_distance(a: &str, b: &str, max: usize) -> bool {
    bounded_levenshtein(a, b, max).is_some()
}
