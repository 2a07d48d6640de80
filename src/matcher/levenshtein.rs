use levenshtein::levenshtein;

use super::normalize::normalize;

/// Similarity of two playlist names on a 0..=100 scale.
///
/// Both names are normalized first, then the edit distance is scaled by the
/// longer name's length in chars.
pub fn similarity(a: &str, b: &str) -> u8 {
    let a = normalize(a);
    let b = normalize(b);

    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 100;
    }

    let distance = levenshtein(&a, &b);
    let ratio = 1.0 - distance as f64 / longest as f64;
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}
