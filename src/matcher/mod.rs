pub mod levenshtein;
pub mod normalize;

use crate::playlist::{MatchResult, NameIndex};

use self::levenshtein::similarity;

pub const DEFAULT_THRESHOLD: u8 = 85;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameMatcher {
    threshold: u8,
}

impl Default for NameMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl NameMatcher {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    /// Scores `name` against every candidate and keeps the best one.
    ///
    /// The index is walked in name order and only a strictly higher score
    /// replaces the current best, so ties go to the lexicographically first
    /// target name. `target_id` is set only when the best score reaches the
    /// threshold.
    pub fn best_match(&self, name: &str, candidates: &NameIndex) -> MatchResult {
        let mut best: Option<(u8, &str, &str)> = None;

        for (candidate, id) in candidates.iter() {
            let score = similarity(name, candidate);
            if best.map_or(true, |(best_score, _, _)| score > best_score) {
                best = Some((score, candidate, id));
            }
        }

        match best {
            Some((score, candidate, id)) if score >= self.threshold => {
                log::debug!(
                    "Found match for '{}' => '{}' with {}% similarity",
                    name,
                    candidate,
                    score
                );
                MatchResult {
                    source_name: name.to_string(),
                    target_id: Some(id.to_string()),
                    score,
                }
            }
            Some((score, candidate, _)) => {
                log::debug!(
                    "Closest candidate for '{}' is '{}' at {}%, below threshold {}",
                    name,
                    candidate,
                    score,
                    self.threshold
                );
                MatchResult {
                    source_name: name.to_string(),
                    target_id: None,
                    score,
                }
            }
            None => MatchResult {
                source_name: name.to_string(),
                target_id: None,
                score: 0,
            },
        }
    }

    pub fn find(&self, name: &str, candidates: &NameIndex) -> Option<String> {
        self.best_match(name, candidates).target_id
    }
}
