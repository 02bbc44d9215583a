//! Fuzzy title search
//!
//! Ranks an in-memory slice of prompts against a query. A prompt matches when
//! every query character appears in its title in order (case-insensitive,
//! not necessarily contiguous). Scoring comes from the skim V2 matcher, which
//! rewards prefix and word-boundary hits and consecutive runs and penalizes
//! gaps. Only the relative order of scores is meaningful.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::Serialize;

use crate::db::prompts::Prompt;

/// One ranked hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    /// Position of the hit in the searched slice
    pub index:           usize,
    /// Character indexes of the title that matched the query
    pub matched_indexes: Vec<usize>,
    pub score:           i64,
}

/// Rank `items` against `query`, best first
///
/// An empty query matches everything in input order with a zero score.
pub fn search<S: AsRef<str>>(items: &[S], query: &str) -> Vec<Match> {
    if query.is_empty() {
        return (0..items.len())
            .map(|index| Match {
                index,
                matched_indexes: Vec::new(),
                score: 0,
            })
            .collect();
    }

    let matcher = SkimMatcherV2::default().ignore_case();
    let mut matches: Vec<Match> = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            matcher
                .fuzzy_indices(item.as_ref(), query)
                .map(|(score, matched_indexes)| Match {
                    index,
                    matched_indexes,
                    score,
                })
        })
        .collect();

    // Stable, so equal scores keep input order
    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches
}

/// Rank prompts by title
pub fn search_prompts(prompts: &[Prompt], query: &str) -> Vec<Match> {
    let titles: Vec<&str> = prompts.iter().map(|p| p.title.as_str()).collect();
    search(&titles, query)
}
