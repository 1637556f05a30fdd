//! Approximate-match scoring for fuzzy search.
//!
//! A candidate key is compared against a query after case folding. The
//! first tier that matches with a positive score wins:
//!
//! | Tier           | Condition                                  | Score                   |
//! |----------------|--------------------------------------------|-------------------------|
//! | Exact          | key == query                               | 100                     |
//! | Prefix         | key starts with query                      | 90                      |
//! | Word boundary  | query occurs right after a separator       | 80 − match offset       |
//! | Substring      | query occurs anywhere                      | 70 − match offset       |
//! | Subsequence    | query chars appear in order in the key     | 60 − (key len − query len) |
//!
//! Offsets and lengths are counted in chars, and reported offsets refer to
//! the original key even when lowercasing changes its length. A tier whose score drops to
//! zero or below does not match, and a key matching no tier is excluded.

use serde::{Deserialize, Serialize};

/// Characters that start a new word inside a key.
pub const WORD_SEPARATORS: [char; 6] = ['.', '_', '-', '/', ':', ' '];

/// Score of an exact match.
pub const EXACT_SCORE: f64 = 100.0;
/// Score of a prefix match.
pub const PREFIX_SCORE: f64 = 90.0;
/// Base score of a word-boundary match.
pub const WORD_BOUNDARY_BASE: f64 = 80.0;
/// Base score of a substring match.
pub const SUBSTRING_BASE: f64 = 70.0;
/// Base score of a subsequence match.
pub const SUBSEQUENCE_BASE: f64 = 60.0;

/// Weight of a node's traversal frequency when ranking fuzzy results.
pub const FREQUENCY_WEIGHT: f64 = 0.1;

/// How a key matched a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchKind {
    /// The key equals the query.
    Exact,
    /// The key starts with the query.
    Prefix,
    /// The query starts a word inside the key.
    WordBoundary,
    /// The query occurs inside a word.
    Substring,
    /// The query chars occur in order, with gaps.
    Subsequence,
}

/// Result of scoring a key against a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyMatch {
    /// Which tier matched.
    pub kind: MatchKind,
    /// Tier score, always positive.
    pub score: f64,
    /// Char offset of the first matched char.
    pub start: usize,
    /// Char offset one past the last matched char.
    pub end: usize,
}

impl FuzzyMatch {
    /// Extracts the matched span from `key`.
    #[must_use]
    pub fn matched<'k>(&self, key: &'k str) -> &'k str {
        let byte_at = |chars: usize| {
            key.char_indices()
                .nth(chars)
                .map_or(key.len(), |(byte, _)| byte)
        };
        &key[byte_at(self.start)..byte_at(self.end)]
    }
}

/// Scores `key` against `query`. Returns `None` if nothing matches.
///
/// Matching runs on the lowercased key; `start` and `end` of the result
/// are char offsets into the original `key`.
#[must_use]
pub fn fuzzy_match(key: &str, query: &str) -> Option<FuzzyMatch> {
    if query.is_empty() || key.is_empty() {
        return None;
    }

    let folded = FoldedKey::new(key);
    let query: Vec<char> = query.chars().flat_map(char::to_lowercase).collect();
    let chars = folded.chars.as_slice();
    if query.len() > chars.len() {
        return None;
    }

    let found = |kind, score: f64, at: usize| {
        (score > 0.0).then(|| FuzzyMatch {
            kind,
            score,
            start: folded.origin(at),
            end: folded.origin_end(at + query.len()),
        })
    };

    if chars == query.as_slice() {
        return found(MatchKind::Exact, EXACT_SCORE, 0);
    }
    if chars.starts_with(&query) {
        return found(MatchKind::Prefix, PREFIX_SCORE, 0);
    }

    // Every offset is tried, so overlapping occurrences are not skipped.
    let mut first = None;
    let mut boundary = None;
    for at in 0..=chars.len() - query.len() {
        if !chars[at..].starts_with(&query) {
            continue;
        }
        first.get_or_insert(at);
        if at > 0 && WORD_SEPARATORS.contains(&chars[at - 1]) {
            boundary = Some(at);
            break;
        }
    }

    if let Some(at) = boundary {
        let offset = folded.origin(at) as f64;
        if let Some(m) = found(MatchKind::WordBoundary, WORD_BOUNDARY_BASE - offset, at) {
            return Some(m);
        }
    }
    if let Some(at) = first {
        let offset = folded.origin(at) as f64;
        if let Some(m) = found(MatchKind::Substring, SUBSTRING_BASE - offset, at) {
            return Some(m);
        }
    }

    subsequence(&folded, &query)
}

/// A lowercased key that remembers which original char each folded char
/// came from. Lowercasing may expand one char into several.
struct FoldedKey {
    chars: Vec<char>,
    origins: Vec<usize>,
    original_len: usize,
}

impl FoldedKey {
    fn new(key: &str) -> Self {
        let mut chars = Vec::with_capacity(key.len());
        let mut origins = Vec::with_capacity(key.len());
        let mut original_len = 0;
        for (index, c) in key.chars().enumerate() {
            for lower in c.to_lowercase() {
                chars.push(lower);
                origins.push(index);
            }
            original_len = index + 1;
        }
        Self {
            chars,
            origins,
            original_len,
        }
    }

    /// Original offset of the folded char at `at`.
    fn origin(&self, at: usize) -> usize {
        self.origins.get(at).copied().unwrap_or(self.original_len)
    }

    /// Original offset one past the folded char before `to`.
    fn origin_end(&self, to: usize) -> usize {
        match to.checked_sub(1) {
            Some(last) => self.origins.get(last).map_or(self.original_len, |&o| o + 1),
            None => 0,
        }
    }
}

/// Greedy in-order match of every query char.
fn subsequence(folded: &FoldedKey, query: &[char]) -> Option<FuzzyMatch> {
    let mut wanted = query.iter().peekable();
    let mut start = None;
    let mut end = 0;

    for (at, c) in folded.chars.iter().enumerate() {
        if wanted.peek() == Some(&c) {
            wanted.next();
            start.get_or_insert(at);
            end = at + 1;
        }
    }

    if wanted.peek().is_some() {
        return None;
    }

    let key_len: usize = folded.chars.len();
    let score = SUBSEQUENCE_BASE - key_len.saturating_sub(query.len()) as f64;
    (score > 0.0).then(|| FuzzyMatch {
        kind: MatchKind::Subsequence,
        score,
        start: folded.origin(start.unwrap_or(0)),
        end: folded.origin_end(end),
    })
}
