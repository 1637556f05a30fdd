//! Prefix-tree index over string keys.
//!
//! The index answers three kinds of lookup:
//! - exact: [`TrieIndex::search`]
//! - prefix completion: [`TrieIndex::prefix_search`]
//! - approximate match: [`TrieIndex::fuzzy_search`]
//!
//! Ranking is frequency weighted: each node counts how many insertions
//! passed through it, and usage can raise a key's count further with
//! [`TrieIndex::update_frequency`].
//!
//! The index is a plain single-writer structure. Sharing it across threads
//! is the registry's job (see [`SharedRegistry`](crate::SharedRegistry)).

pub mod scoring;
mod trie;

pub use scoring::{fuzzy_match, FuzzyMatch, MatchKind};
pub use trie::{SearchResult, TrieIndex, EXACT_PREFIX_BONUS};
