//! Registry-level search: index lookup, filtering, and re-sorting.

use super::Registry;
use crate::index::{fuzzy_match, MatchKind, SearchResult};
use crate::types::EidMetadata;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Which index lookup backs a search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchMode {
    /// Prefix completion, falling back to fuzzy matching when no prefix
    /// match survives filtering.
    #[default]
    Auto,
    /// Prefix completion only.
    Prefix,
    /// Fuzzy matching only.
    Fuzzy,
}

/// Final ordering of search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    /// Index score, highest first.
    #[default]
    Relevance,
    /// Usage counter, highest first.
    Frequency,
    /// EID, ascending.
    Alphabetical,
    /// Last seen, newest first.
    Recent,
}

/// Options for [`Registry::search`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchOptions {
    /// Result limit; the registry default applies when unset.
    pub max_results: Option<usize>,
    /// Lookup strategy.
    pub mode: SearchMode,
    /// Keep only EIDs in this namespace.
    pub filter_by_namespace: Option<String>,
    /// Keep only EIDs in this radset.
    pub filter_by_radset: Option<String>,
    /// Result ordering.
    pub sort_by: SortBy,
}

impl SearchOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the result limit.
    #[must_use]
    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Sets the lookup strategy.
    #[must_use]
    pub fn mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Restricts results to a namespace.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.filter_by_namespace = Some(namespace.into());
        self
    }

    /// Restricts results to a radset.
    #[must_use]
    pub fn radset(mut self, radset: impl Into<String>) -> Self {
        self.filter_by_radset = Some(radset.into());
        self
    }

    /// Sets the result ordering.
    #[must_use]
    pub fn sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    fn has_filters(&self) -> bool {
        self.filter_by_namespace.is_some() || self.filter_by_radset.is_some()
    }

    fn accepts(&self, meta: &EidMetadata) -> bool {
        self.filter_by_namespace
            .as_deref()
            .map_or(true, |ns| meta.namespace == ns)
            && self
                .filter_by_radset
                .as_deref()
                .map_or(true, |rs| meta.radset == rs)
    }
}

/// A search hit ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EidSuggestion {
    /// The EID.
    pub eid: String,
    /// Its metadata.
    pub metadata: EidMetadata,
    /// Index score.
    pub score: f64,
    /// How the EID matched.
    pub match_kind: MatchKind,
    /// The matched span of the EID, for highlighting.
    pub matched: Option<String>,
}

impl Registry {
    /// Searches registered EIDs.
    ///
    /// An empty query, or one matching nothing, returns no results.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Vec<EidSuggestion> {
        self.stats.record_search();

        let query = query.trim();
        let max_results = options
            .max_results
            .unwrap_or(self.config.default_max_results);
        if query.is_empty() || max_results == 0 {
            return Vec::new();
        }

        // Filters and non-relevance orderings are applied after the index
        // lookup, so those searches must see every candidate.
        let candidates = if options.has_filters() || options.sort_by != SortBy::Relevance {
            self.contents.index.len().max(max_results)
        } else {
            max_results
        };

        let mut suggestions = match options.mode {
            SearchMode::Prefix => self.prefix_suggestions(query, candidates, options),
            SearchMode::Fuzzy => self.fuzzy_suggestions(query, candidates, options),
            SearchMode::Auto => {
                let found = self.prefix_suggestions(query, candidates, options);
                if found.is_empty() {
                    self.fuzzy_suggestions(query, candidates, options)
                } else {
                    found
                }
            }
        };

        sort_suggestions(&mut suggestions, options.sort_by);
        suggestions.truncate(max_results);
        suggestions
    }

    fn prefix_suggestions(
        &self,
        query: &str,
        candidates: usize,
        options: &SearchOptions,
    ) -> Vec<EidSuggestion> {
        self.contents
            .index
            .prefix_search(query, candidates)
            .into_iter()
            .filter(|r| options.accepts(r.value))
            .map(|r| {
                let kind = if r.key == query {
                    MatchKind::Exact
                } else {
                    MatchKind::Prefix
                };
                suggestion(r, kind, Some(query.to_string()))
            })
            .collect()
    }

    fn fuzzy_suggestions(
        &self,
        query: &str,
        candidates: usize,
        options: &SearchOptions,
    ) -> Vec<EidSuggestion> {
        self.contents
            .index
            .fuzzy_search(query, candidates)
            .into_iter()
            .filter(|r| options.accepts(r.value))
            .filter_map(|r| {
                let m = fuzzy_match(&r.key, query)?;
                let matched = m.matched(&r.key).to_string();
                Some(suggestion(r, m.kind, Some(matched)))
            })
            .collect()
    }
}

fn suggestion(
    result: SearchResult<'_, EidMetadata>,
    match_kind: MatchKind,
    matched: Option<String>,
) -> EidSuggestion {
    EidSuggestion {
        metadata: result.value.clone(),
        eid: result.key,
        score: result.score,
        match_kind,
        matched,
    }
}

fn sort_suggestions(suggestions: &mut [EidSuggestion], sort_by: SortBy) {
    let by_relevance =
        |a: &EidSuggestion, b: &EidSuggestion| b.score.total_cmp(&a.score).then_with(|| a.eid.cmp(&b.eid));

    suggestions.sort_by(|a, b| -> Ordering {
        match sort_by {
            SortBy::Relevance => by_relevance(a, b),
            SortBy::Frequency => b
                .metadata
                .frequency
                .cmp(&a.metadata.frequency)
                .then_with(|| by_relevance(a, b)),
            SortBy::Alphabetical => a.eid.cmp(&b.eid),
            SortBy::Recent => b
                .metadata
                .last_seen
                .cmp(&a.metadata.last_seen)
                .then_with(|| a.eid.cmp(&b.eid)),
        }
    });
}
