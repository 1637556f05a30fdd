//! Character trie with frequency-weighted ranking.

use crate::index::scoring::{self, FREQUENCY_WEIGHT};
use std::collections::BTreeMap;
use std::ops::ControlFlow;

/// Score bonus given to a key that exactly equals the searched prefix.
pub const EXACT_PREFIX_BONUS: f64 = 100.0;

/// Position of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeId(usize);

const ROOT: NodeId = NodeId(0);

/// One node per character position.
///
/// A node is terminal iff it holds a value, so a key is either fully
/// present (flag and value together) or absent.
#[derive(Debug)]
struct IndexNode<V> {
    children: BTreeMap<char, NodeId>,
    value: Option<V>,
    /// Number of insertions that passed through this node, plus any
    /// explicit frequency updates. Never decreases.
    frequency: u64,
}

impl<V> IndexNode<V> {
    fn new() -> Self {
        Self {
            children: BTreeMap::new(),
            value: None,
            frequency: 0,
        }
    }
}

/// A ranked match from the index.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult<'a, V> {
    /// The matched key.
    pub key: String,
    /// The value stored under `key`.
    pub value: &'a V,
    /// Ranking score; higher is better.
    pub score: f64,
}

/// Prefix tree mapping string keys to values of type `V`.
///
/// Nodes live in an arena and refer to their children by index; the
/// index owns the whole graph. Children are kept in char order, so every
/// traversal (and therefore [`TrieIndex::all_keys`]) visits keys in
/// lexicographic order.
///
/// Sorted outputs break score ties by ascending key.
///
/// # Example
///
/// ```
/// use eidx_core::TrieIndex;
///
/// let mut index = TrieIndex::new();
/// index.insert("commerce.cart.add", 1);
/// index.insert("commerce.cart.remove", 2);
///
/// assert_eq!(index.search("commerce.cart.add"), Some(&1));
/// assert_eq!(index.prefix_search("commerce.cart", 10).len(), 2);
/// assert_eq!(index.fuzzy_search("remove", 10)[0].key, "commerce.cart.remove");
/// ```
#[derive(Debug)]
pub struct TrieIndex<V> {
    nodes: Vec<IndexNode<V>>,
    size: usize,
}

impl<V> Default for TrieIndex<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> TrieIndex<V> {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![IndexNode::new()],
            size: 0,
        }
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns true if no key is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of allocated nodes, including the root.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Drops every node and resets the key count.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(IndexNode::new());
        self.size = 0;
    }

    /// Inserts or replaces the value for `key`.
    ///
    /// Every node on the path has its frequency bumped by one. Returns
    /// true if the key was new. The empty key is ignored.
    pub fn insert(&mut self, key: &str, value: V) -> bool {
        if key.is_empty() {
            return false;
        }

        let mut current = ROOT;
        for ch in key.chars() {
            let next = match self.nodes[current.0].children.get(&ch) {
                Some(&child) => child,
                None => {
                    let child = NodeId(self.nodes.len());
                    self.nodes.push(IndexNode::new());
                    self.nodes[current.0].children.insert(ch, child);
                    child
                }
            };
            let node = &mut self.nodes[next.0];
            node.frequency = node.frequency.saturating_add(1);
            current = next;
        }

        let is_new = self.nodes[current.0].value.replace(value).is_none();
        if is_new {
            self.size += 1;
        }
        is_new
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn search(&self, key: &str) -> Option<&V> {
        self.find(key).and_then(|id| self.nodes[id.0].value.as_ref())
    }

    /// Returns a mutable reference to the value stored under `key`.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let id = self.find(key)?;
        self.nodes[id.0].value.as_mut()
    }

    /// Returns true if `key` is stored.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.search(key).is_some()
    }

    /// Frequency of the terminal node for `key`.
    #[must_use]
    pub fn frequency(&self, key: &str) -> Option<u64> {
        let node = &self.nodes[self.find(key)?.0];
        node.value.as_ref().map(|_| node.frequency)
    }

    /// Adds `increment` to the frequency of an existing key.
    ///
    /// Returns false, changing nothing, if the key is not stored.
    pub fn update_frequency(&mut self, key: &str, increment: u64) -> bool {
        let Some(id) = self.find(key) else {
            return false;
        };
        let node = &mut self.nodes[id.0];
        if node.value.is_none() {
            return false;
        }
        node.frequency = node.frequency.saturating_add(increment);
        true
    }

    /// Finds keys starting with `prefix`.
    ///
    /// If `prefix` itself is a key it scores `100 + frequency`, ahead of
    /// any completion. Other keys score their own frequency. Collection
    /// stops as soon as `max_results` candidates are gathered, in
    /// lexicographic traversal order; the gathered set is then sorted.
    #[must_use]
    pub fn prefix_search(&self, prefix: &str, max_results: usize) -> Vec<SearchResult<'_, V>> {
        if prefix.is_empty() || max_results == 0 {
            return Vec::new();
        }
        let Some(start) = self.find(prefix) else {
            return Vec::new();
        };

        let mut results = Vec::new();
        self.walk_terminals(start, prefix, |id, key, node, value| {
            let score = if id == start {
                EXACT_PREFIX_BONUS + node.frequency as f64
            } else {
                node.frequency as f64
            };
            results.push(SearchResult {
                key: key.to_string(),
                value,
                score,
            });
            if results.len() >= max_results {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        rank(&mut results, max_results);
        results
    }

    /// Finds keys approximately matching `query`.
    ///
    /// Every key is scored with [`scoring::fuzzy_match`]; matches are ranked
    /// by `match score + frequency × 0.1`, which is also the reported score.
    #[must_use]
    pub fn fuzzy_search(&self, query: &str, max_results: usize) -> Vec<SearchResult<'_, V>> {
        if query.is_empty() || max_results == 0 {
            return Vec::new();
        }

        let mut results = Vec::new();
        self.walk_terminals(ROOT, "", |_, key, node, value| {
            if let Some(m) = scoring::fuzzy_match(key, query) {
                results.push(SearchResult {
                    key: key.to_string(),
                    value,
                    score: m.score + node.frequency as f64 * FREQUENCY_WEIGHT,
                });
            }
            ControlFlow::Continue(())
        });

        rank(&mut results, max_results);
        results
    }

    /// Every stored key, in lexicographic order.
    #[must_use]
    pub fn all_keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.size);
        self.walk_terminals(ROOT, "", |_, key, _, _| {
            keys.push(key.to_string());
            ControlFlow::Continue(())
        });
        keys
    }

    /// Every stored key with its value, in lexicographic order.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, &V)> {
        let mut entries = Vec::with_capacity(self.size);
        self.walk_terminals(ROOT, "", |_, key, _, value| {
            entries.push((key.to_string(), value));
            ControlFlow::Continue(())
        });
        entries
    }

    fn find(&self, key: &str) -> Option<NodeId> {
        if key.is_empty() {
            return None;
        }
        key.chars().try_fold(ROOT, |id, ch| {
            self.nodes[id.0].children.get(&ch).copied()
        })
    }

    /// Depth-first pre-order walk over terminal nodes below `start`
    /// (inclusive). `prefix` is the key spelled by the path to `start`.
    fn walk_terminals<'a, F>(&'a self, start: NodeId, prefix: &str, mut visit: F)
    where
        F: FnMut(NodeId, &str, &'a IndexNode<V>, &'a V) -> ControlFlow<()>,
    {
        let mut key = prefix.to_string();
        let mut stack: Vec<(NodeId, usize, Option<char>)> = vec![(start, key.len(), None)];

        while let Some((id, parent_len, ch)) = stack.pop() {
            key.truncate(parent_len);
            if let Some(ch) = ch {
                key.push(ch);
            }

            let node = &self.nodes[id.0];
            if let Some(value) = node.value.as_ref() {
                if visit(id, &key, node, value).is_break() {
                    return;
                }
            }

            let len = key.len();
            stack.extend(
                node.children
                    .iter()
                    .rev()
                    .map(|(&ch, &child)| (child, len, Some(ch))),
            );
        }
    }
}

/// Sorts by score descending then key ascending, and truncates.
fn rank<V>(results: &mut Vec<SearchResult<'_, V>>, max_results: usize) {
    results.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.key.cmp(&b.key)));
    results.truncate(max_results);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::scoring::{SUBSTRING_BASE, WORD_BOUNDARY_BASE};

    fn keys<'a, V>(results: &'a [SearchResult<'_, V>]) -> Vec<&'a str> {
        results.iter().map(|r| r.key.as_str()).collect()
    }

    #[test]
    fn insert_and_search() {
        let mut index = TrieIndex::new();
        assert!(index.insert("a.b.c", 1));
        assert!(index.insert("a.b", 2));

        assert_eq!(index.search("a.b.c"), Some(&1));
        assert_eq!(index.search("a.b"), Some(&2));
        assert_eq!(index.search("a"), None);
        assert_eq!(index.search("a.b.c.d"), None);
        assert_eq!(index.search(""), None);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn reinsert_overwrites_without_growing() {
        let mut index = TrieIndex::new();
        index.insert("test.key", "value1");
        assert!(!index.insert("test.key", "value2"));

        assert_eq!(index.search("test.key"), Some(&"value2"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn empty_key_is_ignored() {
        let mut index = TrieIndex::new();
        assert!(!index.insert("", 1));
        assert_eq!(index.len(), 0);
        assert_eq!(index.node_count(), 1);
        assert!(index.all_keys().is_empty());
    }

    #[test]
    fn frequency_counts_passes() {
        let mut index = TrieIndex::new();
        index.insert("ab", ());
        index.insert("abc", ());
        index.insert("ab", ());

        assert_eq!(index.frequency("ab"), Some(3));
        assert_eq!(index.frequency("abc"), Some(1));
        assert_eq!(index.frequency("a"), None);
    }

    #[test]
    fn prefix_search_scenario() {
        let mut index = TrieIndex::new();
        index.insert("pandc.vnext.recommendations.view", 1);
        index.insert("pandc.vnext.discovery.search", 2);

        let results = index.prefix_search("pandc.vnext.recommendations", 10);
        assert_eq!(keys(&results), vec!["pandc.vnext.recommendations.view"]);
    }

    #[test]
    fn prefix_search_boosts_exact_key() {
        let mut index = TrieIndex::new();
        index.insert("shop.cart", ());
        for _ in 0..5 {
            index.insert("shop.cart.add", ());
        }

        let results = index.prefix_search("shop.cart", 10);
        assert_eq!(keys(&results), vec!["shop.cart", "shop.cart.add"]);
        assert_eq!(results[0].score, 100.0 + 6.0);
        assert_eq!(results[1].score, 5.0);
    }

    #[test]
    fn prefix_search_only_returns_prefixed_keys() {
        let mut index = TrieIndex::new();
        for key in ["ab", "abc", "abd", "b", "ba", "a"] {
            index.insert(key, ());
        }
        let results = index.prefix_search("ab", 10);
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.key.starts_with("ab")));
    }

    #[test]
    fn prefix_search_stops_early() {
        let mut index = TrieIndex::new();
        index.insert("k.a", ());
        index.insert("k.b", ());
        for _ in 0..10 {
            index.insert("k.c", ());
        }

        // Collection stops after "k.a" and "k.b", so the busier "k.c" is
        // never reached.
        let results = index.prefix_search("k.", 2);
        assert_eq!(keys(&results), vec!["k.a", "k.b"]);
    }

    #[test]
    fn prefix_search_misses() {
        let mut index = TrieIndex::new();
        index.insert("abc", ());
        assert!(index.prefix_search("x", 10).is_empty());
        assert!(index.prefix_search("", 10).is_empty());
        assert!(index.prefix_search("abc", 0).is_empty());
    }

    #[test]
    fn fuzzy_substring_scenario() {
        let mut index = TrieIndex::new();
        index.insert("commerce.cart.add", ());

        let results = index.fuzzy_search("cart", 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].key, "commerce.cart.add");
        assert!((SUBSTRING_BASE..WORD_BOUNDARY_BASE).contains(&results[0].score));
    }

    #[test]
    fn fuzzy_ranks_by_tier_then_frequency() {
        let mut index = TrieIndex::new();
        index.insert("cart", ());
        index.insert("cart.add", ());
        index.insert("shop.cart", ());
        for _ in 0..3 {
            index.insert("shop.cart", ());
        }
        index.insert("zzz", ());

        let results = index.fuzzy_search("CART", 10);
        assert_eq!(keys(&results), vec!["cart", "cart.add", "shop.cart"]);
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn fuzzy_truncates_and_breaks_ties_by_key() {
        let mut index = TrieIndex::new();
        for key in ["x.b", "x.a", "x.c"] {
            index.insert(key, ());
        }
        let results = index.fuzzy_search("x", 2);
        assert_eq!(keys(&results), vec!["x.a", "x.b"]);
    }

    #[test]
    fn update_frequency_requires_existing_key() {
        let mut index = TrieIndex::new();
        index.insert("a.b", ());

        assert!(!index.update_frequency("nonexistent", 1));
        assert!(!index.update_frequency("a", 1));
        assert_eq!(index.frequency("a.b"), Some(1));
        assert_eq!(index.len(), 1);

        assert!(index.update_frequency("a.b", 4));
        assert_eq!(index.frequency("a.b"), Some(5));
    }

    #[test]
    fn all_keys_lexicographic() {
        let mut index = TrieIndex::new();
        for key in ["b", "a.c", "a", "a.b"] {
            index.insert(key, key.len());
        }
        assert_eq!(index.all_keys(), vec!["a", "a.b", "a.c", "b"]);

        let entries = index.entries();
        assert_eq!(entries[1], ("a.b".to_string(), &3));
    }

    #[test]
    fn clear_resets() {
        let mut index = TrieIndex::new();
        index.insert("a", 1);
        index.insert("b", 2);
        index.clear();

        assert_eq!(index.len(), 0);
        assert!(index.all_keys().is_empty());
        assert_eq!(index.search("a"), None);
        assert_eq!(index.node_count(), 1);
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut index = TrieIndex::new();
        index.insert("a.b", 1);
        *index.get_mut("a.b").unwrap() += 10;
        assert_eq!(index.search("a.b"), Some(&11));
        assert!(index.get_mut("a").is_none());
    }

    #[test]
    fn many_keys_with_shared_prefix() {
        let mut index = TrieIndex::new();
        for i in 0..10_000 {
            index.insert(&format!("pandc.vnext.eid{i}"), i);
        }
        assert_eq!(index.len(), 10_000);
        assert_eq!(index.search("pandc.vnext.eid9999"), Some(&9999));
    }
}
