//! Closure Cache
//!
//! Ancestor and descendant sets (reflexive, transitive) for every node,
//! computed by breadth-first reachability and memoized per node. Depth,
//! level and the root/leaf sets live here too since they are pure functions
//! of the same edge set.
//!
//! Each slot is a [`OnceLock`], so concurrent readers of a frozen taxonomy
//! compute a given entry at most once. The owning taxonomy calls
//! [`ClosureCache::reset`] after every successful mutation.

use std::collections::{BTreeSet, VecDeque};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use rustc_hash::FxHashSet;

use super::{OntologyResult, Taxonomy, TermId};

/// Statistics for memoization performance monitoring
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Lookups answered from a populated slot
    pub hits: AtomicU64,
    /// Lookups that had to compute the value
    pub misses: AtomicU64,
    /// Wholesale clears caused by mutations
    pub invalidations: AtomicU64,
}

impl CacheStats {
    /// Get overall hit rate
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let total = hits + self.misses.load(Ordering::Relaxed);
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Get summary as string
    pub fn summary(&self) -> String {
        format!(
            "hits: {}, misses: {}, hit rate: {:.2}%, invalidations: {}",
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            self.hit_rate() * 100.0,
            self.invalidations.load(Ordering::Relaxed),
        )
    }

    pub(crate) fn record_invalidation(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Read a slot, computing and storing it on first access.
    ///
    /// A miss is counted only by the caller whose `compute` actually ran, so
    /// threads racing on an empty slot add one miss between them.
    pub(crate) fn memoize<'a, T>(&self, slot: &'a OnceLock<T>, compute: impl FnOnce() -> T) -> &'a T {
        if let Some(value) = slot.get() {
            self.record_hit();
            return value;
        }
        let mut computed = false;
        let value = slot.get_or_init(|| {
            computed = true;
            compute()
        });
        if computed {
            self.misses.fetch_add(1, Ordering::Relaxed);
        } else {
            self.record_hit();
        }
        value
    }
}

/// Per-node memo slots for closure queries, indexed by `NodeIndex`
#[derive(Debug)]
pub struct ClosureCache<N> {
    ancestors: Vec<OnceLock<BTreeSet<N>>>,
    descendants: Vec<OnceLock<BTreeSet<N>>>,
    depths: Vec<OnceLock<usize>>,
    levels: Vec<OnceLock<usize>>,
    leaf_counts: Vec<OnceLock<usize>>,
    roots: OnceLock<BTreeSet<N>>,
    leaves: OnceLock<BTreeSet<N>>,
    max_level: OnceLock<usize>,
}

impl<N> ClosureCache<N> {
    pub(crate) fn new() -> Self {
        Self {
            ancestors: Vec::new(),
            descendants: Vec::new(),
            depths: Vec::new(),
            levels: Vec::new(),
            leaf_counts: Vec::new(),
            roots: OnceLock::new(),
            leaves: OnceLock::new(),
            max_level: OnceLock::new(),
        }
    }

    /// Drop every entry and size the slot vectors for `n` nodes
    pub(crate) fn reset(&mut self, n: usize) {
        fn fresh<T>(slots: &mut Vec<OnceLock<T>>, n: usize) {
            slots.clear();
            slots.resize_with(n, OnceLock::new);
        }
        fresh(&mut self.ancestors, n);
        fresh(&mut self.descendants, n);
        fresh(&mut self.depths, n);
        fresh(&mut self.levels, n);
        fresh(&mut self.leaf_counts, n);
        self.roots.take();
        self.leaves.take();
        self.max_level.take();
    }

    /// Number of populated closure entries (ancestor and descendant sets)
    pub fn populated(&self) -> usize {
        self.ancestors.iter().filter(|slot| slot.get().is_some()).count()
            + self.descendants.iter().filter(|slot| slot.get().is_some()).count()
    }
}

impl<N: TermId> Taxonomy<N> {
    /// Nodes reachable by following superterm edges zero or more times
    pub fn ancestors(&self, id: &N) -> OntologyResult<&BTreeSet<N>> {
        let idx = self.node_index(id)?;
        Ok(self.ancestors_at(idx))
    }

    /// Nodes reachable by following subterm edges zero or more times
    pub fn descendants(&self, id: &N) -> OntologyResult<&BTreeSet<N>> {
        let idx = self.node_index(id)?;
        Ok(self.descendants_at(idx))
    }

    /// Nodes without a superterm
    pub fn roots(&self) -> &BTreeSet<N> {
        self.roots_set()
    }

    /// Nodes without a subterm
    pub fn leaves(&self) -> &BTreeSet<N> {
        self.leaves_set()
    }

    /// Minimum number of edges from any root down to the node
    pub fn depth(&self, id: &N) -> OntologyResult<usize> {
        let idx = self.node_index(id)?;
        Ok(self.depth_at(idx))
    }

    /// Largest depth of any node (0 for an empty taxonomy)
    pub fn max_depth(&self) -> usize {
        self.graph
            .node_indices()
            .map(|idx| self.depth_at(idx))
            .max()
            .unwrap_or(0)
    }

    /// Whether `ancestor` subsumes `descendant` (reflexive)
    pub fn subsumes(&self, ancestor: &N, descendant: &N) -> OntologyResult<bool> {
        self.node_index(ancestor)?;
        Ok(self.ancestors(descendant)?.contains(ancestor))
    }

    /// Read access to the closure memo slots
    pub fn closure_cache(&self) -> &ClosureCache<N> {
        &self.closure
    }

    pub(crate) fn ancestors_at(&self, idx: NodeIndex) -> &BTreeSet<N> {
        self.stats.memoize(&self.closure.ancestors[idx.index()], || {
            self.reachable(idx, Direction::Incoming)
        })
    }

    pub(crate) fn descendants_at(&self, idx: NodeIndex) -> &BTreeSet<N> {
        self.stats.memoize(&self.closure.descendants[idx.index()], || {
            self.reachable(idx, Direction::Outgoing)
        })
    }

    pub(crate) fn roots_set(&self) -> &BTreeSet<N> {
        self.stats
            .memoize(&self.closure.roots, || self.boundary(Direction::Incoming))
    }

    pub(crate) fn leaves_set(&self) -> &BTreeSet<N> {
        self.stats
            .memoize(&self.closure.leaves, || self.boundary(Direction::Outgoing))
    }

    /// Leaves among the descendants of a node
    pub(crate) fn n_leaf_descendants(&self, idx: NodeIndex) -> usize {
        *self.stats.memoize(&self.closure.leaf_counts[idx.index()], || {
            let leaves = self.leaves_set();
            self.descendants_at(idx)
                .iter()
                .filter(|id| leaves.contains(*id))
                .count()
        })
    }

    pub(crate) fn depth_at(&self, idx: NodeIndex) -> usize {
        *self.stats.memoize(&self.closure.depths[idx.index()], || {
            // BFS upward: the first parentless node reached is the closest root
            let mut visited = FxHashSet::default();
            let mut queue = VecDeque::from([(idx, 0usize)]);
            while let Some((current, dist)) = queue.pop_front() {
                if !visited.insert(current) {
                    continue;
                }
                let mut parents = self
                    .graph
                    .neighbors_directed(current, Direction::Incoming)
                    .peekable();
                if parents.peek().is_none() {
                    return dist;
                }
                for parent in parents {
                    queue.push_back((parent, dist + 1));
                }
            }
            0
        })
    }

    /// Longest path from any root down to the node.
    ///
    /// Unlike depth, level strictly increases along every subsumption edge.
    pub(crate) fn level_at(&self, idx: NodeIndex) -> usize {
        let slots = &self.closure.levels;
        if let Some(&level) = slots[idx.index()].get() {
            self.stats.record_hit();
            return level;
        }

        // Iterative post-order over superterms so that deep ontologies do not
        // exhaust the stack
        let mut stack = vec![(idx, false)];
        while let Some((node, expanded)) = stack.pop() {
            if slots[node.index()].get().is_some() {
                continue;
            }
            if expanded {
                let level = self
                    .graph
                    .neighbors_directed(node, Direction::Incoming)
                    .map(|parent| slots[parent.index()].get().map_or(0, |l| l + 1))
                    .max()
                    .unwrap_or(0);
                self.stats.memoize(&slots[node.index()], || level);
            } else {
                stack.push((node, true));
                for parent in self.graph.neighbors_directed(node, Direction::Incoming) {
                    if slots[parent.index()].get().is_none() {
                        stack.push((parent, false));
                    }
                }
            }
        }
        slots[idx.index()].get().copied().unwrap_or(0)
    }

    pub(crate) fn max_level(&self) -> usize {
        *self.stats.memoize(&self.closure.max_level, || {
            self.graph
                .node_indices()
                .map(|idx| self.level_at(idx))
                .max()
                .unwrap_or(0)
        })
    }

    /// Reflexive reachability along `direction`
    fn reachable(&self, start: NodeIndex, direction: Direction) -> BTreeSet<N> {
        let mut seen = FxHashSet::default();
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            for next in self.graph.neighbors_directed(current, direction) {
                if !seen.contains(&next) {
                    queue.push_back(next);
                }
            }
        }
        seen.into_iter().map(|idx| self.term(idx).clone()).collect()
    }

    /// Nodes with no neighbor along `direction`
    fn boundary(&self, direction: Direction) -> BTreeSet<N> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, direction)
                    .next()
                    .is_none()
            })
            .map(|idx| self.term(idx).clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::fixtures::{disconnected_taxonomy, metal_diamond_taxonomy, metal_taxonomy};

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_diamond_closures() {
        let mut taxonomy = metal_diamond_taxonomy().unwrap();
        taxonomy.freeze();

        assert_eq!(
            taxonomy.ancestors(&"gold".into()).unwrap(),
            &set(&["gold", "precious_metal", "coinage_metal", "metal"])
        );
        assert_eq!(
            taxonomy.ancestors(&"silver".into()).unwrap(),
            &set(&["silver", "coinage_metal", "metal"])
        );
        assert_eq!(
            taxonomy.descendants(&"coinage_metal".into()).unwrap(),
            &set(&["coinage_metal", "gold", "silver"])
        );
        // gold is reached twice from metal but counted once
        assert_eq!(taxonomy.descendants(&"metal".into()).unwrap().len(), 5);
    }

    #[test]
    fn test_roots_and_leaves() {
        let taxonomy = metal_taxonomy().unwrap();
        assert_eq!(taxonomy.roots(), &set(&["metal"]));
        assert_eq!(
            taxonomy.leaves(),
            &set(&["copper", "gold", "palladium", "platinum", "silver"])
        );

        let disconnected = disconnected_taxonomy().unwrap();
        assert_eq!(disconnected.roots(), &set(&["metal", "tree"]));
    }

    #[test]
    fn test_isolated_node_is_root_and_leaf() {
        let mut taxonomy: Taxonomy = Taxonomy::new();
        taxonomy.add_node("alone".into()).unwrap();
        assert_eq!(taxonomy.roots(), &set(&["alone"]));
        assert_eq!(taxonomy.leaves(), &set(&["alone"]));
        assert_eq!(taxonomy.ancestors(&"alone".into()).unwrap(), &set(&["alone"]));
    }

    #[test]
    fn test_depth_and_level() {
        let mut taxonomy = metal_taxonomy().unwrap();
        assert_eq!(taxonomy.depth(&"metal".into()).unwrap(), 0);
        assert_eq!(taxonomy.depth(&"gold".into()).unwrap(), 2);
        assert_eq!(taxonomy.max_depth(), 2);

        // A shortcut edge shortens depth but not level
        taxonomy.add_edge(&"metal".into(), &"gold".into()).unwrap();
        let gold = taxonomy.node_index(&"gold".into()).unwrap();
        assert_eq!(taxonomy.depth_at(gold), 1);
        assert_eq!(taxonomy.level_at(gold), 2);
        assert_eq!(taxonomy.max_level(), 2);
    }

    #[test]
    fn test_level_updates_cache_stats() {
        let taxonomy = metal_taxonomy().unwrap();
        let n_ancestors = taxonomy.ancestors(&"gold".into()).unwrap().len();
        let gold = taxonomy.node_index(&"gold".into()).unwrap();
        let stats = taxonomy.cache_stats();
        let hits = stats.hits.load(Ordering::Relaxed);
        let misses = stats.misses.load(Ordering::Relaxed);

        // one miss per level filled on the way up to the roots
        assert_eq!(taxonomy.level_at(gold), 2);
        assert_eq!(stats.misses.load(Ordering::Relaxed), misses + n_ancestors as u64);
        assert_eq!(stats.hits.load(Ordering::Relaxed), hits);

        assert_eq!(taxonomy.level_at(gold), 2);
        assert_eq!(stats.misses.load(Ordering::Relaxed), misses + n_ancestors as u64);
        assert_eq!(stats.hits.load(Ordering::Relaxed), hits + 1);
    }

    #[test]
    fn test_leaf_counts() {
        let taxonomy = metal_taxonomy().unwrap();
        let info = taxonomy.node_info(&"coinage".into()).unwrap();
        assert_eq!(info.n_leaves(), 3);
        let info = taxonomy.node_info(&"gold".into()).unwrap();
        assert_eq!(info.n_leaves(), 1);
    }

    #[test]
    fn test_mutation_invalidates_closures() {
        let mut taxonomy = metal_taxonomy().unwrap();
        assert_eq!(taxonomy.ancestors(&"copper".into()).unwrap().len(), 3);
        assert!(taxonomy.closure_cache().populated() > 0);

        taxonomy.add_node("alloy".into()).unwrap();
        assert_eq!(taxonomy.closure_cache().populated(), 0);
        taxonomy.add_edge(&"alloy".into(), &"copper".into()).unwrap();

        assert_eq!(
            taxonomy.ancestors(&"copper".into()).unwrap(),
            &set(&["copper", "coinage", "metal", "alloy"])
        );
        assert!(taxonomy.roots().contains("alloy"));
    }

    #[test]
    fn test_frozen_cache_hits() {
        let mut taxonomy = metal_taxonomy().unwrap();
        taxonomy.freeze();
        let first = taxonomy.ancestors(&"gold".into()).unwrap() as *const _;
        let second = taxonomy.ancestors(&"gold".into()).unwrap() as *const _;
        assert_eq!(first, second);
        assert!(taxonomy.cache_stats().hits.load(Ordering::Relaxed) >= 1);
    }

    #[test]
    fn test_unknown_node() {
        let taxonomy = metal_taxonomy().unwrap();
        let err = taxonomy.ancestors(&"zinc".into()).unwrap_err();
        assert_eq!(err.to_string(), "node not found in taxonomy: zinc");
        assert!(taxonomy.descendants(&"zinc".into()).is_err());
        assert!(taxonomy.depth(&"zinc".into()).is_err());
    }

    #[test]
    fn test_subsumes() {
        let taxonomy = metal_taxonomy().unwrap();
        assert!(taxonomy.subsumes(&"coinage".into(), &"gold".into()).unwrap());
        assert!(taxonomy.subsumes(&"gold".into(), &"gold".into()).unwrap());
        assert!(!taxonomy.subsumes(&"gold".into(), &"coinage".into()).unwrap());
    }
}
