//! Ontology Taxonomy Model
//!
//! A rooted, possibly multi-parent, directed acyclic taxonomy of terms
//! connected by subsumption edges (superterm → subterm), together with the
//! structure-derived information content (IC) and pairwise similarity
//! measures computed over it.
//!
//! # Lifecycle
//!
//! ```text
//!   ┌────────┐   freeze()   ┌────────┐
//!   │  Open  │ ───────────▶ │ Frozen │
//!   └────────┘              └────────┘
//!   add_node / add_edge     read-only, caches permanently valid
//!   clear every memo slot
//! ```
//!
//! Every derived value (closures, depths, roots, leaves, IC values, maxima)
//! lives in a compute-once slot owned by the taxonomy. Mutations take
//! `&mut self` and clear all slots wholesale, so a reader can never observe
//! a stale entry. Once frozen, no mutation is possible and the slots stay
//! valid for the lifetime of the taxonomy, which makes a frozen taxonomy
//! safe to share across threads by reference.
//!
//! # Usage
//!
//! ```rust
//! use ontology_similarity::ontology::Taxonomy;
//!
//! let mut taxonomy: Taxonomy = Taxonomy::new();
//! for term in ["metal", "precious", "coinage", "gold", "silver"] {
//!     taxonomy.add_node(term.to_string())?;
//! }
//! taxonomy.add_edge(&"metal".into(), &"precious".into())?;
//! taxonomy.add_edge(&"metal".into(), &"coinage".into())?;
//! taxonomy.add_edge(&"precious".into(), &"gold".into())?;
//! taxonomy.add_edge(&"coinage".into(), &"gold".into())?;
//! taxonomy.add_edge(&"coinage".into(), &"silver".into())?;
//! taxonomy.freeze();
//!
//! let sim = taxonomy.similarity(&"gold".into(), &"silver".into(), "intrinsic_ic_sanchez")?;
//! assert_eq!(sim.mica.as_deref(), Some("coinage"));
//! # Ok::<(), ontology_similarity::ontology::OntologyError>(())
//! ```

pub mod closure;
pub mod config;
pub mod distance;
pub mod fixtures;

use std::collections::BTreeSet;
use std::fmt;
use std::hash::Hash;

use petgraph::Direction;
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

pub use closure::{CacheStats, ClosureCache};
pub use config::TaxonomyConfig;
pub use distance::information_content::{IcCache, IcInputs, IcMetric};
pub use distance::similarity::{ResultValue, ScoreInputs, SimilarityResult, SimilarityScores};

/// Result type for taxonomy operations
pub type OntologyResult<T> = Result<T, OntologyError>;

/// Errors that can occur while building or querying a taxonomy
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OntologyError {
    #[error("node not found in taxonomy: {0}")]
    UnknownNode(String),

    #[error("{name:?} is not a supported ic_metric. Choose from: {choices}")]
    UnknownMetric { name: String, choices: String },

    #[error("edge {superterm} --> {subterm} would create a cycle")]
    Cycle { superterm: String, subterm: String },

    #[error("node already in taxonomy: {0}")]
    DuplicateNode(String),

    #[error("edge already in taxonomy: {superterm} --> {subterm}")]
    DuplicateEdge { superterm: String, subterm: String },

    #[error("taxonomy is frozen; cannot {operation}")]
    Frozen { operation: &'static str },

    #[error("invalid weight {weight} for node {node}: weights must be finite and positive")]
    InvalidWeight { node: String, weight: f64 },

    #[error("{name:?} is not a similarity result field. Choose from: {choices}")]
    UnknownField { name: String, choices: String },
}

/// Identifier of a taxonomy term.
///
/// `Ord` makes every returned set and the MICA tie-break deterministic;
/// `Display` renders identifiers into error messages.
pub trait TermId: Clone + Eq + Hash + Ord + fmt::Debug + fmt::Display {}

impl<T> TermId for T where T: Clone + Eq + Hash + Ord + fmt::Debug + fmt::Display {}

/// Mutability state of a taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Accepting mutations; memo slots are cleared on every mutation
    Open,
    /// Permanently read-only; memo slots are valid forever
    Frozen,
}

/// Descriptive metadata of a term, read by reporting collaborators.
/// None of it takes part in IC or similarity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermAttributes {
    /// Human readable name
    pub label: Option<String>,
    /// Database / machine identifier, e.g. a CURIE
    pub identifier: Option<String>,
    pub url: Option<String>,
}

impl TermAttributes {
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Node payload stored in the graph
#[derive(Debug, Clone, PartialEq)]
pub struct TermRecord<N> {
    pub id: N,
    /// Frequency basis for the weighted IC metric (default 1.0)
    pub weight: f64,
    pub attributes: TermAttributes,
}

/// Directed acyclic taxonomy of terms.
///
/// Edges point from superterm to subterm (general to specific), so
/// ancestors are reached along incoming edges and descendants along
/// outgoing edges.
pub struct Taxonomy<N: TermId = String> {
    graph: DiGraph<TermRecord<N>, ()>,
    index: FxHashMap<N, NodeIndex>,
    lifecycle: Lifecycle,
    config: TaxonomyConfig,
    closure: ClosureCache<N>,
    ic: IcCache,
    stats: CacheStats,
}

impl<N: TermId> Taxonomy<N> {
    /// Create an empty, open taxonomy with the default configuration
    pub fn new() -> Self {
        Self::with_config(TaxonomyConfig::default())
    }

    /// Create an empty, open taxonomy with a custom configuration
    pub fn with_config(config: TaxonomyConfig) -> Self {
        Self {
            graph: DiGraph::new(),
            index: FxHashMap::default(),
            lifecycle: Lifecycle::Open,
            config,
            closure: ClosureCache::new(),
            ic: IcCache::new(),
            stats: CacheStats::default(),
        }
    }

    /// Build an open taxonomy from `(superterm, subterm)` pairs, registering
    /// each endpoint with weight 1.0 the first time it appears
    pub fn from_edges(
        edges: impl IntoIterator<Item = (N, N)>,
        config: TaxonomyConfig,
    ) -> OntologyResult<Self> {
        let mut taxonomy = Self::with_config(config);
        for (superterm, subterm) in edges {
            for id in [&superterm, &subterm] {
                if !taxonomy.contains(id) {
                    taxonomy.add_node(id.clone())?;
                }
            }
            taxonomy.add_edge(&superterm, &subterm)?;
        }
        Ok(taxonomy)
    }

    /// Register a node with the default weight of 1.0
    pub fn add_node(&mut self, id: N) -> OntologyResult<()> {
        self.add_weighted_node(id, 1.0)
    }

    /// Register a node with an explicit frequency weight.
    ///
    /// Fails with [`OntologyError::Frozen`] after `freeze()`,
    /// [`OntologyError::DuplicateNode`] if the identifier already exists and
    /// [`OntologyError::InvalidWeight`] for non-finite or non-positive weights.
    pub fn add_weighted_node(&mut self, id: N, weight: f64) -> OntologyResult<()> {
        self.insert_node(id, weight, TermAttributes::default())
    }

    /// Register a node with weight 1.0 and descriptive metadata
    pub fn add_node_with(&mut self, id: N, attributes: TermAttributes) -> OntologyResult<()> {
        self.insert_node(id, 1.0, attributes)
    }

    /// Replace the metadata of an existing node.
    ///
    /// Metadata feeds no derived value, so memo slots are kept.
    pub fn set_attributes(&mut self, id: &N, attributes: TermAttributes) -> OntologyResult<()> {
        self.ensure_open("set attributes")?;
        let idx = self.node_index(id)?;
        self.graph[idx].attributes = attributes;
        Ok(())
    }

    /// Descriptive metadata of a node
    pub fn attributes(&self, id: &N) -> OntologyResult<&TermAttributes> {
        let idx = self.node_index(id)?;
        Ok(&self.graph[idx].attributes)
    }

    fn insert_node(&mut self, id: N, weight: f64, attributes: TermAttributes) -> OntologyResult<()> {
        self.ensure_open("add node")?;
        if self.index.contains_key(&id) {
            debug!(node = %id, "rejected duplicate node");
            return Err(OntologyError::DuplicateNode(id.to_string()));
        }
        if !weight.is_finite() || weight <= 0.0 {
            debug!(node = %id, weight, "rejected invalid weight");
            return Err(OntologyError::InvalidWeight {
                node: id.to_string(),
                weight,
            });
        }

        let idx = self.graph.add_node(TermRecord {
            id: id.clone(),
            weight,
            attributes,
        });
        self.index.insert(id, idx);
        self.invalidate();
        Ok(())
    }

    /// Add a subsumption edge: `subterm` is-a `superterm`.
    ///
    /// Both endpoints must already exist. An edge that would close a cycle
    /// (including a self-loop) or that already exists is rejected and the
    /// taxonomy is left untouched.
    pub fn add_edge(&mut self, superterm: &N, subterm: &N) -> OntologyResult<()> {
        self.ensure_open("add edge")?;
        let super_idx = self.node_index(superterm)?;
        let sub_idx = self.node_index(subterm)?;

        // A path sub ⇝ super already exists iff the new edge closes a cycle
        if super_idx == sub_idx || has_path_connecting(&self.graph, sub_idx, super_idx, None) {
            debug!(%superterm, %subterm, "rejected edge that would create a cycle");
            return Err(OntologyError::Cycle {
                superterm: superterm.to_string(),
                subterm: subterm.to_string(),
            });
        }
        if self.graph.contains_edge(super_idx, sub_idx) {
            debug!(%superterm, %subterm, "rejected duplicate edge");
            return Err(OntologyError::DuplicateEdge {
                superterm: superterm.to_string(),
                subterm: subterm.to_string(),
            });
        }

        self.graph.add_edge(super_idx, sub_idx, ());
        self.invalidate();
        Ok(())
    }

    /// Permanently disable mutation. Calling it again is a no-op.
    ///
    /// With [`TaxonomyConfig::warm_on_freeze`] every memo slot is populated
    /// here instead of lazily on first query.
    pub fn freeze(&mut self) {
        if self.lifecycle == Lifecycle::Frozen {
            trace!("freeze called on an already frozen taxonomy");
            return;
        }
        self.lifecycle = Lifecycle::Frozen;
        if self.config.warm_on_freeze {
            self.warm();
        }
        debug!(
            name = self.config.name.as_deref().unwrap_or(""),
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            warmed = self.config.warm_on_freeze,
            "taxonomy frozen"
        );
    }

    pub fn is_frozen(&self) -> bool {
        self.lifecycle == Lifecycle::Frozen
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn config(&self) -> &TaxonomyConfig {
        &self.config
    }

    /// Short human-readable name of the ontology, if configured
    pub fn name(&self) -> Option<&str> {
        self.config.name.as_deref()
    }

    /// Memoization statistics across closure and IC slots
    pub fn cache_stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn contains(&self, id: &N) -> bool {
        self.index.contains_key(id)
    }

    /// Total number of nodes
    pub fn n_nodes(&self) -> usize {
        self.graph.node_count()
    }

    pub fn n_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// All node identifiers, sorted
    pub fn nodes(&self) -> BTreeSet<N> {
        self.index.keys().cloned().collect()
    }

    /// All `(superterm, subterm)` edges, sorted
    pub fn edges(&self) -> Vec<(N, N)> {
        let mut edges: Vec<(N, N)> = self
            .graph
            .raw_edges()
            .iter()
            .map(|edge| {
                (
                    self.graph[edge.source()].id.clone(),
                    self.graph[edge.target()].id.clone(),
                )
            })
            .collect();
        edges.sort();
        edges
    }

    /// Frequency weight of a node
    pub fn weight(&self, id: &N) -> OntologyResult<f64> {
        let idx = self.node_index(id)?;
        Ok(self.graph[idx].weight)
    }

    /// Direct superterms of a node, sorted
    pub fn parents(&self, id: &N) -> OntologyResult<BTreeSet<N>> {
        let idx = self.node_index(id)?;
        Ok(self.neighbor_ids(idx, Direction::Incoming))
    }

    /// Direct subterms of a node, sorted
    pub fn children(&self, id: &N) -> OntologyResult<BTreeSet<N>> {
        let idx = self.node_index(id)?;
        Ok(self.neighbor_ids(idx, Direction::Outgoing))
    }

    /// Borrowing view with per-node metrics
    pub fn node_info(&self, id: &N) -> OntologyResult<NodeInfo<'_, N>> {
        let idx = self.node_index(id)?;
        Ok(NodeInfo {
            taxonomy: self,
            idx,
        })
    }

    fn ensure_open(&self, operation: &'static str) -> OntologyResult<()> {
        match self.lifecycle {
            Lifecycle::Open => Ok(()),
            Lifecycle::Frozen => {
                debug!(operation, "rejected mutation of frozen taxonomy");
                Err(OntologyError::Frozen { operation })
            }
        }
    }

    pub(crate) fn node_index(&self, id: &N) -> OntologyResult<NodeIndex> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| OntologyError::UnknownNode(id.to_string()))
    }

    pub(crate) fn term(&self, idx: NodeIndex) -> &N {
        &self.graph[idx].id
    }

    fn neighbor_ids(&self, idx: NodeIndex, direction: Direction) -> BTreeSet<N> {
        self.graph
            .neighbors_directed(idx, direction)
            .map(|n| self.term(n).clone())
            .collect()
    }

    /// Resize memo slots to the node count and drop every cached value
    fn invalidate(&mut self) {
        let n = self.graph.node_count();
        self.closure.reset(n);
        self.ic.reset(n);
        self.stats.record_invalidation();
        trace!(nodes = n, "memo slots invalidated");
    }

    /// Populate every memo slot
    fn warm(&self) {
        self.roots_set();
        self.leaves_set();
        for idx in self.graph.node_indices() {
            self.ancestors_at(idx);
            self.descendants_at(idx);
            self.depth_at(idx);
            self.level_at(idx);
        }
        for metric in IcMetric::ALL {
            for idx in self.graph.node_indices() {
                self.ic_at(idx, metric);
            }
            self.max_ic(metric);
        }
    }
}

impl<N: TermId> Default for Taxonomy<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: TermId> fmt::Debug for Taxonomy<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Taxonomy")
            .field("name", &self.config.name)
            .field("lifecycle", &self.lifecycle)
            .field("nodes", &self.graph.node_count())
            .field("edges", &self.graph.edge_count())
            .finish()
    }
}

/// Per-node view over a taxonomy
pub struct NodeInfo<'a, N: TermId> {
    taxonomy: &'a Taxonomy<N>,
    idx: NodeIndex,
}

impl<'a, N: TermId> NodeInfo<'a, N> {
    pub fn node(&self) -> &'a N {
        self.taxonomy.term(self.idx)
    }

    pub fn weight(&self) -> f64 {
        self.taxonomy.graph[self.idx].weight
    }

    pub fn label(&self) -> Option<&'a str> {
        self.attributes().label.as_deref()
    }

    pub fn identifier(&self) -> Option<&'a str> {
        self.attributes().identifier.as_deref()
    }

    pub fn url(&self) -> Option<&'a str> {
        self.attributes().url.as_deref()
    }

    fn attributes(&self) -> &'a TermAttributes {
        &self.taxonomy.graph[self.idx].attributes
    }

    /// Ancestors including the node itself (hypernyms, superterms, subsumers)
    pub fn ancestors(&self) -> &'a BTreeSet<N> {
        self.taxonomy.ancestors_at(self.idx)
    }

    /// Descendants including the node itself (hyponyms, subterms)
    pub fn descendants(&self) -> &'a BTreeSet<N> {
        self.taxonomy.descendants_at(self.idx)
    }

    pub fn n_ancestors(&self) -> usize {
        self.ancestors().len()
    }

    pub fn n_descendants(&self) -> usize {
        self.descendants().len()
    }

    /// Leaves reachable from this node, itself included when it is a leaf
    pub fn n_leaves(&self) -> usize {
        self.taxonomy.n_leaf_descendants(self.idx)
    }

    /// Minimum shortest path distance from a root to this node
    pub fn depth(&self) -> usize {
        self.taxonomy.depth_at(self.idx)
    }

    pub fn information_content(&self, metric: IcMetric) -> f64 {
        self.taxonomy.ic_at(self.idx, metric)
    }

    pub fn scaled_information_content(&self, metric: IcMetric) -> f64 {
        self.taxonomy.scaled_ic_at(self.idx, metric)
    }
}

impl<N: TermId> fmt::Debug for NodeInfo<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeInfo").field("node", self.node()).finish()
    }
}
