//! Ontology Similarity
//!
//! Information content and semantic similarity over directed acyclic
//! taxonomies, computed from the structure of the taxonomy alone.
//!
//! # Architecture
//!
//! ```text
//! Taxonomy (build → freeze) → Closure Cache → IC Metrics → Similarity
//! ```
//!
//! Every stage is a read-only query against the taxonomy; derived values
//! are memoized inside it and shared safely once it is frozen.

pub mod ontology;

pub use ontology::{
    IcMetric, Lifecycle, NodeInfo, OntologyError, OntologyResult, ResultValue, SimilarityResult,
    Taxonomy, TaxonomyConfig, TermAttributes, TermId,
};
