//! Small reference taxonomies
//!
//! Used by the test suites, the benchmarks and the crate documentation.
//! Every fixture is returned open so callers can extend it before freezing.

use super::{OntologyResult, Taxonomy, TaxonomyConfig};

/// Subsumption edges of the eight-node metal ontology
pub const METAL_EDGES: [(&str, &str); 9] = [
    ("metal", "precious"),
    ("metal", "coinage"),
    ("precious", "platinum"),
    ("precious", "palladium"),
    ("precious", "gold"),
    ("precious", "silver"),
    ("coinage", "gold"),
    ("coinage", "silver"),
    ("coinage", "copper"),
];

/// Five-node diamond: gold has two parents, silver one
pub const METAL_DIAMOND_EDGES: [(&str, &str); 5] = [
    ("metal", "precious_metal"),
    ("metal", "coinage_metal"),
    ("precious_metal", "gold"),
    ("coinage_metal", "gold"),
    ("coinage_metal", "silver"),
];

/// A second root component, disjoint from the metal ontology
pub const TREE_EDGES: [(&str, &str); 2] = [("tree", "oak"), ("tree", "birch")];

fn owned<'a>(edges: impl IntoIterator<Item = &'a (&'a str, &'a str)>) -> Vec<(String, String)> {
    edges
        .into_iter()
        .map(|(superterm, subterm)| (superterm.to_string(), subterm.to_string()))
        .collect()
}

/// Eight-node metal ontology
///
/// ```text
///              metal
///            /       \
///      precious     coinage
///     /  |   |  \  /  |    \
/// platinum palladium gold silver copper
/// ```
pub fn metal_taxonomy() -> OntologyResult<Taxonomy> {
    metal_taxonomy_with_config(TaxonomyConfig::default().with_name("Metals"))
}

pub fn metal_taxonomy_with_config(config: TaxonomyConfig) -> OntologyResult<Taxonomy> {
    Taxonomy::from_edges(owned(&METAL_EDGES), config)
}

/// Five-node diamond ontology with root `metal`
pub fn metal_diamond_taxonomy() -> OntologyResult<Taxonomy> {
    Taxonomy::from_edges(
        owned(&METAL_DIAMOND_EDGES),
        TaxonomyConfig::default().with_name("Metals (diamond)"),
    )
}

/// Metal ontology plus a disjoint `tree` component
pub fn disconnected_taxonomy() -> OntologyResult<Taxonomy> {
    Taxonomy::from_edges(
        owned(METAL_EDGES.iter().chain(&TREE_EDGES)),
        TaxonomyConfig::default().with_name("Metals and trees"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_shapes() {
        let metal = metal_taxonomy().unwrap();
        assert_eq!((metal.n_nodes(), metal.n_edges()), (8, 9));
        assert_eq!(metal.name(), Some("Metals"));
        assert!(!metal.is_frozen());

        let diamond = metal_diamond_taxonomy().unwrap();
        assert_eq!((diamond.n_nodes(), diamond.n_edges()), (5, 5));

        let disconnected = disconnected_taxonomy().unwrap();
        assert_eq!((disconnected.n_nodes(), disconnected.n_edges()), (11, 11));
        assert_eq!(disconnected.roots().len(), 2);
    }
}
