// Information Content (IC) for ontology terms
// Intrinsic, structure-based IC metrics with per-node memoization

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ontology::{OntologyError, OntologyResult, Taxonomy, TermId};

/// Supported information content metrics.
///
/// "Intrinsic" metrics are computed from the ontology structure alone,
/// without an external corpus to ascertain term frequency. `weighted_ic`
/// uses per-node weights injected at construction time as the frequency
/// basis instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IcMetric {
    /// Resnik (1999), Equation 5: `ln N - ln |descendants(n)|`
    #[serde(rename = "intrinsic_ic")]
    Intrinsic,
    /// Sánchez, Batet & Isern (2011), Definition 4 / Equation 10
    #[serde(rename = "intrinsic_ic_sanchez")]
    Sanchez,
    /// Zhou, Wang & Gu (2008): descendant density blended with depth
    #[serde(rename = "intrinsic_ic_zhou")]
    Zhou,
    /// Descendant weight mass relative to the whole ontology
    #[serde(rename = "weighted_ic")]
    Weighted,
}

/// Structural statistics a metric formula may read
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IcInputs {
    /// Total node count of the taxonomy
    pub n_nodes: usize,
    /// Total leaf count of the taxonomy
    pub n_leaves: usize,
    /// |descendants(n)|, self included
    pub n_descendants: usize,
    /// |ancestors(n)|, self included
    pub n_ancestors: usize,
    /// Leaves among descendants(n)
    pub n_leaf_descendants: usize,
    /// Longest path from a root to n
    pub level: usize,
    /// Largest level in the taxonomy
    pub max_level: usize,
    /// Sum of weights over descendants(n)
    pub descendant_weight: f64,
    /// Sum of all weights
    pub total_weight: f64,
    /// Zhou blending factor in [0, 1]
    pub zhou_k: f64,
}

/// One row of the metric lookup table
struct MetricEntry {
    metric: IcMetric,
    name: &'static str,
    formula: fn(&IcInputs) -> f64,
}

/// Lookup table, in `IcMetric` declaration order
static REGISTRY: [MetricEntry; IcMetric::COUNT] = [
    MetricEntry {
        metric: IcMetric::Intrinsic,
        name: "intrinsic_ic",
        formula: intrinsic_ic,
    },
    MetricEntry {
        metric: IcMetric::Sanchez,
        name: "intrinsic_ic_sanchez",
        formula: intrinsic_ic_sanchez,
    },
    MetricEntry {
        metric: IcMetric::Zhou,
        name: "intrinsic_ic_zhou",
        formula: intrinsic_ic_zhou,
    },
    MetricEntry {
        metric: IcMetric::Weighted,
        name: "weighted_ic",
        formula: weighted_ic,
    },
];

fn intrinsic_ic(inputs: &IcInputs) -> f64 {
    // equivalent to -ln(|descendants| / N)
    let n = inputs.n_nodes as f64;
    let d = inputs.n_descendants as f64;
    (n.ln() - d.ln()).max(0.0)
}

fn intrinsic_ic_sanchez(inputs: &IcInputs) -> f64 {
    let leaves = inputs.n_leaf_descendants as f64;
    let ancestors = inputs.n_ancestors as f64;
    let all_leaves = inputs.n_leaves as f64;
    // abs instead of negation so a root yields 0.0 rather than -0.0
    ((leaves / ancestors + 1.0) / (all_leaves + 1.0)).ln().abs()
}

fn intrinsic_ic_zhou(inputs: &IcInputs) -> f64 {
    let log_n = (inputs.n_nodes as f64).ln();
    let density = if log_n > 0.0 {
        1.0 - (inputs.n_descendants as f64).ln() / log_n
    } else {
        0.0
    };
    let log_max_level = (inputs.max_level as f64 + 1.0).ln();
    let depth = if log_max_level > 0.0 {
        (inputs.level as f64 + 1.0).ln() / log_max_level
    } else {
        0.0
    };
    let k = inputs.zhou_k;
    (k * density + (1.0 - k) * depth).max(0.0)
}

fn weighted_ic(inputs: &IcInputs) -> f64 {
    if inputs.n_descendants >= inputs.n_nodes {
        // summation order differs between the two masses
        return 0.0;
    }
    (inputs.total_weight.ln() - inputs.descendant_weight.ln()).max(0.0)
}

impl IcMetric {
    pub const COUNT: usize = 4;

    pub const ALL: [IcMetric; Self::COUNT] = [
        IcMetric::Intrinsic,
        IcMetric::Sanchez,
        IcMetric::Zhou,
        IcMetric::Weighted,
    ];

    fn entry(self) -> &'static MetricEntry {
        &REGISTRY[self as usize]
    }

    /// Public metric name, part of the compatibility contract
    pub fn name(self) -> &'static str {
        self.entry().name
    }

    /// Names of every supported metric
    pub fn names() -> [&'static str; Self::COUNT] {
        Self::ALL.map(IcMetric::name)
    }

    /// Evaluate the metric's formula on precomputed statistics
    pub fn compute(self, inputs: &IcInputs) -> f64 {
        (self.entry().formula)(inputs)
    }
}

impl fmt::Display for IcMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IcMetric {
    type Err = OntologyError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        REGISTRY
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.metric)
            .ok_or_else(|| {
                debug!(metric = name, "unknown ic metric requested");
                OntologyError::UnknownMetric {
                    name: name.to_string(),
                    choices: Self::names().join(", "),
                }
            })
    }
}

/// Per-metric memo slots, indexed by metric then `NodeIndex`
#[derive(Debug)]
pub struct IcCache {
    values: [Vec<OnceLock<f64>>; IcMetric::COUNT],
    maxima: [OnceLock<f64>; IcMetric::COUNT],
    total_weight: OnceLock<f64>,
}

impl IcCache {
    pub(crate) fn new() -> Self {
        Self {
            values: std::array::from_fn(|_| Vec::new()),
            maxima: std::array::from_fn(|_| OnceLock::new()),
            total_weight: OnceLock::new(),
        }
    }

    pub(crate) fn reset(&mut self, n: usize) {
        for slots in &mut self.values {
            slots.clear();
            slots.resize_with(n, OnceLock::new);
        }
        for max in &mut self.maxima {
            max.take();
        }
        self.total_weight.take();
    }

    /// Number of populated IC entries for a metric
    pub fn populated(&self, metric: IcMetric) -> usize {
        self.values[metric as usize]
            .iter()
            .filter(|slot| slot.get().is_some())
            .count()
    }
}

impl<N: TermId> Taxonomy<N> {
    /// Information content of a node under a metric given by name
    pub fn information_content(&self, id: &N, metric: &str) -> OntologyResult<f64> {
        let metric: IcMetric = metric.parse()?;
        self.ic(id, metric)
    }

    /// Information content of a node under a typed metric
    pub fn ic(&self, id: &N, metric: IcMetric) -> OntologyResult<f64> {
        let idx = self.node_index(id)?;
        Ok(self.ic_at(idx, metric))
    }

    /// IC divided by the largest IC attained by any node, in [0, 1]
    pub fn scaled_information_content(&self, id: &N, metric: &str) -> OntologyResult<f64> {
        let metric: IcMetric = metric.parse()?;
        let idx = self.node_index(id)?;
        Ok(self.scaled_ic_at(idx, metric))
    }

    /// Largest IC attained by any node under `metric` (0 when empty)
    pub fn max_information_content(&self, metric: IcMetric) -> f64 {
        self.max_ic(metric)
    }

    /// Every supported metric name
    pub fn ic_metric_names(&self) -> [&'static str; IcMetric::COUNT] {
        IcMetric::names()
    }

    /// Read access to the IC memo slots
    pub fn ic_cache(&self) -> &IcCache {
        &self.ic
    }

    pub(crate) fn ic_at(&self, idx: NodeIndex, metric: IcMetric) -> f64 {
        *self
            .stats
            .memoize(&self.ic.values[metric as usize][idx.index()], || {
                metric.compute(&self.ic_inputs(idx, metric))
            })
    }

    pub(crate) fn scaled_ic_at(&self, idx: NodeIndex, metric: IcMetric) -> f64 {
        scale(self.ic_at(idx, metric), self.max_ic(metric))
    }

    pub(crate) fn max_ic(&self, metric: IcMetric) -> f64 {
        *self.stats.memoize(&self.ic.maxima[metric as usize], || {
            self.graph
                .node_indices()
                .map(|idx| self.ic_at(idx, metric))
                .fold(0.0, f64::max)
        })
    }

    /// Gather the structural statistics for one node.
    ///
    /// Weight sums are only needed by `weighted_ic` and are skipped otherwise.
    pub(crate) fn ic_inputs(&self, idx: NodeIndex, metric: IcMetric) -> IcInputs {
        let (descendant_weight, total_weight) = if metric == IcMetric::Weighted {
            let descendant_weight = self
                .descendants_at(idx)
                .iter()
                .filter_map(|id| self.index.get(id))
                .map(|&d| self.graph[d].weight)
                .sum();
            let total_weight = *self.stats.memoize(&self.ic.total_weight, || {
                self.graph.node_weights().map(|record| record.weight).sum()
            });
            (descendant_weight, total_weight)
        } else {
            (0.0, 0.0)
        };

        IcInputs {
            n_nodes: self.graph.node_count(),
            n_leaves: self.leaves_set().len(),
            n_descendants: self.descendants_at(idx).len(),
            n_ancestors: self.ancestors_at(idx).len(),
            n_leaf_descendants: self.n_leaf_descendants(idx),
            level: self.level_at(idx),
            max_level: self.max_level(),
            descendant_weight,
            total_weight,
            zhou_k: self.config.zhou_factor(),
        }
    }
}

/// Divide by the ontology-wide maximum, guarding a zero maximum
pub(crate) fn scale(value: f64, max: f64) -> f64 {
    if max > 0.0 { (value / max).clamp(0.0, 1.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::TaxonomyConfig;
    use crate::ontology::fixtures::metal_taxonomy;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_registry_order_matches_enum() {
        for metric in IcMetric::ALL {
            assert_eq!(REGISTRY[metric as usize].metric, metric);
        }
        assert_eq!(
            IcMetric::names(),
            [
                "intrinsic_ic",
                "intrinsic_ic_sanchez",
                "intrinsic_ic_zhou",
                "weighted_ic"
            ]
        );
    }

    #[test]
    fn test_parse_metric() {
        assert_eq!("intrinsic_ic".parse::<IcMetric>().unwrap(), IcMetric::Intrinsic);
        let err = "ic_unsupported".parse::<IcMetric>().unwrap_err();
        assert!(err.to_string().contains("not a supported ic_metric"));
        assert!(err.to_string().contains("intrinsic_ic_sanchez"));
    }

    #[test]
    fn test_intrinsic_ic_unscaled() {
        let mut taxonomy = metal_taxonomy().unwrap();
        taxonomy.freeze();
        assert_eq!(taxonomy.n_nodes(), 8);

        // number of descendants per node including self
        let n_descendants = [
            ("metal", 8.0),
            ("precious", 5.0),
            ("coinage", 4.0),
            ("platinum", 1.0),
            ("palladium", 1.0),
            ("gold", 1.0),
            ("silver", 1.0),
            ("copper", 1.0),
        ];
        for (node, numerator) in n_descendants {
            let value = taxonomy.information_content(&node.into(), "intrinsic_ic").unwrap();
            let expected = -(numerator / 8.0f64).ln();
            assert!(approx(value, expected), "{node}: {value} != {expected}");
        }
    }

    #[test]
    fn test_intrinsic_ic_scaled() {
        let taxonomy = metal_taxonomy().unwrap();
        let max = taxonomy.max_information_content(IcMetric::Intrinsic);
        assert!(approx(max, 8.0f64.ln()));

        let scaled = taxonomy
            .scaled_information_content(&"coinage".into(), "intrinsic_ic")
            .unwrap();
        assert!(approx(scaled, 1.0 - 4.0f64.ln() / 8.0f64.ln()));
    }

    #[test]
    fn test_sanchez_values() {
        let taxonomy = metal_taxonomy().unwrap();
        let ic = |node: &str| {
            taxonomy
                .information_content(&node.into(), "intrinsic_ic_sanchez")
                .unwrap()
        };
        // 5 leaves overall
        assert_eq!(ic("metal"), 0.0);
        assert!(approx(ic("coinage"), (2.5f64 / 6.0).ln().abs()));
        assert!(approx(ic("precious"), (3.0f64 / 6.0).ln().abs()));
        assert!(approx(ic("copper"), ((1.0f64 / 3.0 + 1.0) / 6.0).ln().abs()));
        assert!(approx(ic("gold"), ((1.0f64 / 4.0 + 1.0) / 6.0).ln().abs()));
    }

    #[test]
    fn test_sanchez_scaled_by_observed_maximum() {
        let taxonomy = metal_taxonomy().unwrap();
        let scaled = |node: &str| {
            taxonomy
                .scaled_information_content(&node.into(), "intrinsic_ic_sanchez")
                .unwrap()
        };
        // gold and silver have the most subsumers among the leaves, so they
        // reach the ceiling rather than ln(4.8) / ln(6)
        assert_eq!(scaled("gold"), 1.0);
        assert_eq!(scaled("silver"), 1.0);
        assert!(approx(scaled("platinum"), 4.5f64.ln() / 4.8f64.ln()));
        assert!(approx(
            taxonomy.max_information_content(IcMetric::Sanchez),
            4.8f64.ln()
        ));
    }

    #[test]
    fn test_zhou_values() {
        let taxonomy = metal_taxonomy().unwrap();
        let ic = |node: &str| taxonomy.ic(&node.to_string(), IcMetric::Zhou).unwrap();

        assert_eq!(ic("metal"), 0.0);
        // leaves at the deepest level hit both terms at their maximum
        assert!(approx(ic("gold"), 1.0));
        let expected = 0.5 * (1.0 - 5.0f64.ln() / 8.0f64.ln()) + 0.5 * 2.0f64.ln() / 3.0f64.ln();
        assert!(approx(ic("precious"), expected));
    }

    #[test]
    fn test_zhou_k_changes_blend() {
        let mut taxonomy = crate::ontology::fixtures::metal_taxonomy_with_config(
            TaxonomyConfig::default().with_zhou_k(1.0),
        )
        .unwrap();
        taxonomy.freeze();
        let zhou = taxonomy.ic(&"coinage".into(), IcMetric::Zhou).unwrap();
        let seco = taxonomy
            .scaled_information_content(&"coinage".into(), "intrinsic_ic")
            .unwrap();
        assert!(approx(zhou, seco));
    }

    #[test]
    fn test_weighted_matches_intrinsic_with_unit_weights() {
        let taxonomy = metal_taxonomy().unwrap();
        for node in taxonomy.nodes() {
            let weighted = taxonomy.ic(&node, IcMetric::Weighted).unwrap();
            let intrinsic = taxonomy.ic(&node, IcMetric::Intrinsic).unwrap();
            assert!(approx(weighted, intrinsic), "{node}");
        }
    }

    #[test]
    fn test_weighted_uses_node_weights() {
        let mut taxonomy: Taxonomy = Taxonomy::new();
        taxonomy.add_weighted_node("root".into(), 1.0).unwrap();
        taxonomy.add_weighted_node("common".into(), 7.0).unwrap();
        taxonomy.add_weighted_node("rare".into(), 2.0).unwrap();
        taxonomy.add_edge(&"root".into(), &"common".into()).unwrap();
        taxonomy.add_edge(&"root".into(), &"rare".into()).unwrap();
        taxonomy.freeze();

        assert_eq!(taxonomy.ic(&"root".into(), IcMetric::Weighted).unwrap(), 0.0);
        let rare = taxonomy.ic(&"rare".into(), IcMetric::Weighted).unwrap();
        let common = taxonomy.ic(&"common".into(), IcMetric::Weighted).unwrap();
        assert!(approx(rare, (10.0f64 / 2.0).ln()));
        assert!(rare > common);
    }

    #[test]
    fn test_single_node_taxonomy() {
        let mut taxonomy: Taxonomy = Taxonomy::new();
        taxonomy.add_node("only".into()).unwrap();
        taxonomy.freeze();
        for metric in IcMetric::ALL {
            assert_eq!(taxonomy.ic(&"only".into(), metric).unwrap(), 0.0);
            assert_eq!(taxonomy.max_information_content(metric), 0.0);
            let info = taxonomy.node_info(&"only".into()).unwrap();
            assert_eq!(info.scaled_information_content(metric), 0.0);
        }
    }

    #[test]
    fn test_monotone_along_ancestors() {
        let taxonomy = metal_taxonomy().unwrap();
        for metric in IcMetric::ALL {
            for node in taxonomy.nodes() {
                let ic = taxonomy.ic(&node, metric).unwrap();
                for ancestor in taxonomy.ancestors(&node).unwrap() {
                    let ancestor_ic = taxonomy.ic(ancestor, metric).unwrap();
                    assert!(ancestor_ic <= ic + 1e-12, "{metric}: {ancestor} above {node}");
                }
            }
        }
    }

    #[test]
    fn test_memoized_per_metric() {
        let mut taxonomy = metal_taxonomy().unwrap();
        taxonomy.freeze();
        taxonomy.ic(&"gold".into(), IcMetric::Sanchez).unwrap();
        assert_eq!(taxonomy.ic_cache().populated(IcMetric::Sanchez), 1);
        assert_eq!(taxonomy.ic_cache().populated(IcMetric::Intrinsic), 0);
    }

    #[test]
    fn test_unknown_metric_and_node() {
        let taxonomy = metal_taxonomy().unwrap();
        assert!(matches!(
            taxonomy.information_content(&"gold".into(), "resnik"),
            Err(OntologyError::UnknownMetric { .. })
        ));
        assert!(matches!(
            taxonomy.information_content(&"zinc".into(), "intrinsic_ic"),
            Err(OntologyError::UnknownNode(_))
        ));
    }

    #[test]
    fn test_scale_guards_zero() {
        assert_eq!(scale(0.0, 0.0), 0.0);
        assert_eq!(scale(1.0, 2.0), 0.5);
    }
}
