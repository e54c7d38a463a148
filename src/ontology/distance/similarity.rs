// Pairwise semantic similarity
// Ancestor-set algebra plus IC of the most informative common ancestor

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::ontology::{IcMetric, OntologyError, OntologyResult, Taxonomy, TermId};

/// Similarity of two taxonomy terms under one IC metric.
///
/// Field names are stable: downstream reporting serializes this record
/// as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult<N> {
    pub node_0: N,
    pub node_1: N,
    /// `node_0` is an ancestor (or the same node) of `node_1`
    pub node_0_subsumes_1: bool,
    pub node_1_subsumes_0: bool,
    pub n_common_ancestors: usize,
    pub n_union_ancestors: usize,
    pub batet: f64,
    pub batet_log: f64,
    pub ic_metric: IcMetric,
    /// Most informative common ancestor; `None` for disjoint components
    pub mica: Option<N>,
    pub resnik: f64,
    pub resnik_scaled: f64,
    pub lin: f64,
    pub jiang: f64,
    pub jiang_seco: f64,
}

impl<N> SimilarityResult<N> {
    /// Serialized field names, in declaration order
    pub const FIELDS: [&'static str; 15] = [
        "node_0",
        "node_1",
        "node_0_subsumes_1",
        "node_1_subsumes_0",
        "n_common_ancestors",
        "n_union_ancestors",
        "batet",
        "batet_log",
        "ic_metric",
        "mica",
        "resnik",
        "resnik_scaled",
        "lin",
        "jiang",
        "jiang_seco",
    ];

    /// Value of one field addressed by its serialized name
    pub fn get(&self, key: &str) -> Option<ResultValue<'_, N>> {
        let value = match key {
            "node_0" => ResultValue::Node(&self.node_0),
            "node_1" => ResultValue::Node(&self.node_1),
            "node_0_subsumes_1" => ResultValue::Flag(self.node_0_subsumes_1),
            "node_1_subsumes_0" => ResultValue::Flag(self.node_1_subsumes_0),
            "n_common_ancestors" => ResultValue::Count(self.n_common_ancestors),
            "n_union_ancestors" => ResultValue::Count(self.n_union_ancestors),
            "batet" => ResultValue::Score(self.batet),
            "batet_log" => ResultValue::Score(self.batet_log),
            "ic_metric" => ResultValue::Metric(self.ic_metric),
            "mica" => ResultValue::Mica(self.mica.as_ref()),
            "resnik" => ResultValue::Score(self.resnik),
            "resnik_scaled" => ResultValue::Score(self.resnik_scaled),
            "lin" => ResultValue::Score(self.lin),
            "jiang" => ResultValue::Score(self.jiang),
            "jiang_seco" => ResultValue::Score(self.jiang_seco),
            _ => return None,
        };
        Some(value)
    }

    /// Selected fields, in the order requested.
    ///
    /// Fails with [`OntologyError::UnknownField`] on the first name that is
    /// not in [`Self::FIELDS`].
    pub fn results<'k>(
        &self,
        keys: &[&'k str],
    ) -> OntologyResult<Vec<(&'k str, ResultValue<'_, N>)>> {
        keys.iter()
            .map(|&key| {
                self.get(key).map(|value| (key, value)).ok_or_else(|| {
                    OntologyError::UnknownField {
                        name: key.to_string(),
                        choices: Self::FIELDS.join(", "),
                    }
                })
            })
            .collect()
    }

    /// Every field, in [`Self::FIELDS`] order
    pub fn all_results(&self) -> Vec<(&'static str, ResultValue<'_, N>)> {
        Self::FIELDS
            .iter()
            .filter_map(|&key| self.get(key).map(|value| (key, value)))
            .collect()
    }

    /// The pair's scores without the identifiers
    pub fn scores(&self) -> SimilarityScores {
        SimilarityScores {
            batet: self.batet,
            batet_log: self.batet_log,
            resnik: self.resnik,
            resnik_scaled: self.resnik_scaled,
            lin: self.lin,
            jiang: self.jiang,
            jiang_seco: self.jiang_seco,
        }
    }
}

/// A borrowed field value of a [`SimilarityResult`]
#[derive(Debug, PartialEq)]
pub enum ResultValue<'a, N> {
    Node(&'a N),
    Flag(bool),
    Count(usize),
    Score(f64),
    Metric(IcMetric),
    Mica(Option<&'a N>),
}

/// Scalars every score is derived from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    pub ic_0: f64,
    pub ic_1: f64,
    pub scaled_ic_0: f64,
    pub scaled_ic_1: f64,
    /// IC of the MICA, 0 when there is none
    pub resnik: f64,
    pub resnik_scaled: f64,
    pub n_common: usize,
    pub n_union: usize,
    /// Both sides name the same node
    pub identical: bool,
}

/// The basket of named scores for one pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityScores {
    pub batet: f64,
    pub batet_log: f64,
    pub resnik: f64,
    pub resnik_scaled: f64,
    pub lin: f64,
    pub jiang: f64,
    pub jiang_seco: f64,
}

impl SimilarityScores {
    /// Derive every score. Pure and total: degenerate inputs map to
    /// defined values rather than NaN.
    pub fn compute(inputs: &ScoreInputs) -> Self {
        let batet = if inputs.n_union > 0 {
            inputs.n_common as f64 / inputs.n_union as f64
        } else {
            0.0
        };
        let batet_log = if batet >= 1.0 {
            1.0
        } else if inputs.n_union > 1 {
            // exactly 1 when one side subsumes the other, but rounds above it
            ((1.0 - batet).ln() / (inputs.n_union as f64).ln())
                .abs()
                .clamp(0.0, 1.0)
        } else {
            0.0
        };

        let ic_sum = inputs.ic_0 + inputs.ic_1;
        let lin = if ic_sum > 0.0 {
            (2.0 * inputs.resnik / ic_sum).clamp(0.0, 1.0)
        } else if inputs.identical {
            1.0
        } else {
            0.0
        };

        // Jiang-Conrath distance; IC(mica) <= min(IC(a), IC(b)) up to rounding
        let distance = (ic_sum - 2.0 * inputs.resnik).max(0.0);
        let jiang = 1.0 / (1.0 + distance);

        let scaled_distance =
            (inputs.scaled_ic_0 + inputs.scaled_ic_1 - 2.0 * inputs.resnik_scaled).max(0.0);
        let jiang_seco = (1.0 - scaled_distance / 2.0).clamp(0.0, 1.0);

        Self {
            batet,
            batet_log,
            resnik: inputs.resnik,
            resnik_scaled: inputs.resnik_scaled,
            lin,
            jiang,
            jiang_seco,
        }
    }
}

impl<N: TermId> Taxonomy<N> {
    /// Similarity of `node_0` and `node_1` under an IC metric given by name
    pub fn similarity(
        &self,
        node_0: &N,
        node_1: &N,
        ic_metric: &str,
    ) -> OntologyResult<SimilarityResult<N>> {
        let metric: IcMetric = ic_metric.parse()?;
        self.similarity_with(node_0, node_1, metric)
    }

    /// Similarity under the configured default metric
    pub fn similarity_default(
        &self,
        node_0: &N,
        node_1: &N,
    ) -> OntologyResult<SimilarityResult<N>> {
        self.similarity_with(node_0, node_1, self.config.default_ic_metric)
    }

    /// Similarity under a typed IC metric
    pub fn similarity_with(
        &self,
        node_0: &N,
        node_1: &N,
        metric: IcMetric,
    ) -> OntologyResult<SimilarityResult<N>> {
        let idx_0 = self.node_index(node_0)?;
        let idx_1 = self.node_index(node_1)?;
        let ancestors_0 = self.ancestors_at(idx_0);
        let ancestors_1 = self.ancestors_at(idx_1);

        let n_common = ancestors_0.intersection(ancestors_1).count();
        let n_union = ancestors_0.len() + ancestors_1.len() - n_common;

        // Ascending iteration plus max_by keeping the last maximum makes the
        // greatest identifier win IC ties
        let mica = ancestors_0
            .intersection(ancestors_1)
            .filter_map(|id| self.index.get(id).copied())
            .map(|idx| (self.ic_at(idx, metric), idx))
            .max_by(|(x, _), (y, _)| x.total_cmp(y))
            .map(|(_, idx)| idx);

        let scores = SimilarityScores::compute(&ScoreInputs {
            ic_0: self.ic_at(idx_0, metric),
            ic_1: self.ic_at(idx_1, metric),
            scaled_ic_0: self.scaled_ic_at(idx_0, metric),
            scaled_ic_1: self.scaled_ic_at(idx_1, metric),
            resnik: mica.map_or(0.0, |idx| self.ic_at(idx, metric)),
            resnik_scaled: mica.map_or(0.0, |idx| self.scaled_ic_at(idx, metric)),
            n_common,
            n_union,
            identical: idx_0 == idx_1,
        });

        trace!(
            %node_0,
            %node_1,
            %metric,
            mica = ?mica.map(|idx| self.term(idx)),
            n_common,
            n_union,
            "similarity computed"
        );

        Ok(self.package(idx_0, idx_1, metric, mica, n_common, n_union, scores))
    }

    /// Similarities for every `source × target × metric` combination, in
    /// that nesting order. Each entry fails independently.
    pub fn compute_similarities(
        &self,
        sources: &[N],
        targets: &[N],
        metrics: &[IcMetric],
    ) -> Vec<OntologyResult<SimilarityResult<N>>> {
        let mut results = Vec::with_capacity(sources.len() * targets.len() * metrics.len());
        for source in sources {
            for target in targets {
                for &metric in metrics {
                    results.push(self.similarity_with(source, target, metric));
                }
            }
        }
        results
    }

    #[allow(clippy::too_many_arguments)]
    fn package(
        &self,
        idx_0: NodeIndex,
        idx_1: NodeIndex,
        ic_metric: IcMetric,
        mica: Option<NodeIndex>,
        n_common_ancestors: usize,
        n_union_ancestors: usize,
        scores: SimilarityScores,
    ) -> SimilarityResult<N> {
        let node_0 = self.term(idx_0).clone();
        let node_1 = self.term(idx_1).clone();
        SimilarityResult {
            node_0_subsumes_1: self.ancestors_at(idx_1).contains(&node_0),
            node_1_subsumes_0: self.ancestors_at(idx_0).contains(&node_1),
            node_0,
            node_1,
            n_common_ancestors,
            n_union_ancestors,
            batet: scores.batet,
            batet_log: scores.batet_log,
            ic_metric,
            mica: mica.map(|idx| self.term(idx).clone()),
            resnik: scores.resnik,
            resnik_scaled: scores.resnik_scaled,
            lin: scores.lin,
            jiang: scores.jiang,
            jiang_seco: scores.jiang_seco,
        }
    }
}
