//! Taxonomy configuration
//!
//! ```rust
//! use ontology_similarity::ontology::{IcMetric, TaxonomyConfig};
//!
//! let config = TaxonomyConfig::default()
//!     .with_name("Metals")
//!     .with_default_ic_metric(IcMetric::Intrinsic)
//!     .warm_on_freeze(true);
//! assert_eq!(config.name.as_deref(), Some("Metals"));
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::IcMetric;

/// Configuration for a [`super::Taxonomy`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomyConfig {
    /// Short human-readable name of the ontology (e.g. "Metals", "MeSH")
    pub name: Option<String>,

    /// Populate every closure and IC slot when the taxonomy is frozen
    pub warm_on_freeze: bool,

    /// Metric used by `similarity_default`
    pub default_ic_metric: IcMetric,

    /// Weight of the descendant-density term in `intrinsic_ic_zhou`;
    /// the depth term gets `1 - zhou_k`
    pub zhou_k: f64,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            name: None,
            warm_on_freeze: false,
            default_ic_metric: IcMetric::Sanchez,
            zhou_k: 0.5,
        }
    }
}

impl TaxonomyConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Enable or disable eager cache population at freeze time
    pub fn warm_on_freeze(mut self, enabled: bool) -> Self {
        self.warm_on_freeze = enabled;
        self
    }

    pub fn with_default_ic_metric(mut self, metric: IcMetric) -> Self {
        self.default_ic_metric = metric;
        self
    }

    /// Set the Zhou weighting factor, clamped to [0, 1]
    pub fn with_zhou_k(mut self, k: f64) -> Self {
        if !(0.0..=1.0).contains(&k) {
            warn!(zhou_k = k, "zhou_k outside [0, 1], clamping");
        }
        self.zhou_k = if k.is_nan() { 0.5 } else { k.clamp(0.0, 1.0) };
        self
    }

    /// Zhou factor as used by the metric (clamped even if set directly)
    pub(crate) fn zhou_factor(&self) -> f64 {
        if self.zhou_k.is_nan() {
            0.5
        } else {
            self.zhou_k.clamp(0.0, 1.0)
        }
    }
}
