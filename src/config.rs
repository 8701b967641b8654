/// Training configuration
///
/// Knobs for the model builders and the evaluation harness. The look-back
/// window length is a type-level constant (`model::window::LOOK_BACK_LEN`),
/// not a config field: the path type is a fixed-length array keyed on it.
use serde::{Deserialize, Serialize};

/// Configuration for model training and evaluation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Hard cap on the tree builder's frontier size. When a cluster's
    /// frontier would exceed this, expansion of that cluster stops.
    pub max_frontier_nodes: usize,

    /// Enumerate aggregation operands (sum/avg/len/max/min over numeric
    /// result columns). Off by default; the catalogue exists but the
    /// search space rarely justifies it.
    pub enumerate_aggregates: bool,

    /// Clusters whose transactions are shorter than this are skipped by
    /// the evaluation harness.
    pub min_transaction_len: usize,

    /// Leading fraction of each cluster used for training during
    /// evaluation; the remainder is replayed against the predictor.
    pub training_fraction: f64,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            max_frontier_nodes: 10_000,
            enumerate_aggregates: false,
            min_transaction_len: 10,
            training_fraction: 0.3,
        }
    }
}
