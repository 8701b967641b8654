/// Inference: walking a trained model alongside the observed stream
pub mod graph;
pub mod tree;

pub use graph::GraphPredictor;
pub use tree::TreePredictor;
