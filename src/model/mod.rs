/// Prediction storage: the record itself, the window path, tree and graph
pub mod graph;
pub mod prediction;
pub mod tree;
pub mod window;

pub use graph::{Edge, EdgeList, GraphModel};
pub use prediction::Prediction;
pub use tree::{NodeId, NodeRecord, PredictionTree, TreeModel};
pub use window::{QueryPath, WindowQueue, LOOK_BACK_LEN};
