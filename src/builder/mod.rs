/// Model training: operand enumeration, prediction search, both trainers
pub mod graph_builder;
pub mod operands;
pub mod search;
pub mod tree_builder;

pub use graph_builder::GraphModelBuilder;
pub use operands::OperandLists;
pub use search::{enumerate_predictions, operations_for_argument, search_unary_ops};
pub use tree_builder::{collapse_operand, TreeModelBuilder};
